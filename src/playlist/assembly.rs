use crate::models::LengthSpec;
use crate::playlist::index::{MatchingIndex, TrackFacts};
use crate::playlist::request::NormalizedRequest;
use crate::playlist::scoring::{MatchScoring, Reason, ScoredCandidate};
use crate::playlist::strategy::{
    GenreMixGuidance, PlaylistStrategy, active_section, normalize_positions,
};
use rand::Rng;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Duration assumed for tracks with no duration metadata when filling a
/// minutes-based target, so sparse metadata cannot stall the loop.
const DEFAULT_TRACK_SECONDS: u32 = 240;

/// Mutable accumulator for one assembly run: counts and last-seen positions
/// for the hard diversity rules, plus the primary/secondary tallies the
/// genre-mix scorer reads. Created at the start of assembly, mutated once
/// per accepted track, discarded afterwards.
#[derive(Debug, Default)]
pub struct SelectionState {
    pub primary_matches: usize,
    pub secondary_matches: usize,
    pub total_duration_seconds: u32,
    artist_counts: HashMap<String, usize>,
    album_counts: HashMap<String, usize>,
    last_artist_position: HashMap<String, usize>,
    last_genre_position: HashMap<String, usize>,
    picked_ids: HashSet<String>,
    picked_order: Vec<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        SelectionState::default()
    }

    pub fn is_picked(&self, track_id: &str) -> bool {
        self.picked_ids.contains(track_id)
    }

    pub fn picked_count(&self) -> usize {
        self.picked_order.len()
    }

    pub fn artist_count(&self, artist: &str) -> usize {
        self.artist_counts.get(artist).copied().unwrap_or(0)
    }

    pub fn album_count(&self, album: &str) -> usize {
        self.album_counts.get(album).copied().unwrap_or(0)
    }

    pub fn distinct_artists(&self) -> usize {
        self.artist_counts.len()
    }

    /// Ids of the most recent picks, oldest first, at most `n`.
    pub fn recent_picks(&self, n: usize) -> &[String] {
        let start = self.picked_order.len().saturating_sub(n);
        &self.picked_order[start..]
    }

    pub fn note_album(&mut self, album: &str) {
        *self.album_counts.entry(album.to_string()).or_insert(0) += 1;
    }

    fn record_pick(
        &mut self,
        position: usize,
        track_id: &str,
        facts: &TrackFacts,
        guidance: Option<&GenreMixGuidance>,
    ) {
        *self.artist_counts.entry(facts.artist.clone()).or_insert(0) += 1;
        self.note_album(&facts.album);
        self.last_artist_position
            .insert(facts.artist.clone(), position);
        for genre in &facts.normalized_genres {
            self.last_genre_position.insert(genre.clone(), position);
        }
        self.total_duration_seconds += facts.duration_seconds.unwrap_or(DEFAULT_TRACK_SECONDS);
        self.picked_ids.insert(track_id.to_string());
        self.picked_order.push(track_id.to_string());

        if let Some(guidance) = guidance {
            let matches = |list: &[String]| {
                facts
                    .normalized_genres
                    .iter()
                    .any(|g| list.iter().any(|l| l.eq_ignore_ascii_case(g)))
            };
            if matches(&guidance.primary_genres) {
                self.primary_matches += 1;
            } else if guidance
                .secondary_genres
                .as_deref()
                .is_some_and(|s| matches(s))
            {
                self.secondary_matches += 1;
            }
        }
    }
}

/// One selected track with the score and reasons that justified it.
#[derive(Debug, Clone, Serialize)]
pub struct TrackPick {
    #[serde(rename = "trackId")]
    pub track_id: String,
    pub score: f32,
    pub section: String,
    pub reasons: Vec<Reason>,
}

/// Structured report attached when assembly ends before the length target.
/// Under-fill is a valid outcome, reported rather than hidden.
#[derive(Debug, Clone, Serialize)]
pub struct Shortfall {
    pub requested: LengthSpec,
    pub delivered: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct AssembledPlaylist {
    pub picks: Vec<TrackPick>,
    pub shortfall: Option<Shortfall>,
}

fn is_eligible(
    facts: &TrackFacts,
    state: &SelectionState,
    strategy: &PlaylistStrategy,
    request: &NormalizedRequest,
    position: usize,
    remaining: usize,
) -> bool {
    let rules = &strategy.diversity_rules;

    if rules.max_tracks_per_artist > 0
        && state.artist_count(&facts.artist) >= rules.max_tracks_per_artist
    {
        return false;
    }
    if let Some(last) = state.last_artist_position.get(&facts.artist) {
        if position - last <= rules.artist_spacing {
            return false;
        }
    }
    if rules.genre_spacing > 0 {
        for genre in &facts.normalized_genres {
            if let Some(last) = state.last_genre_position.get(genre) {
                if position - last <= rules.genre_spacing {
                    return false;
                }
            }
        }
    }

    // When the remaining positions are only just enough to reach the
    // requested artist floor, repeat artists stop being eligible.
    if let Some(min_artists) = request.min_artists {
        let missing = min_artists.saturating_sub(state.distinct_artists());
        if missing >= remaining && state.artist_count(&facts.artist) > 0 {
            return false;
        }
    }

    true
}

/// Flat score bonus for caller suggestions, applied after criterion
/// weighting so suggested material floats up without bypassing the rules.
fn suggestion_bonus(track_id: &str, facts: &TrackFacts, request: &NormalizedRequest) -> f32 {
    let mut bonus = 0.0;
    if request.suggested_tracks.iter().any(|t| t == track_id) {
        bonus += 0.3;
    }
    if request
        .suggested_artists
        .iter()
        .any(|a| a.eq_ignore_ascii_case(&facts.artist))
    {
        bonus += 0.15;
    }
    if request
        .suggested_albums
        .iter()
        .any(|a| a.eq_ignore_ascii_case(&facts.album))
    {
        bonus += 0.1;
    }
    bonus
}

/// Number of top candidates the surprise dial samples among: 1 at 0.0
/// (always the best), growing to 6 at 1.0.
fn sample_width(surprise: f32) -> usize {
    1 + (surprise * 5.0).round() as usize
}

/// Run the selection loop over playlist positions. Deterministic at
/// surprise = 0 (ties broken by track id); at surprise > 0 the injected RNG
/// samples uniformly among the top-K candidates. State updates are strictly
/// sequential: each position's eligibility depends on all prior picks.
pub fn assemble(
    pool_ids: &[String],
    index: &MatchingIndex,
    request: &NormalizedRequest,
    strategy: &PlaylistStrategy,
    rng: &mut impl Rng,
) -> AssembledPlaylist {
    let sections = normalize_positions(&strategy.ordering_plan.sections);
    let guidance = strategy.genre_mix_guidance.as_ref();
    let mut state = SelectionState::new();
    let mut picks: Vec<TrackPick> = Vec::new();
    let mut shortfall_reason: Option<String> = None;

    let target_tracks = request.target_track_count();
    let target_seconds = match request.length {
        LengthSpec::Minutes(m) => Some(m * 60),
        LengthSpec::Tracks(_) => None,
    };

    loop {
        let position = state.picked_count();
        let done = match request.length {
            LengthSpec::Tracks(n) => position >= n as usize,
            LengthSpec::Minutes(_) => {
                state.total_duration_seconds >= target_seconds.unwrap_or(0)
            }
        };
        if done {
            break;
        }

        let progress = match request.length {
            LengthSpec::Tracks(n) => position as f32 / n as f32,
            LengthSpec::Minutes(_) => {
                state.total_duration_seconds as f32 / target_seconds.unwrap_or(1) as f32
            }
        };
        let section = active_section(&sections, progress);
        let remaining = target_tracks.saturating_sub(position);

        let mut scored: Vec<ScoredCandidate> = pool_ids
            .iter()
            .filter(|id| !state.is_picked(id))
            .filter_map(|id| index.facts(id).map(|facts| (id, facts)))
            .filter(|(_, facts)| {
                is_eligible(facts, &state, strategy, request, position, remaining)
            })
            .filter_map(|(id, facts)| {
                MatchScoring::score_candidate(
                    id,
                    index,
                    strategy,
                    &state,
                    section,
                    &request.moods,
                    &request.activities,
                    request.tempo,
                )
                .map(|mut candidate| {
                    candidate.total += suggestion_bonus(id, facts, request);
                    candidate
                })
            })
            .collect();

        if scored.is_empty() {
            shortfall_reason = Some(if pool_ids.len() == picks.len() {
                "candidate pool exhausted".to_string()
            } else {
                format!("no eligible candidates at position {position}")
            });
            break;
        }

        scored.sort_by(|a, b| {
            b.total
                .partial_cmp(&a.total)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.track_id.cmp(&b.track_id))
        });

        let width = if request.surprise > 0.0 {
            sample_width(request.surprise).min(scored.len())
        } else {
            1
        };
        let choice = if width > 1 { rng.gen_range(0..width) } else { 0 };
        let winner = scored.swap_remove(choice);

        let facts = index
            .facts(&winner.track_id)
            .expect("scored candidates come from the index");
        state.record_pick(position, &winner.track_id, facts, guidance);
        picks.push(TrackPick {
            track_id: winner.track_id,
            score: winner.total,
            section: section.name.clone(),
            reasons: winner.reasons,
        });
    }

    let target_met = match request.length {
        LengthSpec::Tracks(n) => picks.len() >= n as usize,
        LengthSpec::Minutes(_) => state.total_duration_seconds >= target_seconds.unwrap_or(0),
    };
    let shortfall = if target_met {
        None
    } else {
        let reason = shortfall_reason.unwrap_or_else(|| "candidate pool exhausted".to_string());
        log::info!(
            "playlist under-filled: {} of {:?} ({reason})",
            picks.len(),
            request.length
        );
        Some(Shortfall {
            requested: request.length,
            delivered: picks.len(),
            reason,
        })
    };

    AssembledPlaylist { picks, shortfall }
}
