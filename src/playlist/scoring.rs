use crate::models::TempoSpec;
use crate::playlist::assembly::SelectionState;
use crate::playlist::index::{MatchingIndex, TempoBucket, TrackFacts};
use crate::playlist::moods::{mood_implied_by_genre, mood_implied_by_tempo};
use crate::playlist::moods::{activity_implied_by_bpm, activity_implied_by_duration};
use crate::playlist::strategy::{PlaylistStrategy, Section};
use serde::Serialize;

/// Weight of the section-alignment term relative to the strategy's
/// configurable criterion weights.
const SECTION_ALIGNMENT_WEIGHT: f32 = 0.5;

/// Floor returned by the mood/activity fallback chains so missing metadata
/// never excludes a track outright.
const NEUTRAL_SCORE: f32 = 0.5;

/// A human-readable justification attached to a score.
#[derive(Debug, Clone, Serialize)]
pub struct Reason {
    pub explanation: String,
}

/// Pure scorer output: a score in [0, 1] (small bonuses may nudge past 1
/// before weighting) plus the reasons behind it.
#[derive(Debug, Clone)]
pub struct ScoreResult {
    pub score: f32,
    pub reasons: Vec<Reason>,
}

impl ScoreResult {
    fn new(score: f32, explanation: impl Into<String>) -> Self {
        ScoreResult {
            score,
            reasons: vec![Reason {
                explanation: explanation.into(),
            }],
        }
    }
}

/// A fully scored candidate, ready for ranking at one playlist position.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub track_id: String,
    pub total: f32,
    pub reasons: Vec<Reason>,
}

/// Per-criterion scorers. Each is a pure function of the candidate's facts
/// and read-only context; none may fail on missing optional fields.
pub struct MatchScoring;

impl MatchScoring {
    /// Genre-mix fit against the strategy's primary/secondary guidance.
    /// Absent guidance never penalizes.
    pub fn calculate_genre_mix_fit(
        facts: &TrackFacts,
        strategy: &PlaylistStrategy,
        state: &SelectionState,
    ) -> ScoreResult {
        let Some(guidance) = &strategy.genre_mix_guidance else {
            return ScoreResult::new(1.0, "no genre-mix guidance in effect");
        };
        let Some(secondary) = &guidance.secondary_genres else {
            return ScoreResult::new(1.0, "no secondary genres in the mix guidance");
        };

        let matches_in = |list: &[String]| -> Option<String> {
            facts
                .normalized_genres
                .iter()
                .find(|g| list.iter().any(|l| l.eq_ignore_ascii_case(g)))
                .cloned()
        };
        let primary_hit = matches_in(&guidance.primary_genres);
        let secondary_hit = matches_in(secondary);

        let chosen = state.primary_matches + state.secondary_matches;
        let primary_over = chosen > 0
            && (state.primary_matches as f32 / chosen as f32) > guidance.mix_ratio.primary;

        if let Some(genre) = &secondary_hit {
            if primary_over {
                return ScoreResult::new(
                    1.0,
                    format!("secondary genre {genre} rebalances an over-weighted primary mix"),
                );
            }
        }
        if let Some(genre) = primary_hit {
            return ScoreResult::new(0.9, format!("matches primary genre {genre}"));
        }
        if let Some(genre) = secondary_hit {
            return ScoreResult::new(0.75, format!("matches secondary genre {genre}"));
        }

        // Neither list: score by how close the candidate's genre set comes
        // to either one (substring proximity on canonical names).
        let near_miss = facts.normalized_genres.iter().any(|g| {
            let g_lower = g.to_lowercase();
            guidance
                .primary_genres
                .iter()
                .chain(secondary.iter())
                .any(|l| {
                    let l_lower = l.to_lowercase();
                    g_lower.contains(&l_lower) || l_lower.contains(&g_lower)
                })
        });
        if near_miss {
            ScoreResult::new(0.5, "related to the requested genre mix")
        } else {
            ScoreResult::new(0.25, "outside the requested genre mix")
        }
    }

    /// Soft diversity penalty for attributes over-represented in the tracks
    /// chosen so far. Proportional, never a hard reject; the hard
    /// spacing/cap rules live in assembly eligibility.
    pub fn calculate_diversity(
        facts: &TrackFacts,
        strategy: &PlaylistStrategy,
        state: &SelectionState,
        index: &MatchingIndex,
    ) -> ScoreResult {
        let rules = &strategy.diversity_rules;
        let mut score = 1.0_f32;
        let mut reasons: Vec<Reason> = Vec::new();

        let album_count = state.album_count(&facts.album);
        if rules.max_tracks_per_album > 0 && album_count >= rules.max_tracks_per_album {
            let over = album_count - rules.max_tracks_per_album + 1;
            score -= 0.35 * over as f32;
            reasons.push(Reason {
                explanation: format!(
                    "album \"{}\" already has {album_count} tracks selected",
                    facts.album
                ),
            });
        }

        if let Some(year) = facts.year {
            let decade = year / 10 * 10;
            let recent = state.recent_picks(5);
            let same_decade = recent
                .iter()
                .filter_map(|id| index.facts(id).and_then(|f| f.year))
                .filter(|y| y / 10 * 10 == decade)
                .count();
            if recent.len() >= 3 && same_decade >= 3 {
                score -= 0.2;
                reasons.push(Reason {
                    explanation: format!("the {decade}s already dominate the recent picks"),
                });
            }
        }

        if reasons.is_empty() {
            reasons.push(Reason {
                explanation: "adds variety to the selection".to_string(),
            });
        }
        ScoreResult {
            score: score.clamp(0.0, 1.0),
            reasons,
        }
    }

    /// Mood match with a fallback chain: explicit canonical tags, then
    /// genre-implied mood, then tempo-implied mood, then a neutral floor.
    /// A complete absence of mood metadata never excludes a track.
    pub fn calculate_mood_match(facts: &TrackFacts, requested_moods: &[String]) -> ScoreResult {
        if requested_moods.is_empty() {
            return ScoreResult::new(1.0, "no mood requested");
        }

        let explicit: Vec<&String> = facts
            .moods
            .iter()
            .filter(|m| requested_moods.iter().any(|r| r.eq_ignore_ascii_case(m)))
            .collect();
        if let Some(first) = explicit.first() {
            let bonus = 0.05 * (explicit.len().saturating_sub(1)) as f32;
            return ScoreResult::new(
                (0.95 + bonus).min(1.0),
                format!("mood tag matches requested {first}"),
            );
        }

        for genre in &facts.normalized_genres {
            if let Some(implied) = mood_implied_by_genre(genre) {
                if requested_moods.iter().any(|r| r.eq_ignore_ascii_case(implied)) {
                    return ScoreResult::new(
                        0.65,
                        format!("genre {genre} implies a {implied} mood"),
                    );
                }
            }
        }

        if let Some(implied) = mood_implied_by_tempo(facts.tempo_bucket) {
            if requested_moods.iter().any(|r| r.eq_ignore_ascii_case(implied)) {
                return ScoreResult::new(
                    0.55,
                    format!("{} tempo suggests a {implied} mood", facts.tempo_bucket.label()),
                );
            }
        }

        ScoreResult::new(
            NEUTRAL_SCORE,
            "no mood signal on this track; scored neutrally",
        )
    }

    /// Activity match: explicit tags, then BPM-implied, then
    /// duration-implied, then the neutral floor.
    pub fn calculate_activity_match(
        facts: &TrackFacts,
        requested_activities: &[String],
    ) -> ScoreResult {
        if requested_activities.is_empty() {
            return ScoreResult::new(1.0, "no activity requested");
        }

        if let Some(hit) = facts
            .activities
            .iter()
            .find(|a| requested_activities.iter().any(|r| r.eq_ignore_ascii_case(a)))
        {
            return ScoreResult::new(0.95, format!("activity tag matches requested {hit}"));
        }

        if let Some(bpm) = facts.bpm {
            if let Some(implied) = activity_implied_by_bpm(bpm) {
                if requested_activities
                    .iter()
                    .any(|r| r.eq_ignore_ascii_case(implied))
                {
                    return ScoreResult::new(0.7, format!("{bpm} BPM suits {implied}"));
                }
            }
        }

        if let Some(duration) = facts.duration_seconds {
            if let Some(implied) = activity_implied_by_duration(duration) {
                if requested_activities
                    .iter()
                    .any(|r| r.eq_ignore_ascii_case(implied))
                {
                    return ScoreResult::new(
                        0.6,
                        format!("long runtime suits {implied} listening"),
                    );
                }
            }
        }

        ScoreResult::new(
            NEUTRAL_SCORE,
            "no activity signal on this track; scored neutrally",
        )
    }

    /// Tempo match against the request's tempo spec. Bucket requests score
    /// by equality/adjacency; BPM-range requests by linear distance from the
    /// range, clipped to [0, 1].
    pub fn calculate_tempo_match(facts: &TrackFacts, tempo: Option<TempoSpec>) -> ScoreResult {
        let Some(spec) = tempo else {
            return ScoreResult::new(1.0, "no tempo requested");
        };

        match spec {
            TempoSpec::Bucket(requested) => {
                let bucket = facts.tempo_bucket;
                if bucket == TempoBucket::Unknown {
                    ScoreResult::new(NEUTRAL_SCORE, "tempo unknown; scored neutrally")
                } else if bucket == requested {
                    ScoreResult::new(1.0, format!("{} tempo as requested", bucket.label()))
                } else if bucket.is_adjacent(requested) {
                    ScoreResult::new(
                        0.6,
                        format!(
                            "{} tempo is adjacent to the requested {}",
                            bucket.label(),
                            requested.label()
                        ),
                    )
                } else {
                    ScoreResult::new(
                        0.25,
                        format!(
                            "{} tempo is far from the requested {}",
                            bucket.label(),
                            requested.label()
                        ),
                    )
                }
            }
            TempoSpec::Range { min_bpm, max_bpm } => match facts.bpm {
                None => ScoreResult::new(NEUTRAL_SCORE, "no BPM data; scored neutrally"),
                Some(bpm) if bpm >= min_bpm && bpm <= max_bpm => {
                    ScoreResult::new(1.0, format!("{bpm} BPM inside {min_bpm}-{max_bpm}"))
                }
                Some(bpm) => {
                    let distance = if bpm < min_bpm {
                        min_bpm - bpm
                    } else {
                        bpm - max_bpm
                    };
                    let score = (1.0 - distance as f32 / 60.0).clamp(0.0, 1.0);
                    ScoreResult::new(
                        score,
                        format!("{bpm} BPM is {distance} away from {min_bpm}-{max_bpm}"),
                    )
                }
            },
        }
    }

    /// Alignment with the active ordering-plan section's tempo/energy
    /// targets. Sections without targets are neutral.
    pub fn calculate_section_alignment(facts: &TrackFacts, section: &Section) -> ScoreResult {
        let mut parts: Vec<f32> = Vec::new();

        if let Some(target) = section.tempo_target {
            let bucket = facts.tempo_bucket;
            parts.push(if bucket == TempoBucket::Unknown {
                0.5
            } else if bucket == target {
                1.0
            } else if bucket.is_adjacent(target) {
                0.6
            } else {
                0.2
            });
        }

        if let Some(target_energy) = section.energy_level {
            let track_energy = match facts.tempo_bucket {
                TempoBucket::Fast => 0.85,
                TempoBucket::Medium => 0.6,
                TempoBucket::Slow => 0.35,
                TempoBucket::Unknown => 0.5,
            };
            parts.push(1.0 - (track_energy - target_energy).abs());
        }

        if parts.is_empty() {
            return ScoreResult::new(1.0, format!("section \"{}\" has no targets", section.name));
        }
        let score = parts.iter().sum::<f32>() / parts.len() as f32;
        ScoreResult::new(
            score,
            format!("fit for the \"{}\" section of the arc", section.name),
        )
    }

    /// Weighted aggregate of the five criterion scores plus the
    /// section-alignment term. Weights are relative and need not sum to 1.
    pub fn score_candidate(
        track_id: &str,
        index: &MatchingIndex,
        strategy: &PlaylistStrategy,
        state: &SelectionState,
        section: &Section,
        requested_moods: &[String],
        requested_activities: &[String],
        tempo: Option<TempoSpec>,
    ) -> Option<ScoredCandidate> {
        let facts = index.facts(track_id)?;
        let weights = &strategy.scoring_weights;

        let genre = Self::calculate_genre_mix_fit(facts, strategy, state);
        let diversity = Self::calculate_diversity(facts, strategy, state, index);
        let mood = Self::calculate_mood_match(facts, requested_moods);
        let activity = Self::calculate_activity_match(facts, requested_activities);
        let tempo_score = Self::calculate_tempo_match(facts, tempo);
        let section_score = Self::calculate_section_alignment(facts, section);

        let total = weights.genre_match * genre.score
            + weights.diversity * diversity.score
            + weights.mood_match * mood.score
            + weights.activity_match * activity.score
            + weights.tempo_match * tempo_score.score
            + SECTION_ALIGNMENT_WEIGHT * section_score.score;

        let mut reasons = Vec::new();
        for result in [genre, diversity, mood, activity, tempo_score, section_score] {
            reasons.extend(result.reasons);
        }

        Some(ScoredCandidate {
            track_id: track_id.to_string(),
            total,
            reasons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Track;
    use crate::playlist::strategy::{GenreMixGuidance, MixRatio};
    use approx::assert_relative_eq;

    fn facts_for(track: Track) -> (MatchingIndex, String) {
        let id = track.id.clone();
        (MatchingIndex::build(&[track]), id)
    }

    fn bare_track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            ..Track::default()
        }
    }

    #[test]
    fn test_mood_fallback_never_scores_below_neutral_floor() {
        // No mood tags, no BPM, no duration: the fallback chain must land
        // on the neutral floor, not zero.
        let (index, id) = facts_for(bare_track("1"));
        let facts = index.facts(&id).unwrap();

        let mood = MatchScoring::calculate_mood_match(facts, &["Calm".to_string()]);
        assert!(mood.score >= 0.5);
        let activity =
            MatchScoring::calculate_activity_match(facts, &["Workout".to_string()]);
        assert!(activity.score >= 0.5);
    }

    #[test]
    fn test_mood_fallback_chain_orders_signals() {
        let mut tagged = bare_track("tagged");
        tagged.enhanced = Some(crate::models::EnhancedMetadata {
            moods: vec!["dreamy".to_string()],
            ..Default::default()
        });
        let (index, id) = facts_for(tagged);
        let explicit = MatchScoring::calculate_mood_match(
            index.facts(&id).unwrap(),
            &["Calm".to_string()],
        );

        let mut ambient = bare_track("ambient");
        ambient.genres = vec!["Ambient".to_string()];
        let (index, id) = facts_for(ambient);
        let implied = MatchScoring::calculate_mood_match(
            index.facts(&id).unwrap(),
            &["Calm".to_string()],
        );

        let mut slow = bare_track("slow");
        slow.bpm = Some(70);
        let (index, id) = facts_for(slow);
        let tempo_implied = MatchScoring::calculate_mood_match(
            index.facts(&id).unwrap(),
            &["Calm".to_string()],
        );

        assert!(explicit.score > implied.score);
        assert!(implied.score > tempo_implied.score);
        assert!(tempo_implied.score > 0.5);
        assert!(
            implied.reasons[0].explanation.contains("Ambient"),
            "fallback reason should name the genre: {:?}",
            implied.reasons
        );
    }

    #[test]
    fn test_activity_bpm_fallback() {
        let mut fast = bare_track("fast");
        fast.bpm = Some(150);
        let (index, id) = facts_for(fast);
        let result = MatchScoring::calculate_activity_match(
            index.facts(&id).unwrap(),
            &["Workout".to_string()],
        );
        assert_relative_eq!(result.score, 0.7);
    }

    #[test]
    fn test_tempo_bucket_adjacency() {
        let mut medium = bare_track("m");
        medium.bpm = Some(110);
        let (index, id) = facts_for(medium);
        let facts = index.facts(&id).unwrap();

        let exact = MatchScoring::calculate_tempo_match(
            facts,
            Some(TempoSpec::Bucket(TempoBucket::Medium)),
        );
        let adjacent = MatchScoring::calculate_tempo_match(
            facts,
            Some(TempoSpec::Bucket(TempoBucket::Fast)),
        );
        assert_relative_eq!(exact.score, 1.0);
        assert_relative_eq!(adjacent.score, 0.6);
    }

    #[test]
    fn test_tempo_range_linear_distance() {
        let mut track = bare_track("t");
        track.bpm = Some(90);
        let (index, id) = facts_for(track);
        let facts = index.facts(&id).unwrap();

        let inside = MatchScoring::calculate_tempo_match(
            facts,
            Some(TempoSpec::Range {
                min_bpm: 80,
                max_bpm: 100,
            }),
        );
        assert_relative_eq!(inside.score, 1.0);

        let near = MatchScoring::calculate_tempo_match(
            facts,
            Some(TempoSpec::Range {
                min_bpm: 120,
                max_bpm: 140,
            }),
        );
        assert_relative_eq!(near.score, 0.5); // 30 BPM away

        let far = MatchScoring::calculate_tempo_match(
            facts,
            Some(TempoSpec::Range {
                min_bpm: 160,
                max_bpm: 180,
            }),
        );
        assert_relative_eq!(far.score, 0.0); // clipped
    }

    #[test]
    fn test_genre_mix_without_guidance_never_penalizes() {
        let mut track = bare_track("1");
        track.genres = vec!["Polka".to_string()];
        let (index, id) = facts_for(track);
        let strategy = PlaylistStrategy {
            genre_mix_guidance: None,
            ..test_strategy()
        };
        let result = MatchScoring::calculate_genre_mix_fit(
            index.facts(&id).unwrap(),
            &strategy,
            &SelectionState::new(),
        );
        assert_relative_eq!(result.score, 1.0);
    }

    #[test]
    fn test_secondary_boost_when_primary_over_represented() {
        let mut track = bare_track("1");
        track.genres = vec!["Soul".to_string()];
        let (index, id) = facts_for(track);
        let strategy = test_strategy();

        let mut state = SelectionState::new();
        // Three primary picks, zero secondary: primary is over-represented
        // versus the 0.7 target ratio.
        state.primary_matches = 3;

        let result = MatchScoring::calculate_genre_mix_fit(
            index.facts(&id).unwrap(),
            &strategy,
            &state,
        );
        assert_relative_eq!(result.score, 1.0);
        assert!(result.reasons[0].explanation.contains("secondary"));
    }

    #[test]
    fn test_unrelated_genre_scores_low_but_nonzero() {
        let mut track = bare_track("1");
        track.genres = vec!["Polka".to_string()];
        let (index, id) = facts_for(track);
        let result = MatchScoring::calculate_genre_mix_fit(
            index.facts(&id).unwrap(),
            &test_strategy(),
            &SelectionState::new(),
        );
        assert!(result.score > 0.0 && result.score < 0.5);
    }

    fn test_strategy() -> PlaylistStrategy {
        PlaylistStrategy {
            title: "test".to_string(),
            description: String::new(),
            constraints: Vec::new(),
            scoring_weights: Default::default(),
            diversity_rules: Default::default(),
            ordering_plan: Default::default(),
            vibe_tags: Vec::new(),
            tempo_guidance: None,
            genre_mix_guidance: Some(GenreMixGuidance {
                primary_genres: vec!["Jazz".to_string()],
                secondary_genres: Some(vec!["Soul".to_string()]),
                mix_ratio: MixRatio {
                    primary: 0.7,
                    secondary: 0.3,
                },
            }),
        }
    }

    #[test]
    fn test_album_repetition_penalty() {
        let mut track = bare_track("1");
        track.album = "Repeats".to_string();
        let (index, id) = facts_for(track);

        let mut state = SelectionState::new();
        state.note_album("Repeats");
        state.note_album("Repeats");

        let result = MatchScoring::calculate_diversity(
            index.facts(&id).unwrap(),
            &test_strategy(),
            &state,
            &index,
        );
        assert!(result.score < 1.0);
        assert!(result.reasons[0].explanation.contains("album"));
    }
}
