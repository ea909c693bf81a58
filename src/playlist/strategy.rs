use crate::models::TempoSpec;
use crate::playlist::index::{MatchingIndex, TempoBucket};
use crate::playlist::request::NormalizedRequest;
use crate::playlist::similarity::{GenreCoOccurrence, similar_genres};
use serde::{Deserialize, Serialize};

/// Relative weights combining the per-criterion scores. They need not sum to
/// 1; a strategy can emphasize one axis without renormalizing the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(rename = "genreMatch")]
    pub genre_match: f32,
    #[serde(rename = "tempoMatch")]
    pub tempo_match: f32,
    #[serde(rename = "moodMatch")]
    pub mood_match: f32,
    #[serde(rename = "activityMatch")]
    pub activity_match: f32,
    pub diversity: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            genre_match: 1.0,
            tempo_match: 0.8,
            mood_match: 0.9,
            activity_match: 0.7,
            diversity: 0.6,
        }
    }
}

/// Hard eligibility constraints applied during assembly, distinct from the
/// soft diversity scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversityRules {
    #[serde(rename = "maxTracksPerArtist")]
    pub max_tracks_per_artist: usize,
    #[serde(rename = "artistSpacing")]
    pub artist_spacing: usize,
    #[serde(rename = "genreSpacing")]
    pub genre_spacing: usize,
    #[serde(rename = "maxTracksPerAlbum")]
    pub max_tracks_per_album: usize,
}

impl Default for DiversityRules {
    fn default() -> Self {
        DiversityRules {
            max_tracks_per_artist: 2,
            artist_spacing: 2,
            genre_spacing: 1,
            max_tracks_per_album: 2,
        }
    }
}

/// One named span of the flow arc, covering a contiguous fraction of the
/// playlist with optional tempo/energy targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    #[serde(rename = "startPosition")]
    pub start_position: f32,
    #[serde(rename = "endPosition")]
    pub end_position: f32,
    #[serde(rename = "tempoTarget")]
    pub tempo_target: Option<TempoBucket>,
    #[serde(rename = "energyLevel")]
    pub energy_level: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderingPlan {
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MixRatio {
    pub primary: f32,
    pub secondary: f32,
}

/// Primary/secondary genre-mix guidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreMixGuidance {
    #[serde(rename = "primaryGenres")]
    pub primary_genres: Vec<String>,
    #[serde(rename = "secondaryGenres")]
    pub secondary_genres: Option<Vec<String>>,
    #[serde(rename = "mixRatio")]
    pub mix_ratio: MixRatio,
}

/// The declarative generation plan: weights, diversity rules, ordering plan
/// and genre-mix guidance. Produced once per request, either heuristically
/// here or by an external generator as JSON, and treated as immutable input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistStrategy {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(rename = "scoringWeights", default)]
    pub scoring_weights: ScoringWeights,
    #[serde(rename = "diversityRules", default)]
    pub diversity_rules: DiversityRules,
    #[serde(rename = "orderingPlan", default)]
    pub ordering_plan: OrderingPlan,
    #[serde(rename = "vibeTags", default)]
    pub vibe_tags: Vec<String>,
    #[serde(rename = "tempoGuidance")]
    pub tempo_guidance: Option<String>,
    #[serde(rename = "genreMixGuidance")]
    pub genre_mix_guidance: Option<GenreMixGuidance>,
}

fn default_full_section() -> Section {
    Section {
        name: "playlist".to_string(),
        start_position: 0.0,
        end_position: 1.0,
        tempo_target: None,
        energy_level: None,
    }
}

/// Normalize a section list into contiguous, non-overlapping ranges spanning
/// [0, 1], with the last section ending at exactly 1. Operates on a sorted
/// copy; caller-owned data is never mutated. Empty input yields one
/// full-range section.
pub fn normalize_positions(sections: &[Section]) -> Vec<Section> {
    if sections.is_empty() {
        return vec![default_full_section()];
    }

    let mut sorted: Vec<Section> = sections.to_vec();
    sorted.sort_by(|a, b| {
        a.start_position
            .partial_cmp(&b.start_position)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut cursor = 0.0_f32;
    let count = sorted.len();
    for (i, section) in sorted.iter_mut().enumerate() {
        section.start_position = cursor;
        section.end_position = if i == count - 1 {
            1.0
        } else {
            section.end_position.clamp(cursor, 1.0)
        };
        cursor = section.end_position;
    }

    sorted
}

/// Resolve the section whose [start, end) range contains the normalized
/// position. Positions at or past 1 land in the final section.
pub fn active_section(sections: &[Section], position: f32) -> &Section {
    sections
        .iter()
        .find(|s| position >= s.start_position && position < s.end_position)
        .unwrap_or_else(|| sections.last().expect("normalized sections are non-empty"))
}

fn step_down(bucket: TempoBucket) -> TempoBucket {
    match bucket {
        TempoBucket::Fast => TempoBucket::Medium,
        TempoBucket::Medium | TempoBucket::Slow => TempoBucket::Slow,
        TempoBucket::Unknown => TempoBucket::Medium,
    }
}

fn core_tempo_for(request: &NormalizedRequest) -> TempoBucket {
    match request.tempo {
        Some(TempoSpec::Bucket(bucket)) => bucket,
        Some(TempoSpec::Range { min_bpm, max_bpm }) => {
            TempoBucket::from_bpm(Some((min_bpm + max_bpm) / 2))
        }
        None => {
            let wants = |name: &str| request.activities.iter().any(|a| a == name);
            if wants("Workout") || wants("Party") {
                TempoBucket::Fast
            } else if wants("Sleep") || wants("Relax") {
                TempoBucket::Slow
            } else {
                TempoBucket::Medium
            }
        }
    }
}

fn energy_for(bucket: TempoBucket) -> f32 {
    match bucket {
        TempoBucket::Fast => 0.85,
        TempoBucket::Medium => 0.6,
        TempoBucket::Slow => 0.35,
        TempoBucket::Unknown => 0.5,
    }
}

/// Build the deterministic built-in strategy: a warm-up / core / cool-down
/// arc around the request's tempo, default weights and diversity rules, and
/// genre-mix guidance seeded from library similarity.
pub fn build_heuristic_strategy(
    request: &NormalizedRequest,
    index: &MatchingIndex,
    co_occurrence: &GenreCoOccurrence,
) -> PlaylistStrategy {
    let core_tempo = core_tempo_for(request);
    let warmup_tempo = step_down(core_tempo);

    let sections = normalize_positions(&[
        Section {
            name: "warm-up".to_string(),
            start_position: 0.0,
            end_position: 0.2,
            tempo_target: Some(warmup_tempo),
            energy_level: Some(energy_for(warmup_tempo)),
        },
        Section {
            name: "core".to_string(),
            start_position: 0.2,
            end_position: 0.85,
            tempo_target: Some(core_tempo),
            energy_level: Some(energy_for(core_tempo)),
        },
        Section {
            name: "cool-down".to_string(),
            start_position: 0.85,
            end_position: 1.0,
            tempo_target: Some(TempoBucket::Slow),
            energy_level: Some(0.3),
        },
    ]);

    let primary_genres: Vec<String> = request
        .genres
        .iter()
        .filter_map(|g| index.genre_mappings.canonical_for(g))
        .collect();

    let genre_mix_guidance = if primary_genres.is_empty() {
        None
    } else {
        let secondary = similar_genres(&primary_genres, &index.library_genres(), co_occurrence, 6);
        Some(GenreMixGuidance {
            primary_genres: primary_genres.clone(),
            secondary_genres: (!secondary.is_empty()).then_some(secondary),
            mix_ratio: MixRatio {
                primary: 0.7,
                secondary: 0.3,
            },
        })
    };

    let mut vibe_tags = request.moods.clone();
    vibe_tags.extend(request.activities.iter().cloned());

    let title = match (request.moods.first(), primary_genres.first()) {
        (Some(mood), Some(genre)) => format!("{mood} {genre} Mix"),
        (Some(mood), None) => format!("{mood} Mix"),
        (None, Some(genre)) => format!("{genre} Mix"),
        (None, None) => "Library Mix".to_string(),
    };

    PlaylistStrategy {
        title,
        description: format!(
            "Heuristic plan: {} core with a gentle warm-up and cool-down",
            core_tempo.label()
        ),
        constraints: Vec::new(),
        scoring_weights: ScoringWeights::default(),
        diversity_rules: DiversityRules::default(),
        ordering_plan: OrderingPlan { sections },
        vibe_tags,
        tempo_guidance: Some(format!(
            "{} -> {} -> slow",
            warmup_tempo.label(),
            core_tempo.label()
        )),
        genre_mix_guidance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlaylistRequest, Track};
    use crate::playlist::genres::build_genre_mappings;
    use crate::playlist::request::normalize_playlist_request;

    #[test]
    fn test_normalize_positions_empty_input() {
        let sections = normalize_positions(&[]);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].start_position, 0.0);
        assert_eq!(sections[0].end_position, 1.0);
    }

    #[test]
    fn test_normalize_positions_makes_ranges_contiguous() {
        let input = vec![
            Section {
                name: "b".to_string(),
                start_position: 0.5,
                end_position: 0.9,
                tempo_target: None,
                energy_level: None,
            },
            Section {
                name: "a".to_string(),
                start_position: 0.1,
                end_position: 0.4,
                tempo_target: None,
                energy_level: None,
            },
        ];
        let normalized = normalize_positions(&input);

        assert_eq!(normalized[0].name, "a");
        assert_eq!(normalized[0].start_position, 0.0);
        assert_eq!(normalized[1].start_position, normalized[0].end_position);
        assert_eq!(normalized.last().unwrap().end_position, 1.0);
        // Caller data untouched.
        assert_eq!(input[0].start_position, 0.5);
    }

    #[test]
    fn test_active_section_lookup() {
        let sections = normalize_positions(&[]);
        assert_eq!(active_section(&sections, 0.0).name, "playlist");
        assert_eq!(active_section(&sections, 1.0).name, "playlist");

        let request = normalize_playlist_request(&PlaylistRequest::default()).unwrap();
        let index = MatchingIndex::build(&[]);
        let strategy =
            build_heuristic_strategy(&request, &index, &GenreCoOccurrence::default());
        let sections = &strategy.ordering_plan.sections;
        assert_eq!(active_section(sections, 0.05).name, "warm-up");
        assert_eq!(active_section(sections, 0.5).name, "core");
        assert_eq!(active_section(sections, 0.95).name, "cool-down");
    }

    #[test]
    fn test_workout_request_gets_fast_core() {
        let request = normalize_playlist_request(&PlaylistRequest {
            activity: vec!["cycling".to_string()],
            ..PlaylistRequest::default()
        })
        .unwrap();
        let index = MatchingIndex::build(&[]);
        let strategy =
            build_heuristic_strategy(&request, &index, &GenreCoOccurrence::default());
        let core = strategy
            .ordering_plan
            .sections
            .iter()
            .find(|s| s.name == "core")
            .unwrap();
        assert_eq!(core.tempo_target, Some(TempoBucket::Fast));
    }

    #[test]
    fn test_genre_mix_guidance_uses_canonical_primaries() {
        let tracks = vec![Track {
            id: "1".to_string(),
            genres: vec!["Jazz".to_string(), "Soul".to_string()],
            ..Track::default()
        }];
        let mapping = build_genre_mappings(&tracks);
        let co = GenreCoOccurrence::build(&tracks, &mapping);
        let index = MatchingIndex::build(&tracks);

        let request = normalize_playlist_request(&PlaylistRequest {
            genres: vec!["jazz".to_string()],
            ..PlaylistRequest::default()
        })
        .unwrap();
        let strategy = build_heuristic_strategy(&request, &index, &co);
        let guidance = strategy.genre_mix_guidance.unwrap();
        assert_eq!(guidance.primary_genres, vec!["Jazz"]);
        assert!(guidance.secondary_genres.unwrap().contains(&"Soul".to_string()));
    }

    #[test]
    fn test_strategy_round_trips_through_json() {
        let request = normalize_playlist_request(&PlaylistRequest::default()).unwrap();
        let index = MatchingIndex::build(&[]);
        let strategy =
            build_heuristic_strategy(&request, &index, &GenreCoOccurrence::default());
        let json = serde_json::to_string(&strategy).unwrap();
        let back: PlaylistStrategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, strategy.title);
        assert_eq!(
            back.ordering_plan.sections.len(),
            strategy.ordering_plan.sections.len()
        );
    }
}
