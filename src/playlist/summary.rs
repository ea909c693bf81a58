use crate::playlist::assembly::TrackPick;
use crate::playlist::index::MatchingIndex;
use serde::Serialize;
use std::collections::HashMap;

/// Composition summary of an assembled playlist, produced for the
/// explanation/UI layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaylistSummary {
    #[serde(rename = "genreMix")]
    pub genre_mix: HashMap<String, usize>,
    #[serde(rename = "tempoMix")]
    pub tempo_mix: HashMap<String, usize>,
    #[serde(rename = "artistMix")]
    pub artist_mix: HashMap<String, usize>,
    #[serde(rename = "totalDuration")]
    pub total_duration: u32,
    #[serde(rename = "trackCount")]
    pub track_count: usize,
    #[serde(rename = "avgDuration")]
    pub avg_duration: f32,
    #[serde(rename = "minDuration")]
    pub min_duration: u32,
    #[serde(rename = "maxDuration")]
    pub max_duration: u32,
}

/// Fold the picks' index facts into composition counts. `track_count`
/// always reflects the delivered length, not the requested one.
pub fn build_summary(picks: &[TrackPick], index: &MatchingIndex) -> PlaylistSummary {
    if picks.is_empty() {
        return PlaylistSummary::default();
    }

    let mut summary = PlaylistSummary {
        track_count: picks.len(),
        ..PlaylistSummary::default()
    };
    let mut durations: Vec<u32> = Vec::new();

    for pick in picks {
        let Some(facts) = index.facts(&pick.track_id) else {
            continue;
        };
        for genre in &facts.normalized_genres {
            *summary.genre_mix.entry(genre.clone()).or_insert(0) += 1;
        }
        *summary
            .tempo_mix
            .entry(facts.tempo_bucket.label().to_string())
            .or_insert(0) += 1;
        *summary
            .artist_mix
            .entry(facts.artist.clone())
            .or_insert(0) += 1;
        if let Some(duration) = facts.duration_seconds {
            durations.push(duration);
        }
    }

    if !durations.is_empty() {
        summary.total_duration = durations.iter().sum();
        summary.avg_duration = summary.total_duration as f32 / durations.len() as f32;
        summary.min_duration = *durations.iter().min().expect("non-empty");
        summary.max_duration = *durations.iter().max().expect("non-empty");
    }

    summary
}
