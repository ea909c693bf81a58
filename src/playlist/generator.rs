use crate::models::{PlaylistRequest, Track};
use crate::playlist::GenerationError;
use crate::playlist::assembly::{Shortfall, TrackPick, assemble};
use crate::playlist::filters::PoolFilters;
use crate::playlist::instructions::{
    apply_instruction_hints_to_request, merge_instructions_into_request,
    parse_strategy_hints_from_instructions,
};
use crate::playlist::index::MatchingIndex;
use crate::playlist::request::normalize_playlist_request;
use crate::playlist::similarity::GenreCoOccurrence;
use crate::playlist::strategy::{PlaylistStrategy, build_heuristic_strategy};
use crate::playlist::summary::{PlaylistSummary, build_summary};
use chrono::{DateTime, Utc};
use rand::Rng;

/// How the strategy for a run is sourced. The engine treats an external
/// strategy identically to the built-in heuristic; `fallback_used` is
/// carried through to the output untouched.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub strategy: Option<PlaylistStrategy>,
    pub fallback_used: bool,
}

/// The engine's complete output for one request.
#[derive(Debug)]
pub struct GeneratedPlaylist {
    pub title: String,
    pub track_ids: Vec<String>,
    pub picks: Vec<TrackPick>,
    pub summary: PlaylistSummary,
    pub shortfall: Option<Shortfall>,
    pub fallback_used: bool,
}

/// Main playlist generator: one immutable options bundle, one `generate`
/// call per request.
pub struct PlaylistGenerator {
    options: GenerationOptions,
}

impl PlaylistGenerator {
    pub fn new(options: GenerationOptions) -> Self {
        Self { options }
    }

    /// Run the full pipeline: request normalization, instruction parsing,
    /// pool filtering, index construction, strategy resolution, assembly
    /// and summarization. `now` pins the recency clock; `rng` drives
    /// surprise sampling. An empty post-filter pool yields an empty
    /// playlist with a shortfall reason, not an error.
    pub fn generate(
        &self,
        tracks: &[Track],
        request: &PlaylistRequest,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Result<GeneratedPlaylist, GenerationError> {
        let mut normalized = normalize_playlist_request(request)?;

        if let Some(text) = normalized.additional_instructions.clone() {
            let hints = parse_strategy_hints_from_instructions(&text);
            apply_instruction_hints_to_request(&mut normalized, &hints);
        }

        let pool = PoolFilters::apply_recent_filter(tracks.to_vec(), &normalized, now);
        let pool = PoolFilters::apply_artist_exclusions(pool, &normalized.disallowed_artists);
        let pool = PoolFilters::apply_duration_bounds(
            pool,
            normalized.min_duration_seconds,
            normalized.max_duration_seconds,
        );
        log::debug!(
            "candidate pool: {} of {} tracks after filters",
            pool.len(),
            tracks.len()
        );

        let index = MatchingIndex::build(&pool);

        if self.options.strategy.is_none() {
            merge_instructions_into_request(&mut normalized, &index.library_genres());
        }

        let strategy = match &self.options.strategy {
            Some(external) => external.clone(),
            None => {
                let co = GenreCoOccurrence::build(&pool, &index.genre_mappings);
                build_heuristic_strategy(&normalized, &index, &co)
            }
        };

        let mut pool_ids: Vec<String> = pool.iter().map(|t| t.id.clone()).collect();
        pool_ids.sort();

        let assembled = assemble(&pool_ids, &index, &normalized, &strategy, rng);
        let summary = build_summary(&assembled.picks, &index);
        let track_ids: Vec<String> = assembled
            .picks
            .iter()
            .map(|p| p.track_id.clone())
            .collect();

        log::info!(
            "generated \"{}\": {} tracks, {} s",
            strategy.title,
            summary.track_count,
            summary.total_duration
        );

        Ok(GeneratedPlaylist {
            title: strategy.title.clone(),
            track_ids,
            picks: assembled.picks,
            summary,
            shortfall: assembled.shortfall,
            fallback_used: self.options.fallback_used,
        })
    }
}
