use crate::models::{
    LengthSpec, PlaylistRequest, RecentWindow, SourcePool, TempoSpec,
};
use crate::playlist::GenerationError;
use crate::playlist::moods::{normalize_activity_category, normalize_mood_category};

/// A request with defaults filled, mood/activity input folded to canonical
/// categories, and shape validated. Effective input of the engine.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub genres: Vec<String>,
    pub moods: Vec<String>,
    pub activities: Vec<String>,
    pub tempo: Option<TempoSpec>,
    pub length: LengthSpec,
    pub surprise: f32,
    pub source_pool: SourcePool,
    pub recent_window: Option<RecentWindow>,
    pub recent_track_count: Option<usize>,
    pub additional_instructions: Option<String>,
    pub min_artists: Option<usize>,
    pub disallowed_artists: Vec<String>,
    pub suggested_artists: Vec<String>,
    pub suggested_albums: Vec<String>,
    pub suggested_tracks: Vec<String>,
    pub min_duration_seconds: Option<u32>,
    pub max_duration_seconds: Option<u32>,
}

/// Fold a tag list through a category normalizer. Unrecognized tokens are
/// preserved as-is: user-entered free text is never silently dropped.
fn normalize_tags(tags: &[String], lookup: fn(&str) -> Option<&'static str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let mapped = lookup(tag)
            .map(str::to_string)
            .unwrap_or_else(|| tag.clone());
        if !out.iter().any(|t| t.eq_ignore_ascii_case(&mapped)) {
            out.push(mapped);
        }
    }
    out
}

/// Validate a raw request and fill its defaults.
pub fn normalize_playlist_request(
    request: &PlaylistRequest,
) -> Result<NormalizedRequest, GenerationError> {
    match request.length {
        LengthSpec::Minutes(0) | LengthSpec::Tracks(0) => {
            return Err(GenerationError::InvalidRequest(
                "playlist length must be positive".to_string(),
            ));
        }
        _ => {}
    }
    if !(0.0..=1.0).contains(&request.surprise) || request.surprise.is_nan() {
        return Err(GenerationError::InvalidRequest(format!(
            "surprise must be within [0, 1], got {}",
            request.surprise
        )));
    }
    if let Some(TempoSpec::Range { min_bpm, max_bpm }) = request.tempo {
        if min_bpm > max_bpm {
            return Err(GenerationError::InvalidRequest(format!(
                "tempo range is inverted: {min_bpm}-{max_bpm} BPM"
            )));
        }
    }

    let source_pool = request.source_pool.unwrap_or_default();

    // A recent pool with no recency field at all gets the 30-day window.
    // A supplied count is never overridden.
    let recent_window = match (source_pool, request.recent_window, request.recent_track_count) {
        (SourcePool::Recent, None, None) => Some(RecentWindow::Days30),
        (_, window, _) => window,
    };

    Ok(NormalizedRequest {
        genres: request.genres.clone(),
        moods: normalize_tags(&request.mood, normalize_mood_category),
        activities: normalize_tags(&request.activity, normalize_activity_category),
        tempo: request.tempo,
        length: request.length,
        surprise: request.surprise,
        source_pool,
        recent_window,
        recent_track_count: request.recent_track_count,
        additional_instructions: request.additional_instructions.clone(),
        min_artists: request.min_artists,
        disallowed_artists: request.disallowed_artists.clone(),
        suggested_artists: request.suggested_artists.clone(),
        suggested_albums: request.suggested_albums.clone(),
        suggested_tracks: request.suggested_tracks.clone(),
        min_duration_seconds: None,
        max_duration_seconds: None,
    })
}

impl NormalizedRequest {
    /// Target track count used for position normalization. Minutes-based
    /// requests estimate with a 4-minute average track.
    pub fn target_track_count(&self) -> usize {
        match self.length {
            LengthSpec::Tracks(n) => n as usize,
            LengthSpec::Minutes(m) => ((m as usize * 60) / 240).max(1),
        }
    }
}
