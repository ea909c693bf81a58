use serde::{Deserialize, Serialize};

/// A track record as produced by the upstream library scanner.
/// The engine treats these as read-only input for the duration of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(default)]
    pub genres: Vec<String>, // Raw genre strings, possibly comma-joined ("Rock, Pop")
    pub year: Option<u32>,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: Option<u32>,
    pub bpm: Option<u32>,
    #[serde(rename = "addedAt")]
    pub added_at: Option<i64>, // epoch ms
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<i64>, // epoch ms
    #[serde(rename = "enhancedMetadata")]
    pub enhanced: Option<EnhancedMetadata>,
}

/// Optional enrichment produced by an upstream tagging pass.
/// When the genre override is present it replaces the raw genre list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnhancedMetadata {
    #[serde(default)]
    pub moods: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl Track {
    /// Get the effective raw genre strings for this track: the enhanced
    /// override when present, otherwise the scanner-provided list.
    pub fn effective_genres(&self) -> &[String] {
        if let Some(enhanced) = &self.enhanced {
            if !enhanced.genres.is_empty() {
                return &enhanced.genres;
            }
        }
        &self.genres
    }

    /// Timestamp used for recency ordering: addedAt preferred, with a
    /// fallback to updatedAt so older records without the newer field
    /// degrade gracefully instead of being excluded.
    pub fn recency_timestamp(&self) -> Option<i64> {
        self.added_at.or(self.updated_at)
    }

    pub fn mood_tags(&self) -> &[String] {
        self.enhanced.as_ref().map(|e| e.moods.as_slice()).unwrap_or(&[])
    }

    pub fn activity_tags(&self) -> &[String] {
        self.enhanced.as_ref().map(|e| e.activities.as_slice()).unwrap_or(&[])
    }
}

impl Default for Track {
    fn default() -> Self {
        Track {
            id: String::new(),
            title: "Unknown".to_string(),
            artist: "Unknown".to_string(),
            album: "Unknown".to_string(),
            genres: Vec::new(),
            year: None,
            duration_seconds: None,
            bpm: None,
            added_at: None,
            updated_at: None,
            enhanced: None,
        }
    }
}

/// How the requested playlist length is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum LengthSpec {
    Minutes(u32),
    Tracks(u32),
}

/// Requested tempo: either a named bucket or an explicit BPM range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TempoSpec {
    Bucket(crate::playlist::index::TempoBucket),
    Range {
        #[serde(rename = "minBpm")]
        min_bpm: u32,
        #[serde(rename = "maxBpm")]
        max_bpm: u32,
    },
}

/// Which slice of the library feeds the candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcePool {
    #[default]
    All,
    Recent,
}

/// Recency window for the recent-pool filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecentWindow {
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "90d")]
    Days90,
}

impl RecentWindow {
    pub fn days(&self) -> i64 {
        match self {
            RecentWindow::Days7 => 7,
            RecentWindow::Days30 => 30,
            RecentWindow::Days90 => 90,
        }
    }
}

/// A playlist generation request as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistRequest {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub mood: Vec<String>,
    #[serde(default)]
    pub activity: Vec<String>,
    pub tempo: Option<TempoSpec>,
    pub length: LengthSpec,
    #[serde(default)]
    pub surprise: f32,
    #[serde(rename = "sourcePool")]
    pub source_pool: Option<SourcePool>,
    #[serde(rename = "recentWindow")]
    pub recent_window: Option<RecentWindow>,
    #[serde(rename = "recentTrackCount")]
    pub recent_track_count: Option<usize>,
    #[serde(rename = "llmAdditionalInstructions")]
    pub additional_instructions: Option<String>,
    #[serde(rename = "minArtists")]
    pub min_artists: Option<usize>,
    #[serde(rename = "disallowedArtists", default)]
    pub disallowed_artists: Vec<String>,
    #[serde(rename = "suggestedArtists", default)]
    pub suggested_artists: Vec<String>,
    #[serde(rename = "suggestedAlbums", default)]
    pub suggested_albums: Vec<String>,
    #[serde(rename = "suggestedTracks", default)]
    pub suggested_tracks: Vec<String>,
}

impl Default for PlaylistRequest {
    fn default() -> Self {
        PlaylistRequest {
            genres: Vec::new(),
            mood: Vec::new(),
            activity: Vec::new(),
            tempo: None,
            length: LengthSpec::Tracks(20),
            surprise: 0.0,
            source_pool: None,
            recent_window: None,
            recent_track_count: None,
            additional_instructions: None,
            min_artists: None,
            disallowed_artists: Vec::new(),
            suggested_artists: Vec::new(),
            suggested_albums: Vec::new(),
            suggested_tracks: Vec::new(),
        }
    }
}
