use crate::models::Track;
use crate::playlist::genres::{NormalizedGenreMapping, build_genre_mappings};
use crate::playlist::moods::{map_activity_tags_to_categories, map_mood_tags_to_categories};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Coarse tempo classification derived from an upstream-provided BPM field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempoBucket {
    Slow,
    Medium,
    Fast,
    Unknown,
}

impl TempoBucket {
    pub fn from_bpm(bpm: Option<u32>) -> Self {
        match bpm {
            None => TempoBucket::Unknown,
            Some(b) if b < 95 => TempoBucket::Slow,
            Some(b) if b <= 135 => TempoBucket::Medium,
            Some(_) => TempoBucket::Fast,
        }
    }

    /// Buckets one step apart on the slow/medium/fast axis.
    pub fn is_adjacent(self, other: TempoBucket) -> bool {
        matches!(
            (self, other),
            (TempoBucket::Slow, TempoBucket::Medium)
                | (TempoBucket::Medium, TempoBucket::Slow)
                | (TempoBucket::Medium, TempoBucket::Fast)
                | (TempoBucket::Fast, TempoBucket::Medium)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            TempoBucket::Slow => "slow",
            TempoBucket::Medium => "medium",
            TempoBucket::Fast => "fast",
            TempoBucket::Unknown => "unknown",
        }
    }
}

/// Coarse duration classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationBucket {
    Short,
    Medium,
    Long,
    Unknown,
}

impl DurationBucket {
    pub fn from_seconds(duration: Option<u32>) -> Self {
        match duration {
            None => DurationBucket::Unknown,
            Some(d) if d < 180 => DurationBucket::Short,
            Some(d) if d <= 300 => DurationBucket::Medium,
            Some(_) => DurationBucket::Long,
        }
    }
}

/// Per-track metadata computed once at index build time so scoring never
/// re-derives it per candidate. This table is also the per-request home of
/// the mood/activity mappings: it is rebuilt with the index and nothing
/// outlives the request.
#[derive(Debug, Clone)]
pub struct TrackFacts {
    pub genres: Vec<String>,
    pub normalized_genres: BTreeSet<String>,
    pub artist: String,
    pub album: String,
    pub year: Option<u32>,
    pub bpm: Option<u32>,
    pub duration_seconds: Option<u32>,
    pub tempo_bucket: TempoBucket,
    pub duration_bucket: DurationBucket,
    pub moods: Vec<String>,
    pub activities: Vec<String>,
}

/// In-memory multi-map structure built once per generation request from the
/// candidate pool. Read-only for the lifetime of the request; rebuilt, never
/// mutated incrementally.
#[derive(Debug, Default)]
pub struct MatchingIndex {
    pub by_genre: HashMap<String, HashSet<String>>,
    pub by_artist: HashMap<String, HashSet<String>>,
    pub by_tempo_bucket: HashMap<TempoBucket, HashSet<String>>,
    pub by_duration_bucket: HashMap<DurationBucket, HashSet<String>>,
    pub all_track_ids: HashSet<String>,
    track_facts: HashMap<String, TrackFacts>,
    pub genre_mappings: NormalizedGenreMapping,
}

impl MatchingIndex {
    /// Single pass over the pool: genre mappings first, then per-track facts
    /// and the inverted maps derived from them.
    pub fn build(tracks: &[Track]) -> Self {
        let genre_mappings = build_genre_mappings(tracks);
        let mut index = MatchingIndex {
            genre_mappings,
            ..MatchingIndex::default()
        };

        for track in tracks {
            let normalized_genres = index.genre_mappings.track_genres(track);
            let tempo_bucket = TempoBucket::from_bpm(track.bpm);
            let duration_bucket = DurationBucket::from_seconds(track.duration_seconds);

            let facts = TrackFacts {
                genres: track.effective_genres().to_vec(),
                normalized_genres: normalized_genres.clone(),
                artist: track.artist.clone(),
                album: track.album.clone(),
                year: track.year,
                bpm: track.bpm,
                duration_seconds: track.duration_seconds,
                tempo_bucket,
                duration_bucket,
                moods: map_mood_tags_to_categories(track.mood_tags()),
                activities: map_activity_tags_to_categories(track.activity_tags()),
            };

            for genre in &normalized_genres {
                index
                    .by_genre
                    .entry(genre.clone())
                    .or_default()
                    .insert(track.id.clone());
            }
            index
                .by_artist
                .entry(track.artist.clone())
                .or_default()
                .insert(track.id.clone());
            index
                .by_tempo_bucket
                .entry(tempo_bucket)
                .or_default()
                .insert(track.id.clone());
            index
                .by_duration_bucket
                .entry(duration_bucket)
                .or_default()
                .insert(track.id.clone());

            index.all_track_ids.insert(track.id.clone());
            index.track_facts.insert(track.id.clone(), facts);
        }

        log::debug!(
            "built matching index: {} tracks, {} genres, {} artists",
            index.all_track_ids.len(),
            index.by_genre.len(),
            index.by_artist.len()
        );

        index
    }

    pub fn facts(&self, track_id: &str) -> Option<&TrackFacts> {
        self.track_facts.get(track_id)
    }

    /// Canonical genres present in this pool, sorted.
    pub fn library_genres(&self) -> Vec<String> {
        let mut genres: Vec<String> = self.by_genre.keys().cloned().collect();
        genres.sort();
        genres
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnhancedMetadata;

    fn track(id: &str, artist: &str, genres: &[&str], bpm: Option<u32>) -> Track {
        Track {
            id: id.to_string(),
            artist: artist.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            bpm,
            ..Track::default()
        }
    }

    #[test]
    fn test_tempo_buckets() {
        assert_eq!(TempoBucket::from_bpm(Some(80)), TempoBucket::Slow);
        assert_eq!(TempoBucket::from_bpm(Some(95)), TempoBucket::Medium);
        assert_eq!(TempoBucket::from_bpm(Some(135)), TempoBucket::Medium);
        assert_eq!(TempoBucket::from_bpm(Some(160)), TempoBucket::Fast);
        assert_eq!(TempoBucket::from_bpm(None), TempoBucket::Unknown);
        assert!(TempoBucket::Slow.is_adjacent(TempoBucket::Medium));
        assert!(!TempoBucket::Slow.is_adjacent(TempoBucket::Fast));
    }

    #[test]
    fn test_index_consistency() {
        let tracks = vec![
            track("1", "Artist A", &["Rock, Pop"], Some(120)),
            track("2", "Artist B", &["rock"], Some(80)),
            track("3", "Artist A", &[], None),
        ];
        let index = MatchingIndex::build(&tracks);

        assert_eq!(index.all_track_ids.len(), 3);
        // Every indexed track has exactly one facts entry.
        for id in &index.all_track_ids {
            assert!(index.facts(id).is_some());
        }
        // Inverted maps agree with the facts table.
        for (genre, ids) in &index.by_genre {
            for id in ids {
                assert!(index.facts(id).unwrap().normalized_genres.contains(genre));
            }
        }

        assert!(index.by_genre["Rock"].contains("1"));
        assert!(index.by_genre["Rock"].contains("2"));
        assert!(index.by_genre["Pop"].contains("1"));
        assert_eq!(index.by_artist["Artist A"].len(), 2);
        assert!(index.by_tempo_bucket[&TempoBucket::Unknown].contains("3"));
    }

    #[test]
    fn test_enhanced_tags_flow_into_facts() {
        let mut t = track("1", "A", &["Ambient"], None);
        t.enhanced = Some(EnhancedMetadata {
            moods: vec!["dreamy".to_string(), "weird".to_string()],
            activities: vec!["yoga".to_string()],
            genres: Vec::new(),
        });
        let index = MatchingIndex::build(&[t]);
        let facts = index.facts("1").unwrap();
        assert_eq!(facts.moods, vec!["Calm"]);
        assert_eq!(facts.activities, vec!["Relax"]);
    }
}
