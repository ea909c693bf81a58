use crate::models::{RecentWindow, SourcePool, Track};
use crate::playlist::request::NormalizedRequest;
use chrono::{DateTime, Utc};

/// Candidate-pool filtering, applied before the index is built.
/// All filters are fail-open on missing metadata except recency, where a
/// track without any timestamp cannot prove it is recent.
pub struct PoolFilters;

impl PoolFilters {
    /// Restrict the pool to recently-added tracks when requested. With a
    /// positive count: newest N by addedAt (updatedAt fallback). Otherwise:
    /// everything on or after the window cutoff. `now` is injected so tests
    /// can pin the clock.
    pub fn apply_recent_filter(
        tracks: Vec<Track>,
        request: &NormalizedRequest,
        now: DateTime<Utc>,
    ) -> Vec<Track> {
        if request.source_pool != SourcePool::Recent {
            return tracks;
        }

        if let Some(count) = request.recent_track_count {
            if count > 0 {
                let mut sorted = tracks;
                sorted.sort_by(|a, b| {
                    b.recency_timestamp()
                        .unwrap_or(i64::MIN)
                        .cmp(&a.recency_timestamp().unwrap_or(i64::MIN))
                        .then_with(|| a.id.cmp(&b.id))
                });
                sorted.truncate(count);
                return sorted;
            }
        }

        let window = request.recent_window.unwrap_or(RecentWindow::Days30);
        let cutoff_ms = now.timestamp_millis() - window.days() * 24 * 60 * 60 * 1000;

        tracks
            .into_iter()
            .filter(|track| track.recency_timestamp().is_some_and(|ts| ts >= cutoff_ms))
            .collect()
    }

    /// Drop tracks by any disallowed artist, case-insensitively.
    pub fn apply_artist_exclusions(tracks: Vec<Track>, disallowed: &[String]) -> Vec<Track> {
        if disallowed.is_empty() {
            return tracks;
        }
        tracks
            .into_iter()
            .filter(|track| {
                !disallowed
                    .iter()
                    .any(|artist| artist.eq_ignore_ascii_case(&track.artist))
            })
            .collect()
    }

    /// Apply instruction-derived duration bounds. Tracks with no duration
    /// metadata pass.
    pub fn apply_duration_bounds(
        tracks: Vec<Track>,
        min_seconds: Option<u32>,
        max_seconds: Option<u32>,
    ) -> Vec<Track> {
        if min_seconds.is_none() && max_seconds.is_none() {
            return tracks;
        }
        tracks
            .into_iter()
            .filter(|track| {
                let Some(duration) = track.duration_seconds else {
                    return true;
                };
                min_seconds.is_none_or(|min| duration >= min)
                    && max_seconds.is_none_or(|max| duration <= max)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaylistRequest;
    use crate::playlist::request::normalize_playlist_request;
    use chrono::TimeZone;

    fn track_added(id: &str, added_at: Option<i64>, updated_at: Option<i64>) -> Track {
        Track {
            id: id.to_string(),
            added_at,
            updated_at,
            ..Track::default()
        }
    }

    fn recent_request(
        window: Option<RecentWindow>,
        count: Option<usize>,
    ) -> NormalizedRequest {
        normalize_playlist_request(&PlaylistRequest {
            source_pool: Some(SourcePool::Recent),
            recent_window: window,
            recent_track_count: count,
            ..PlaylistRequest::default()
        })
        .unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_window_filter_keeps_exactly_recent_tracks() {
        let now = fixed_now();
        let day_ms = 24 * 60 * 60 * 1000;
        let mut tracks = Vec::new();
        // 40 tracks inside the last 7 days, 60 older.
        for i in 0..40 {
            tracks.push(track_added(
                &format!("recent-{i}"),
                Some(now.timestamp_millis() - 3 * day_ms),
                None,
            ));
        }
        for i in 0..60 {
            tracks.push(track_added(
                &format!("old-{i}"),
                Some(now.timestamp_millis() - 20 * day_ms),
                None,
            ));
        }

        let request = recent_request(Some(RecentWindow::Days7), None);
        let filtered = PoolFilters::apply_recent_filter(tracks, &request, now);
        assert_eq!(filtered.len(), 40);
    }

    #[test]
    fn test_updated_at_fallback() {
        let now = fixed_now();
        let hour_ms = 60 * 60 * 1000;
        let tracks = vec![
            track_added("has-added", Some(now.timestamp_millis() - hour_ms), None),
            track_added("only-updated", None, Some(now.timestamp_millis() - hour_ms)),
            track_added("no-timestamps", None, None),
        ];
        let request = recent_request(Some(RecentWindow::Days7), None);
        let filtered = PoolFilters::apply_recent_filter(tracks, &request, now);
        let ids: Vec<&str> = filtered.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["has-added", "only-updated"]);
    }

    #[test]
    fn test_count_takes_newest_n() {
        let now = fixed_now();
        let tracks = vec![
            track_added("oldest", Some(1_000), None),
            track_added("newest", Some(3_000), None),
            track_added("middle", Some(2_000), None),
        ];
        let request = recent_request(None, Some(2));
        let filtered = PoolFilters::apply_recent_filter(tracks, &request, now);
        let ids: Vec<&str> = filtered.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "middle"]);
    }

    #[test]
    fn test_all_pool_is_a_noop() {
        let request = normalize_playlist_request(&PlaylistRequest::default()).unwrap();
        let tracks = vec![track_added("1", None, None)];
        let filtered = PoolFilters::apply_recent_filter(tracks, &request, fixed_now());
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_artist_exclusions_are_case_insensitive() {
        let mut allowed = Track::default();
        allowed.id = "keep".to_string();
        allowed.artist = "Kept Artist".to_string();
        let mut banned = Track::default();
        banned.id = "drop".to_string();
        banned.artist = "Banned Artist".to_string();

        let filtered = PoolFilters::apply_artist_exclusions(
            vec![allowed, banned],
            &["banned artist".to_string()],
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "keep");
    }

    #[test]
    fn test_duration_bounds_pass_unknown_durations() {
        let mut short = Track::default();
        short.id = "short".to_string();
        short.duration_seconds = Some(120);
        let mut long = Track::default();
        long.id = "long".to_string();
        long.duration_seconds = Some(400);
        let mut unknown = Track::default();
        unknown.id = "unknown".to_string();

        let filtered =
            PoolFilters::apply_duration_bounds(vec![short, long, unknown], Some(300), None);
        let ids: Vec<&str> = filtered.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["long", "unknown"]);
    }
}
