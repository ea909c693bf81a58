use crate::models::Track;
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

/// Words kept lowercase by the title-casing rules unless they lead the genre.
const SMALL_WORDS: [&str; 8] = ["of", "the", "in", "a", "an", "and", "or", "for"];

/// Fixed genre synonym table. Keys are lookup keys (lowercased, with
/// dash/underscore/slash variants folded to spaces); values are canonical
/// genre spellings. Kept as data so new synonyms never touch control flow.
static GENRE_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("hip hop", "Hip Hop"),
        ("hiphop", "Hip Hop"),
        ("rap", "Hip Hop"),
        ("drum and bass", "Drum & Bass"),
        ("drum & bass", "Drum & Bass"),
        ("dnb", "Drum & Bass"),
        ("d&b", "Drum & Bass"),
        ("r&b", "R&B"),
        ("rnb", "R&B"),
        ("rhythm and blues", "R&B"),
        ("rhythm & blues", "R&B"),
        ("lo fi", "Lo-Fi"),
        ("lofi", "Lo-Fi"),
        ("edm", "EDM"),
        ("electronic dance", "EDM"),
        ("idm", "IDM"),
        ("rock and roll", "Rock & Roll"),
        ("rock & roll", "Rock & Roll"),
        ("rocknroll", "Rock & Roll"),
        ("alt rock", "Alternative Rock"),
        ("alternative", "Alternative Rock"),
        ("prog rock", "Progressive Rock"),
        ("psych rock", "Psychedelic Rock"),
        ("synthpop", "Synth Pop"),
        ("synth pop", "Synth Pop"),
        ("electropop", "Electro Pop"),
        ("neo soul", "Neo-Soul"),
        ("nu metal", "Nu Metal"),
        ("post rock", "Post-Rock"),
        ("post punk", "Post-Punk"),
        ("trip hop", "Trip Hop"),
        ("world", "World Music"),
        ("easy listening", "Easy Listening"),
        ("singer songwriter", "Singer-Songwriter"),
        ("soundtrack", "Soundtrack"),
        ("ost", "Soundtrack"),
        ("classical music", "Classical"),
        ("electronica", "Electronic"),
    ])
});

/// Lowercase lookup key with dash/underscore/slash variants folded to spaces
/// and runs of whitespace collapsed. Ampersands are kept so "&"-canonical
/// genres round-trip.
fn lookup_key(value: &str) -> String {
    let folded: String = value
        .chars()
        .map(|c| match c {
            '-' | '_' | '/' => ' ',
            other => other,
        })
        .collect();
    folded
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip a trailing "Music"/"Genre"/"Style" qualifier ("Electronic Music" is
/// the same genre as "Electronic").
fn strip_genre_suffix(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    for suffix in ["music", "genre", "style"] {
        if chars.len() <= suffix.len() + 1 {
            continue;
        }
        let tail: String = chars[chars.len() - suffix.len()..].iter().collect();
        if tail.to_lowercase() == suffix {
            let head: String = chars[..chars.len() - suffix.len()].iter().collect();
            if head.ends_with(' ') || head.ends_with('-') {
                return head.trim_end_matches([' ', '-']).to_string();
            }
        }
    }
    value.to_string()
}

fn is_acronym(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

/// Title-case a genre, preserving all-caps acronyms and keeping small words
/// lowercase unless they come first.
fn title_case_genre(value: &str) -> String {
    value
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            if is_acronym(word) {
                word.to_string()
            } else if i > 0 && SMALL_WORDS.contains(&word.to_lowercase().as_str()) {
                word.to_lowercase()
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonicalize a single free-text genre string. Deterministic, pure and
/// idempotent: feeding the output back in returns it unchanged.
pub fn normalize_genre(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let stripped = strip_genre_suffix(trimmed);
    let key = lookup_key(&stripped);
    if key.is_empty() {
        return String::new();
    }

    if let Some(canonical) = GENRE_SYNONYMS.get(key.as_str()) {
        return (*canonical).to_string();
    }

    // Title-case over the punctuation-folded original so acronym casing
    // survives the fallback path.
    let folded: String = stripped
        .chars()
        .map(|c| match c {
            '-' | '_' | '/' => ' ',
            other => other,
        })
        .collect();
    title_case_genre(&folded)
}

/// Split a possibly comma-joined genre tag into independent entries before
/// normalization, so "Rock, Pop" is two genres rather than one.
pub fn split_genre_string(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Bidirectional raw↔canonical genre mappings plus per-genre track counts,
/// built once per candidate pool.
#[derive(Debug, Default, Clone)]
pub struct NormalizedGenreMapping {
    pub original_to_normalized: HashMap<String, String>,
    pub normalized_to_originals: HashMap<String, BTreeSet<String>>,
    pub normalized_to_track_count: HashMap<String, usize>,
}

impl NormalizedGenreMapping {
    /// Resolve a freshly normalized genre against the canonicals already
    /// registered: exact case-insensitive match first, then substring
    /// containment (shorter side at least 4 chars), preferring the longest
    /// existing candidate. Prevents near-duplicates like "Folk Rock" and
    /// "Folk-Rock" from being tracked separately within one run.
    fn resolve_canonical(&self, normalized: &str) -> String {
        let lower = normalized.to_lowercase();

        for known in self.normalized_to_originals.keys() {
            if known.to_lowercase() == lower {
                return known.clone();
            }
        }

        // Tie-break on (length desc, name asc) so the winner does not depend
        // on map iteration order.
        let mut best: Option<&String> = None;
        for known in self.normalized_to_originals.keys() {
            let known_lower = known.to_lowercase();
            let (short, long) = if known_lower.len() <= lower.len() {
                (&known_lower, &lower)
            } else {
                (&lower, &known_lower)
            };
            if short.len() >= 4 && long.contains(short.as_str()) {
                let better = best.is_none_or(|b| {
                    known.len() > b.len() || (known.len() == b.len() && known < b)
                });
                if better {
                    best = Some(known);
                }
            }
        }

        best.cloned().unwrap_or_else(|| normalized.to_string())
    }

    fn register(&mut self, original: &str, canonical: &str) {
        self.original_to_normalized
            .insert(original.to_string(), canonical.to_string());
        self.normalized_to_originals
            .entry(canonical.to_string())
            .or_default()
            .insert(original.to_string());
    }

    /// Canonical form of a raw genre within this mapping, normalizing on the
    /// fly when the string was never seen during the build fold.
    pub fn canonical_for(&self, raw: &str) -> Option<String> {
        if let Some(known) = self.original_to_normalized.get(raw.trim()) {
            return Some(known.clone());
        }
        let normalized = normalize_genre(raw);
        if normalized.is_empty() {
            return None;
        }
        Some(self.resolve_canonical(&normalized))
    }

    pub fn track_count(&self, canonical: &str) -> usize {
        self.normalized_to_track_count
            .get(canonical)
            .copied()
            .unwrap_or(0)
    }

    /// Canonical genres of one track, deduplicated, after comma-splitting
    /// and normalization.
    pub fn track_genres(&self, track: &Track) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for raw in track.effective_genres() {
            for part in split_genre_string(raw) {
                if let Some(canonical) = self.canonical_for(&part) {
                    out.insert(canonical);
                }
            }
        }
        out
    }
}

/// Fold every track's raw genre strings into a normalized mapping.
/// Each canonical genre counts a track at most once.
pub fn build_genre_mappings(tracks: &[Track]) -> NormalizedGenreMapping {
    let mut mapping = NormalizedGenreMapping::default();

    for track in tracks {
        let mut seen_this_track: BTreeSet<String> = BTreeSet::new();

        for raw in track.effective_genres() {
            for part in split_genre_string(raw) {
                let canonical = match mapping.original_to_normalized.get(&part) {
                    Some(known) => known.clone(),
                    None => {
                        let normalized = normalize_genre(&part);
                        if normalized.is_empty() {
                            continue;
                        }
                        let canonical = mapping.resolve_canonical(&normalized);
                        mapping.register(&part, &canonical);
                        canonical
                    }
                };
                seen_this_track.insert(canonical);
            }
        }

        for canonical in seen_this_track {
            *mapping
                .normalized_to_track_count
                .entry(canonical)
                .or_insert(0) += 1;
        }
    }

    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with_genres(id: &str, genres: &[&str]) -> Track {
        Track {
            id: id.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            ..Track::default()
        }
    }

    #[test]
    fn test_synonym_lookup() {
        assert_eq!(normalize_genre("hip-hop"), "Hip Hop");
        assert_eq!(normalize_genre("Drum and Bass"), "Drum & Bass");
        assert_eq!(normalize_genre("rnb"), "R&B");
        assert_eq!(normalize_genre("LoFi"), "Lo-Fi");
    }

    #[test]
    fn test_title_case_fallback() {
        assert_eq!(normalize_genre("indie rock"), "Indie Rock");
        assert_eq!(normalize_genre("best of the best"), "Best of the Best");
        assert_eq!(normalize_genre("UK garage"), "UK Garage");
    }

    #[test]
    fn test_suffix_stripping() {
        assert_eq!(normalize_genre("Electronic Music"), "Electronic");
        assert_eq!(normalize_genre("ambient style"), "Ambient");
        // "Music" alone is not a suffix to strip
        assert_eq!(normalize_genre("Music"), "Music");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "hip-hop",
            "Drum and Bass",
            "indie rock",
            "EDM",
            "Electronic Music",
            "synth-pop",
            "r&b",
            "best of the best",
            "  Jazz  ",
        ];
        for input in inputs {
            let once = normalize_genre(input);
            assert_eq!(normalize_genre(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_split_genre_string() {
        assert_eq!(split_genre_string("Rock, Pop"), vec!["Rock", "Pop"]);
        assert_eq!(split_genre_string("Jazz"), vec!["Jazz"]);
        assert_eq!(split_genre_string(" , ,Folk ,"), vec!["Folk"]);
    }

    #[test]
    fn test_comma_joined_genres_count_independently() {
        let tracks = vec![track_with_genres("1", &["Rock, Pop"])];
        let mapping = build_genre_mappings(&tracks);

        assert!(mapping.normalized_to_originals.contains_key("Rock"));
        assert!(mapping.normalized_to_originals.contains_key("Pop"));
        assert!(!mapping.normalized_to_originals.contains_key("Rock, Pop"));
        assert_eq!(mapping.track_count("Rock"), 1);
        assert_eq!(mapping.track_count("Pop"), 1);
    }

    #[test]
    fn test_near_duplicate_canonicals_merge() {
        let tracks = vec![
            track_with_genres("1", &["folk rock"]),
            track_with_genres("2", &["Folk-Rock"]),
        ];
        let mapping = build_genre_mappings(&tracks);

        assert_eq!(mapping.normalized_to_track_count.len(), 1);
        assert_eq!(mapping.track_count("Folk Rock"), 2);
        let originals = mapping.normalized_to_originals.get("Folk Rock").unwrap();
        assert_eq!(originals.len(), 2);
    }

    #[test]
    fn test_containment_merge_prefers_existing_canonical() {
        let tracks = vec![
            track_with_genres("1", &["Alternative Rock"]),
            track_with_genres("2", &["alternative rock music"]),
        ];
        let mapping = build_genre_mappings(&tracks);
        assert_eq!(mapping.track_count("Alternative Rock"), 2);
    }

    #[test]
    fn test_canonical_assignment_is_stable_across_rebuilds() {
        // "Punk Rock" and "Folk Rock" both contain "Rock"; the containment
        // merge must pick the same winner on every rebuild, not whichever
        // candidate map iteration yields first.
        let tracks = vec![
            track_with_genres("1", &["Punk Rock"]),
            track_with_genres("2", &["Folk Rock"]),
            track_with_genres("3", &["Rock"]),
        ];
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for _ in 0..40 {
            let mapping = build_genre_mappings(&tracks);
            seen.insert(mapping.canonical_for("Rock").unwrap());
        }
        assert_eq!(seen.len(), 1, "canonical for \"Rock\" varies: {seen:?}");
    }

    #[test]
    fn test_track_counts_dedup_within_track() {
        // Same canonical genre twice on one track counts once.
        let tracks = vec![track_with_genres("1", &["hip-hop", "Hip Hop"])];
        let mapping = build_genre_mappings(&tracks);
        assert_eq!(mapping.track_count("Hip Hop"), 1);
    }
}
