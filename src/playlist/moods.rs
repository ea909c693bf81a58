use crate::playlist::index::TempoBucket;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Canonical mood categories. Free-text tags and request input both fold
/// into this closed set.
pub const MOOD_CATEGORIES: [&str; 7] = [
    "Calm",
    "Energetic",
    "Happy",
    "Sad",
    "Romantic",
    "Uplifting",
    "Dark",
];

/// Canonical activity categories.
pub const ACTIVITY_CATEGORIES: [&str; 7] = [
    "Workout",
    "Focus",
    "Relax",
    "Party",
    "Sleep",
    "Commute",
    "Chores",
];

/// Mood synonym table, tag token → canonical category.
static MOOD_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("calm", "Calm"),
        ("chill", "Calm"),
        ("chilled", "Calm"),
        ("relaxed", "Calm"),
        ("mellow", "Calm"),
        ("peaceful", "Calm"),
        ("dreamy", "Calm"),
        ("soothing", "Calm"),
        ("energetic", "Energetic"),
        ("upbeat", "Energetic"),
        ("hype", "Energetic"),
        ("pumped", "Energetic"),
        ("intense", "Energetic"),
        ("driving", "Energetic"),
        ("happy", "Happy"),
        ("joyful", "Happy"),
        ("cheerful", "Happy"),
        ("sunny", "Happy"),
        ("fun", "Happy"),
        ("sad", "Sad"),
        ("melancholic", "Sad"),
        ("melancholy", "Sad"),
        ("blue", "Sad"),
        ("gloomy", "Sad"),
        ("moody", "Sad"),
        ("wistful", "Sad"),
        ("romantic", "Romantic"),
        ("love", "Romantic"),
        ("sensual", "Romantic"),
        ("intimate", "Romantic"),
        ("uplifting", "Uplifting"),
        ("hopeful", "Uplifting"),
        ("inspiring", "Uplifting"),
        ("positive", "Uplifting"),
        ("euphoric", "Uplifting"),
        ("dark", "Dark"),
        ("brooding", "Dark"),
        ("sinister", "Dark"),
        ("ominous", "Dark"),
        ("haunting", "Dark"),
    ])
});

/// Activity synonym table, tag token → canonical category.
static ACTIVITY_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("workout", "Workout"),
        ("gym", "Workout"),
        ("running", "Workout"),
        ("jogging", "Workout"),
        ("cycling", "Workout"),
        ("exercise", "Workout"),
        ("training", "Workout"),
        ("focus", "Focus"),
        ("study", "Focus"),
        ("studying", "Focus"),
        ("work", "Focus"),
        ("coding", "Focus"),
        ("reading", "Focus"),
        ("gaming", "Focus"),
        ("relax", "Relax"),
        ("relaxing", "Relax"),
        ("yoga", "Relax"),
        ("unwind", "Relax"),
        ("lounging", "Relax"),
        ("party", "Party"),
        ("dancing", "Party"),
        ("dance", "Party"),
        ("celebration", "Party"),
        ("sleep", "Sleep"),
        ("sleeping", "Sleep"),
        ("bedtime", "Sleep"),
        ("meditation", "Sleep"),
        ("nap", "Sleep"),
        ("commute", "Commute"),
        ("driving", "Commute"),
        ("travel", "Commute"),
        ("roadtrip", "Commute"),
        ("walking", "Commute"),
        ("chores", "Chores"),
        ("cleaning", "Chores"),
        ("cooking", "Chores"),
        ("housework", "Chores"),
    ])
});

/// Canonical genre → implied mood, used by the mood scorer's fallback chain
/// when a track carries no explicit mood tags.
static GENRE_IMPLIED_MOODS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Ambient", "Calm"),
        ("Chillout", "Calm"),
        ("Downtempo", "Calm"),
        ("Classical", "Calm"),
        ("Lo-Fi", "Calm"),
        ("New Age", "Calm"),
        ("Jazz", "Calm"),
        ("Metal", "Energetic"),
        ("Punk", "Energetic"),
        ("Hardcore", "Energetic"),
        ("EDM", "Energetic"),
        ("Drum & Bass", "Energetic"),
        ("Techno", "Energetic"),
        ("Pop", "Happy"),
        ("Disco", "Happy"),
        ("Funk", "Happy"),
        ("Blues", "Sad"),
        ("Soul", "Romantic"),
        ("R&B", "Romantic"),
        ("Gospel", "Uplifting"),
        ("Industrial", "Dark"),
        ("Doom Metal", "Dark"),
        ("Darkwave", "Dark"),
    ])
});

/// Map a single free-text mood token to its canonical category, if known.
pub fn normalize_mood_category(token: &str) -> Option<&'static str> {
    MOOD_SYNONYMS
        .get(token.trim().to_lowercase().as_str())
        .copied()
}

/// Map a single free-text activity token to its canonical category, if known.
pub fn normalize_activity_category(token: &str) -> Option<&'static str> {
    ACTIVITY_SYNONYMS
        .get(token.trim().to_lowercase().as_str())
        .copied()
}

/// Apply the mood lookup across a free-text tag list, deduplicated, in
/// first-seen order.
pub fn map_mood_tags_to_categories(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if let Some(category) = normalize_mood_category(tag) {
            if !out.iter().any(|c| c == category) {
                out.push(category.to_string());
            }
        }
    }
    out
}

/// Apply the activity lookup across a free-text tag list, deduplicated.
pub fn map_activity_tags_to_categories(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if let Some(category) = normalize_activity_category(tag) {
            if !out.iter().any(|c| c == category) {
                out.push(category.to_string());
            }
        }
    }
    out
}

/// Mood implied by a canonical genre, for scoring fallback.
pub fn mood_implied_by_genre(canonical_genre: &str) -> Option<&'static str> {
    GENRE_IMPLIED_MOODS.get(canonical_genre).copied()
}

/// Mood implied by a tempo bucket, the last rung of the mood fallback chain.
pub fn mood_implied_by_tempo(bucket: TempoBucket) -> Option<&'static str> {
    match bucket {
        TempoBucket::Slow => Some("Calm"),
        TempoBucket::Fast => Some("Energetic"),
        TempoBucket::Medium | TempoBucket::Unknown => None,
    }
}

/// Activity implied by BPM when explicit tags are absent.
pub fn activity_implied_by_bpm(bpm: u32) -> Option<&'static str> {
    if bpm >= 140 {
        Some("Workout")
    } else if bpm >= 118 {
        Some("Party")
    } else if bpm <= 70 {
        Some("Sleep")
    } else {
        None
    }
}

/// Activity implied by track duration, the last rung of the activity chain.
/// Long tracks suit sustained-attention listening; very short ones do not
/// carry a usable signal.
pub fn activity_implied_by_duration(duration_seconds: u32) -> Option<&'static str> {
    if duration_seconds >= 420 {
        Some("Focus")
    } else {
        None
    }
}
