use crate::models::TempoSpec;
use crate::playlist::index::TempoBucket;
use crate::playlist::moods::{normalize_activity_category, normalize_mood_category};
use crate::playlist::request::NormalizedRequest;
use once_cell::sync::Lazy;
use regex::Regex;

/// Stopwords dropped by the tokenizer before n-gram emission.
const STOPWORDS: [&str; 24] = [
    "a", "an", "the", "and", "or", "but", "with", "without", "some", "any", "please", "i", "me",
    "my", "want", "like", "would", "really", "just", "of", "to", "for", "that", "this",
];

static FAST_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:only\s+(?:fast|upbeat|high[\s-]?energy)|(?:fast|upbeat|high[\s-]?energy)\s+(?:songs?|tracks?|music)\s+only|keep\s+it\s+fast|nothing\s+slow)\b",
    )
    .unwrap()
});

static SLOW_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:only\s+(?:slow|mellow|low[\s-]?energy)|(?:slow|mellow|low[\s-]?energy)\s+(?:songs?|tracks?|music)\s+only|keep\s+it\s+slow|nothing\s+fast)\b",
    )
    .unwrap()
});

static VARIETY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:surprise\s+me|mix\s+it\s+up|variety|eclectic|adventurous|something\s+(?:new|different)|discover)\b",
    )
    .unwrap()
});

static PREDICTABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:predictable|no\s+surprises|familiar|safe\s+picks|stick\s+to)\b").unwrap()
});

static SHORT_TRACKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:short(?:er)?\s+(?:songs?|tracks?)|keep\s+(?:it|them)\s+short|quick\s+(?:songs?|tracks?))\b")
        .unwrap()
});

static LONG_TRACKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:long(?:er)?\s+(?:songs?|tracks?)|extended\s+(?:cuts?|songs?|tracks?|mixes)|epic\s+(?:songs?|tracks?))\b")
        .unwrap()
});

/// Strategy-level adjustments parsed out of free-text instructions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrategyHints {
    pub tempo_bucket: Option<TempoBucket>,
    pub surprise_boost: f32,
    pub min_duration_seconds: Option<u32>,
    pub max_duration_seconds: Option<u32>,
}

/// Tokenize free text: lowercase, whitespace split, punctuation stripped,
/// stopwords dropped, unigrams plus adjacent bigrams, deduplicated in order.
pub fn tokenize_instructions(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .to_lowercase()
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .collect();

    let mut tokens: Vec<String> = Vec::new();
    for word in &words {
        if !tokens.contains(word) {
            tokens.push(word.clone());
        }
    }
    for pair in words.windows(2) {
        let bigram = format!("{} {}", pair[0], pair[1]);
        if !tokens.contains(&bigram) {
            tokens.push(bigram);
        }
    }
    tokens
}

/// Extract canonical mood categories from instruction text.
pub fn parse_mood_from_instructions(text: &str) -> Vec<String> {
    let mut moods: Vec<String> = Vec::new();
    for token in tokenize_instructions(text) {
        if let Some(category) = normalize_mood_category(&token) {
            if !moods.iter().any(|m| m == category) {
                moods.push(category.to_string());
            }
        }
    }
    moods
}

/// Extract canonical activity categories from instruction text.
pub fn parse_activity_from_instructions(text: &str) -> Vec<String> {
    let mut activities: Vec<String> = Vec::new();
    for token in tokenize_instructions(text) {
        if let Some(category) = normalize_activity_category(&token) {
            if !activities.iter().any(|a| a == category) {
                activities.push(category.to_string());
            }
        }
    }
    activities
}

/// Extract genre terms from instruction text. Only tokens that match a genre
/// already known to the library are emitted; arbitrary words never become
/// genres.
pub fn parse_genres_from_instructions(text: &str, known_genres: &[String]) -> Vec<String> {
    let mut genres: Vec<String> = Vec::new();
    for token in tokenize_instructions(text) {
        for known in known_genres {
            if known.eq_ignore_ascii_case(&token) && !genres.iter().any(|g| g == known) {
                genres.push(known.clone());
            }
        }
    }
    genres
}

/// Apply the fixed hint rules to instruction text. Never fails; text with no
/// recognized phrasing yields the empty hint set.
pub fn parse_strategy_hints_from_instructions(text: &str) -> StrategyHints {
    let mut hints = StrategyHints::default();

    if FAST_ONLY.is_match(text) {
        hints.tempo_bucket = Some(TempoBucket::Fast);
    } else if SLOW_ONLY.is_match(text) {
        hints.tempo_bucket = Some(TempoBucket::Slow);
    }

    if VARIETY.is_match(text) {
        hints.surprise_boost += 0.2;
    }
    if PREDICTABLE.is_match(text) {
        hints.surprise_boost -= 0.2;
    }

    if SHORT_TRACKS.is_match(text) {
        hints.max_duration_seconds = Some(180);
    }
    if LONG_TRACKS.is_match(text) {
        hints.min_duration_seconds = Some(300);
    }

    hints
}

/// Merge parsed hints into a normalized request. The tempo bucket only wins
/// when the request did not already pin an explicit BPM range; surprise is
/// clamped back into [0, 1] after the boost.
pub fn apply_instruction_hints_to_request(request: &mut NormalizedRequest, hints: &StrategyHints) {
    if let Some(bucket) = hints.tempo_bucket {
        let has_explicit_range = matches!(request.tempo, Some(TempoSpec::Range { .. }));
        if !has_explicit_range {
            request.tempo = Some(TempoSpec::Bucket(bucket));
        }
    }

    if hints.surprise_boost != 0.0 {
        request.surprise = (request.surprise + hints.surprise_boost).clamp(0.0, 1.0);
    }

    if hints.min_duration_seconds.is_some() {
        request.min_duration_seconds = hints.min_duration_seconds;
    }
    if hints.max_duration_seconds.is_some() {
        request.max_duration_seconds = hints.max_duration_seconds;
    }
}

fn union_into(target: &mut Vec<String>, extra: Vec<String>) {
    for term in extra {
        if !target.iter().any(|t| t.eq_ignore_ascii_case(&term)) {
            target.push(term);
        }
    }
}

/// Union instruction-derived mood/activity/genre terms into the request's
/// structured arrays. Only called when generation runs without an externally
/// supplied strategy.
pub fn merge_instructions_into_request(request: &mut NormalizedRequest, known_genres: &[String]) {
    let Some(text) = request.additional_instructions.clone() else {
        return;
    };
    if text.trim().is_empty() {
        return;
    }

    union_into(&mut request.moods, parse_mood_from_instructions(&text));
    union_into(
        &mut request.activities,
        parse_activity_from_instructions(&text),
    );
    union_into(
        &mut request.genres,
        parse_genres_from_instructions(&text, known_genres),
    );
}
