use crate::models::Track;
use crate::playlist::genres::NormalizedGenreMapping;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Static taxonomy fallback: common genres mapped to siblings/subgenres,
/// used when library co-occurrence alone cannot fill a suggestion list.
static GENRE_TAXONOMY: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        (
            "Rock",
            &["Alternative Rock", "Indie Rock", "Hard Rock", "Classic Rock"][..],
        ),
        ("Pop", &["Synth Pop", "Indie Pop", "Electro Pop", "Dance"][..]),
        ("Electronic", &["House", "Techno", "Ambient", "EDM"][..]),
        ("Hip Hop", &["Trip Hop", "R&B", "Funk"][..]),
        ("Jazz", &["Blues", "Soul", "Funk", "Bossa Nova"][..]),
        ("Classical", &["Baroque", "Opera", "Chamber Music"][..]),
        ("Metal", &["Hard Rock", "Punk", "Nu Metal"][..]),
        ("Folk", &["Country", "Americana", "Singer-Songwriter"][..]),
        ("Ambient", &["Downtempo", "New Age", "Lo-Fi"][..]),
        ("R&B", &["Soul", "Neo-Soul", "Funk", "Hip Hop"][..]),
        ("Punk", &["Post-Punk", "Hardcore", "Metal"][..]),
        ("House", &["Techno", "Disco", "EDM"][..]),
        ("Country", &["Folk", "Americana", "Bluegrass"][..]),
        ("Reggae", &["Dub", "Ska", "Dancehall"][..]),
        ("Blues", &["Jazz", "Soul", "Rock & Roll"][..]),
    ])
});

/// Pairwise co-occurrence counts between canonical genres, accumulated from
/// tracks that carry at least two distinct normalized genres.
#[derive(Debug, Default)]
pub struct GenreCoOccurrence {
    counts: HashMap<(String, String), usize>,
}

impl GenreCoOccurrence {
    pub fn build(tracks: &[Track], mapping: &NormalizedGenreMapping) -> Self {
        let mut co = GenreCoOccurrence::default();
        for track in tracks {
            let genres: Vec<String> = mapping.track_genres(track).into_iter().collect();
            if genres.len() < 2 {
                continue;
            }
            for i in 0..genres.len() {
                for j in (i + 1)..genres.len() {
                    co.increment(&genres[i], &genres[j]);
                }
            }
        }
        co
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    fn increment(&mut self, a: &str, b: &str) {
        *self.counts.entry(Self::key(a, b)).or_insert(0) += 1;
    }

    pub fn count(&self, a: &str, b: &str) -> usize {
        self.counts.get(&Self::key(a, b)).copied().unwrap_or(0)
    }
}

/// Suggest genres related to an already-selected set. Library co-occurrence
/// scores come first; a static taxonomy supplements at weight 1 when the
/// library alone yields fewer than `limit` candidates. Ranked by score
/// descending, then alphabetically, truncated to `limit`.
pub fn similar_genres(
    selected: &[String],
    library_genres: &[String],
    co_occurrence: &GenreCoOccurrence,
    limit: usize,
) -> Vec<String> {
    let mut scores: HashMap<String, usize> = HashMap::new();

    for candidate in library_genres {
        if selected.iter().any(|s| s == candidate) {
            continue;
        }
        let score: usize = selected
            .iter()
            .map(|s| co_occurrence.count(s, candidate))
            .sum();
        if score > 0 {
            scores.insert(candidate.clone(), score);
        }
    }

    if scores.len() < limit {
        for genre in selected {
            let Some(siblings) = GENRE_TAXONOMY.get(genre.as_str()) else {
                continue;
            };
            for sibling in *siblings {
                if selected.iter().any(|s| s == sibling) {
                    continue;
                }
                scores.entry((*sibling).to_string()).or_insert(1);
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(genre, _)| genre).collect()
}
