use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

mod library;
mod models;
mod playlist;


use crate::library::{load_library, load_request, load_strategy};
use crate::playlist::{GenerationOptions, PlaylistGenerator};

#[derive(Parser)]
#[command(name = "playlist-engine")]
#[command(about = "Generate a playlist from a local track library")]
#[command(version)]
struct Args {
    /// Path to the library JSON file (array of track records)
    #[arg(short = 'l', long = "library", default_value = "library.json")]
    library_file: PathBuf,

    /// Path to the playlist request JSON file
    #[arg(short = 'r', long = "request", default_value = "request.json")]
    request_file: PathBuf,

    /// Optional externally generated strategy JSON file
    #[arg(short = 's', long = "strategy")]
    strategy_file: Option<PathBuf>,

    /// RNG seed for reproducible surprise sampling
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Print per-track selection reasons
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Quiet mode - reduce output verbosity
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if !args.library_file.exists() {
        eprintln!(
            "Error: Library file '{}' not found.",
            args.library_file.display()
        );
        return Err(anyhow::anyhow!(
            "Library file '{}' not found",
            args.library_file.display()
        ));
    }

    let tracks = load_library(&args.library_file)?;
    if !args.quiet {
        println!("Loaded {} tracks from the library.", tracks.len());
    }

    let request = load_request(&args.request_file)?;

    let options = match &args.strategy_file {
        Some(path) => GenerationOptions {
            strategy: Some(load_strategy(path)?),
            fallback_used: false,
        },
        None => GenerationOptions::default(),
    };

    let generator = PlaylistGenerator::new(options);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let generated = generator.generate(&tracks, &request, Utc::now(), &mut rng)?;

    println!("\n{}", generated.title);
    println!("{}", "=".repeat(generated.title.len()));

    if generated.picks.is_empty() {
        println!("No tracks matched this request.");
    }

    let summary = &generated.summary;
    println!(
        "Tracks: {} | Duration: {}m{}s | Avg: {:.0}s",
        summary.track_count,
        summary.total_duration / 60,
        summary.total_duration % 60,
        summary.avg_duration
    );

    let mut top_genres: Vec<_> = summary.genre_mix.iter().collect();
    top_genres.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    if !top_genres.is_empty() {
        let top_3: Vec<String> = top_genres
            .iter()
            .take(3)
            .map(|(genre, count)| format!("{genre} ({count})"))
            .collect();
        println!("Top Genres: {}", top_3.join(", "));
    }

    let mut tempo_mix: Vec<_> = summary.tempo_mix.iter().collect();
    tempo_mix.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    if !tempo_mix.is_empty() {
        let buckets: Vec<String> = tempo_mix
            .iter()
            .map(|(bucket, count)| format!("{bucket}: {count}"))
            .collect();
        println!("Tempo: {}", buckets.join(" | "));
    }

    if let Some(shortfall) = &generated.shortfall {
        println!(
            "\nNote: delivered {} tracks of the requested {:?} ({}).",
            shortfall.delivered, shortfall.requested, shortfall.reason
        );
    }

    if !args.quiet {
        println!();
        for (i, pick) in generated.picks.iter().enumerate() {
            let track = tracks.iter().find(|t| t.id == pick.track_id);
            let label = match track {
                Some(t) => format!("\"{}\" by {}", t.title, t.artist),
                None => pick.track_id.clone(),
            };
            println!(
                "  {:2}. {} [{}] score {:.2}",
                i + 1,
                label,
                pick.section,
                pick.score
            );
            if args.debug {
                for reason in &pick.reasons {
                    println!("      - {}", reason.explanation);
                }
            }
        }
    }

    Ok(())
}
