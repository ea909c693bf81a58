pub mod assembly;
pub mod filters;
pub mod generator;
pub mod genres;
pub mod index;
pub mod instructions;
pub mod moods;
pub mod request;
pub mod scoring;
pub mod similarity;
pub mod strategy;
pub mod summary;

use thiserror::Error;

/// Errors the engine reports to callers. Matching shortfalls are values on
/// the output (`Shortfall`), not errors; scorers and the instruction parser
/// never fail.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub use generator::{GeneratedPlaylist, GenerationOptions, PlaylistGenerator};
pub use strategy::PlaylistStrategy;
pub use summary::PlaylistSummary;
