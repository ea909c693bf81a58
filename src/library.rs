use crate::models::{PlaylistRequest, Track};
use crate::playlist::PlaylistStrategy;
use anyhow::{Context, Result};
use std::path::Path;

/// Load the track library from a JSON array file produced by the scanner.
pub fn load_library(path: &Path) -> Result<Vec<Track>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read library file {}", path.display()))?;
    let tracks: Vec<Track> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse library file {}", path.display()))?;
    Ok(tracks)
}

/// Load a playlist request from a JSON file.
pub fn load_request(path: &Path) -> Result<PlaylistRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read request file {}", path.display()))?;
    let request: PlaylistRequest = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse request file {}", path.display()))?;
    Ok(request)
}

/// Load an externally generated strategy from a JSON file.
pub fn load_strategy(path: &Path) -> Result<PlaylistStrategy> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read strategy file {}", path.display()))?;
    let strategy: PlaylistStrategy = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse strategy file {}", path.display()))?;
    Ok(strategy)
}
