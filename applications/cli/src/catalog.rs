//! Track catalog loading
//!
//! A catalog is a JSON file holding either a bare array of tracks or an
//! object with a `tracks` array. Field names follow [`Track`].

use crate::error::{CliError, Result};
use encore_playback::Track;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Tracks(Vec<Track>),
    Wrapped { tracks: Vec<Track> },
}

/// Read and validate a catalog file
pub fn load_catalog(path: &Path) -> Result<Vec<Track>> {
    let contents = std::fs::read_to_string(path)?;
    let tracks = parse_catalog(&contents)?;
    tracing::info!("Loaded {} tracks from {}", tracks.len(), path.display());
    Ok(tracks)
}

/// Parse catalog JSON
///
/// Rejects empty catalogs and duplicate ids.
pub fn parse_catalog(json: &str) -> Result<Vec<Track>> {
    let tracks = match serde_json::from_str::<CatalogFile>(json)? {
        CatalogFile::Tracks(tracks) | CatalogFile::Wrapped { tracks } => tracks,
    };

    if tracks.is_empty() {
        return Err(CliError::Catalog("catalog has no tracks".to_string()));
    }

    let mut seen = HashSet::new();
    for track in &tracks {
        if track.id.is_empty() {
            return Err(CliError::Catalog(format!(
                "track \"{}\" has an empty id",
                track.title
            )));
        }
        if !seen.insert(track.id.as_str()) {
            return Err(CliError::Catalog(format!("duplicate track id {}", track.id)));
        }
    }

    Ok(tracks
        .into_iter()
        .map(|track| {
            // Route through the sanitizing builder
            let duration = track.duration;
            track.with_duration(duration)
        })
        .collect())
}
