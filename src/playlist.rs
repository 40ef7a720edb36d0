// src/playlist.rs
// Exported playlist data ("extended JSON") and the search-query export

use crate::config::Config;
use crate::error::AppError;
use crate::utils::ensure_dir;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Playlist-level metadata written by the export step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistMeta {
    pub playlist_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub spotify_url: Option<String>,
    pub snapshot_id: Option<String>,
    pub total_tracks: Option<u32>,
    pub exported_at: Option<String>,
}

/// One track as written by the export step.
///
/// Every field is optional and unknown fields are ignored, so older or partial
/// exports still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackRecord {
    pub spotify_track_id: Option<String>,
    pub spotify_url: Option<String>,
    pub title: Option<String>,
    pub artists: Option<Vec<String>>,
    pub primary_artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub release_date: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub explicit: Option<bool>,
    pub duration_ms: Option<u64>,
    pub isrc: Option<String>,
    pub cover_url: Option<String>,
    pub bpm: Option<f64>,
    pub key_notation: Option<String>,
    pub key_camelot: Option<String>,
    pub suggested_filename: Option<String>,
}

impl TrackRecord {
    /// Trimmed title, empty when missing
    pub fn title_trimmed(&self) -> &str {
        self.title.as_deref().unwrap_or("").trim()
    }

    /// Trimmed primary artist, empty when missing
    pub fn artist_trimmed(&self) -> &str {
        self.primary_artist.as_deref().unwrap_or("").trim()
    }
}

/// Top-level structure of the extended JSON: `{ "playlist": {...}, "tracks": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistData {
    #[serde(default)]
    pub playlist: PlaylistMeta,
    pub tracks: Vec<TrackRecord>,
}

/// Load the extended JSON of a playlist from the output directory
pub fn load_playlist_data(config: &Config, playlist_id: &str) -> Result<PlaylistData, AppError> {
    let path = config.playlist_json_path(playlist_id);
    load_playlist_file(&path)
}

/// Load and validate an extended JSON file
pub fn load_playlist_file(path: &Path) -> Result<PlaylistData, AppError> {
    if !path.exists() {
        return Err(AppError::PlaylistNotFound(format!(
            "extended JSON not found: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)?;
    parse_playlist_json(&raw).map_err(|e| match e {
        AppError::PlaylistFormat(msg) => {
            AppError::PlaylistFormat(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Parse extended JSON text; a missing `tracks` array is a format error
pub fn parse_playlist_json(raw: &str) -> Result<PlaylistData, AppError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| AppError::PlaylistFormat(e.to_string()))?;

    if value.get("tracks").is_none() {
        return Err(AppError::PlaylistFormat("'tracks' is missing".to_string()));
    }

    let data: PlaylistData =
        serde_json::from_value(value).map_err(|e| AppError::PlaylistFormat(e.to_string()))?;
    debug!("Parsed playlist data with {} track(s)", data.tracks.len());
    Ok(data)
}

/// `Artist - Title` when both are known, otherwise whichever is present
pub fn search_query_for(artist: &str, title: &str) -> Option<String> {
    match (artist.is_empty(), title.is_empty()) {
        (false, false) => Some(format!("{} - {}", artist, title)),
        (false, true) => Some(artist.to_string()),
        (true, false) => Some(title.to_string()),
        (true, true) => None,
    }
}

/// Write one `<search prefix><query>` line per track into a text file.
///
/// Returns the path that was written.
pub fn export_search_queries(
    config: &Config,
    playlist_id: &str,
    output: Option<&Path>,
) -> Result<PathBuf, AppError> {
    let data = load_playlist_data(config, playlist_id)?;

    let lines: Vec<String> = data
        .tracks
        .iter()
        .filter_map(|t| search_query_for(t.artist_trimmed(), t.title_trimmed()))
        .map(|query| format!("{}{}", config.search_prefix, query))
        .collect();

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            ensure_dir(&config.output_directory)?;
            config.output_directory.join(
                config
                    .ytdlp_text_file_pattern
                    .replace("{playlist_id}", playlist_id),
            )
        }
    };

    fs::write(&path, lines.join("\n"))?;
    info!(
        "Wrote {} search queries for playlist {} to {}",
        lines.len(),
        playlist_id,
        path.display()
    );
    Ok(path)
}
