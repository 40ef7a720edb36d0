// src/registry.rs
// Track registry: remembers which local files belong to which track and which one is best

use crate::error::AppError;
use crate::utils::{ensure_dir, extension_of};
use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::UNIX_EPOCH;

/// Basic track identity handed to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub spotify_track_id: String,
    pub title: String,
    pub primary_artist: String,
    pub duration_ms: Option<u64>,
    pub source_url: Option<String>,
}

pub trait TrackRegistry: Send + Sync {
    /// Upsert the track, record `path` as one of its files and promote the file
    /// to best file when its format ranks higher than the current one
    fn register_file_for_track(&self, info: &TrackInfo, path: &Path) -> Result<(), AppError>;
}

/// Rough quality score of a container, used to pick the best file of a track
pub fn format_quality(ext: &str) -> u32 {
    match ext.trim_start_matches('.').to_lowercase().as_str() {
        "aiff" | "aif" => 100,
        "flac" | "alac" => 95,
        "wav" => 90,
        "m4a" => 80,
        "aac" => 78,
        "mp3" => 70,
        "opus" => 40,
        "webm" => 35,
        _ => 10,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackEntry {
    pub spotify_track_id: String,
    pub title: String,
    pub primary_artist: String,
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub source_url: Option<String>,
    pub best_file_id: Option<u64>,
    pub created_at: String,
    pub last_seen_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: u64,
    pub track_id: String,
    pub absolute_path: PathBuf,
    pub format: String,
    pub file_size: Option<u64>,
    pub mtime: u64,
    pub added_at: String,
    pub last_seen_at: String,
    #[serde(default)]
    pub is_missing: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryState {
    #[serde(default)]
    tracks: BTreeMap<String, TrackEntry>,
    #[serde(default)]
    files: Vec<FileEntry>,
    #[serde(default)]
    next_file_id: u64,
}

impl RegistryState {
    fn file(&self, id: u64) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.id == id)
    }

    fn best_file(&self, spotify_track_id: &str) -> Option<&FileEntry> {
        self.tracks
            .get(spotify_track_id)
            .and_then(|t| t.best_file_id)
            .and_then(|id| self.file(id))
    }
}

/// Registry persisted as a single JSON file
pub struct JsonTrackRegistry {
    path: PathBuf,
    state: Mutex<RegistryState>,
}

impl JsonTrackRegistry {
    /// Open the registry file, starting empty when it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw).map_err(|e| {
                AppError::RegistryError(format!("{} is corrupt: {}", path.display(), e))
            })?
        } else {
            RegistryState::default()
        };

        debug!(
            "Opened track registry {} ({} track(s))",
            path.display(),
            state.tracks.len()
        );
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_track(&self, spotify_track_id: &str) -> Result<Option<TrackInfo>, AppError> {
        let state = self.lock();
        Ok(state.tracks.get(spotify_track_id).map(|t| TrackInfo {
            spotify_track_id: t.spotify_track_id.clone(),
            title: t.title.clone(),
            primary_artist: t.primary_artist.clone(),
            duration_ms: t.duration_ms,
            source_url: t.source_url.clone(),
        }))
    }

    /// All file records of a track, in registration order
    pub fn files_for_track(&self, spotify_track_id: &str) -> Result<Vec<FileEntry>, AppError> {
        let state = self.lock();
        Ok(state
            .files
            .iter()
            .filter(|f| f.track_id == spotify_track_id)
            .cloned()
            .collect())
    }

    /// Path of the best known file, `None` if unknown or gone from disk
    pub fn get_best_file_for_track(
        &self,
        spotify_track_id: &str,
    ) -> Result<Option<PathBuf>, AppError> {
        let state = self.lock();
        Ok(state
            .best_file(spotify_track_id)
            .map(|f| f.absolute_path.clone())
            .filter(|p| p.exists()))
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn persist(&self, state: &RegistryState) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TrackRegistry for JsonTrackRegistry {
    fn register_file_for_track(&self, info: &TrackInfo, path: &Path) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let absolute_path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let ext = extension_of(path);

        let (file_size, mtime) = match fs::metadata(path) {
            Ok(meta) => {
                let mtime = meta
                    .modified()
                    .ok()
                    .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                (Some(meta.len()), mtime)
            }
            Err(_) => (None, 0),
        };

        let mut state = self.lock();

        let track = state
            .tracks
            .entry(info.spotify_track_id.clone())
            .or_insert_with(|| TrackEntry {
                spotify_track_id: info.spotify_track_id.clone(),
                title: info.title.clone(),
                primary_artist: info.primary_artist.clone(),
                duration_ms: info.duration_ms,
                source_url: None,
                best_file_id: None,
                created_at: now.clone(),
                last_seen_at: now.clone(),
            });
        track.title = info.title.clone();
        track.primary_artist = info.primary_artist.clone();
        track.duration_ms = info.duration_ms;
        if info.source_url.is_some() {
            track.source_url = info.source_url.clone();
        }
        track.last_seen_at = now.clone();

        let best_quality = state
            .best_file(&info.spotify_track_id)
            .map(|f| format_quality(&f.format));

        let file_id = state.next_file_id;
        state.next_file_id += 1;
        state.files.push(FileEntry {
            id: file_id,
            track_id: info.spotify_track_id.clone(),
            absolute_path,
            format: ext.clone(),
            file_size,
            mtime,
            added_at: now.clone(),
            last_seen_at: now,
            is_missing: false,
        });

        let promote = match best_quality {
            None => true,
            Some(best) => format_quality(&ext) > best,
        };
        if promote {
            if let Some(track) = state.tracks.get_mut(&info.spotify_track_id) {
                track.best_file_id = Some(file_id);
            }
            info!(
                "Registry: {} is now the best file for {} - {}",
                path.display(),
                info.primary_artist,
                info.title
            );
        }

        self.persist(&state)
    }
}
