// src/config.rs
// Runtime configuration loaded once at startup and passed explicitly to every stage

use crate::error::AppError;
use dirs_next as dirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that may point at a configuration file
pub const CONFIG_ENV_VAR: &str = "PLAYLISTLOADER_CONFIG";

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// All settings of the download pipeline.
///
/// Keys use the PascalCase spelling of the existing `config.json` files; every
/// field has a default so partial files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Config {
    /// Root directory for exported playlist data and downloaded audio
    pub output_directory: PathBuf,
    /// Put the audio of each playlist into `<output>/<playlist_id>`
    pub per_playlist_subdir: bool,
    /// Audio containers tried in order before falling back to "best audio"
    pub audio_preferred_formats: Vec<String>,
    /// Upper bound for concurrent download workers
    pub max_parallel_downloads: usize,
    /// Additional attempts after the first failed one
    pub download_max_retries: u32,
    /// Fixed pause between two failed attempts of the same job
    pub retry_backoff_ms: u64,
    /// Treat jobs as done when a matching file already exists
    pub skip_existing_files: bool,
    /// Extensions considered when looking for downloaded files
    pub known_audio_extensions: Vec<String>,
    /// Name of the active DJ compatibility profile
    #[serde(rename = "DJCompatibilityProfile")]
    pub dj_compatibility_profile: String,
    /// Warn when a download lands in a format the profile does not accept
    #[serde(rename = "DJWarnOnIncompatible")]
    pub dj_warn_on_incompatible: bool,
    pub allow_reencode_for_incompatible: bool,
    pub preferred_high_quality_target: String,
    pub remove_source_after_reencode: bool,
    pub deny_wav_completely: bool,
    pub registry_enabled: bool,
    pub registry_store_source_url: bool,
    /// Location of the registry file; defaults to the local data directory
    pub registry_path: Option<PathBuf>,
    /// Extension appended by the filename builder
    pub audio_output_extension: String,
    /// Template with `{track_number_padded}` and `{title_sanitized}` placeholders
    pub audio_filename_template: String,
    pub max_filename_length: usize,
    /// File name pattern for exported search queries, `{playlist_id}` is substituted
    #[serde(rename = "YTDLP_TextFilePattern")]
    pub ytdlp_text_file_pattern: String,
    #[serde(rename = "YtDlpPath")]
    pub ytdlp_path: String,
    pub ffmpeg_path: String,
    /// Prefix that turns a plain query into a yt-dlp search target
    pub search_prefix: String,
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("output"),
            per_playlist_subdir: true,
            audio_preferred_formats: ["m4a", "mp3", "aac", "opus", "flac"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_parallel_downloads: 2,
            download_max_retries: 2,
            retry_backoff_ms: 1000,
            skip_existing_files: true,
            known_audio_extensions: [
                "m4a", "aac", "mp3", "flac", "alac", "aiff", "aif", "wav", "webm", "opus",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            dj_compatibility_profile: "none".to_string(),
            dj_warn_on_incompatible: true,
            allow_reencode_for_incompatible: false,
            preferred_high_quality_target: "aiff".to_string(),
            remove_source_after_reencode: true,
            deny_wav_completely: false,
            registry_enabled: false,
            registry_store_source_url: false,
            registry_path: None,
            audio_output_extension: "m4a".to_string(),
            audio_filename_template: "{track_number_padded} {title_sanitized}".to_string(),
            max_filename_length: 80,
            ytdlp_text_file_pattern: "spotify_{playlist_id}_yt-dlp.txt".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            search_prefix: "ytsearch1:".to_string(),
            show_progress: true,
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit path (CLI flag or environment variable) must exist. Without one,
    /// `./config.json` and `<config_dir>/playlistloader/config.json` are tried in
    /// that order, and the built-in defaults are used when neither exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);

        let required = explicit.map(Path::to_path_buf).or(env_path);
        if let Some(path) = required {
            if !path.exists() {
                return Err(AppError::ConfigError(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            return Self::from_file(&path);
        }

        for candidate in default_config_locations() {
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }

        info!("No configuration file found, using built-in defaults");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        debug!("Loading configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let config = Self::from_json(&raw).map_err(|e| match e {
            AppError::JsonError(inner) => {
                AppError::ConfigError(format!("{}: {}", path.display(), inner))
            }
            other => other,
        })?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let mut config: Config = serde_json::from_str(raw)?;
        config.output_directory = expand_home(&config.output_directory);
        config.registry_path = config.registry_path.as_deref().map(expand_home);
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_parallel_downloads == 0 {
            return Err(AppError::ConfigError(
                "MaxParallelDownloads must be at least 1".to_string(),
            ));
        }
        if self.known_audio_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(AppError::ConfigError(
                "KnownAudioExtensions must not be empty".to_string(),
            ));
        }
        if self.audio_filename_template.trim().is_empty() {
            return Err(AppError::ConfigError(
                "AudioFilenameTemplate must not be empty".to_string(),
            ));
        }
        if self.max_filename_length == 0 {
            return Err(AppError::ConfigError(
                "MaxFilenameLength must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory that receives the audio files of one playlist
    pub fn playlist_dir(&self, playlist_id: &str) -> PathBuf {
        if self.per_playlist_subdir {
            self.output_directory.join(playlist_id)
        } else {
            self.output_directory.clone()
        }
    }

    /// Path of the exported extended JSON for a playlist
    pub fn playlist_json_path(&self, playlist_id: &str) -> PathBuf {
        self.output_directory
            .join(format!("spotify_playlist_{}.json", playlist_id))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Known extensions, normalised to lowercase without a leading dot
    pub fn known_extensions(&self) -> Vec<String> {
        normalize_extensions(&self.known_audio_extensions)
    }

    /// Resolved location of the track registry file
    pub fn registry_file(&self) -> PathBuf {
        match &self.registry_path {
            Some(path) => path.clone(),
            None => {
                let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
                path.push("playlistloader");
                path.push("track_registry.json");
                path
            }
        }
    }
}

/// Lowercase, strip leading dots and drop empty entries
pub fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(mut dir) = dirs::config_dir() {
        dir.push("playlistloader");
        dir.push(CONFIG_FILE_NAME);
        locations.push(dir);
    }
    locations
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
