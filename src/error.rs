// src/error.rs

use serde_json::Error as SerdeError;
use std::io;
use thiserror::Error;

/// Custom error types for the application
#[derive(Error, Debug)]
pub enum AppError {
    /// Error for missing dependencies
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// Error during download process
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Error for invalid input validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Error for path operation failures
    #[error("Path error: {0}")]
    PathError(String),

    /// General application errors
    #[error("Application error: {0}")]
    General(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Exported playlist data is missing
    #[error("Playlist data not found: {0}")]
    PlaylistNotFound(String),

    /// Exported playlist data exists but has an unexpected shape
    #[error("Invalid playlist data: {0}")]
    PlaylistFormat(String),

    /// Re-encoding a downloaded file failed
    #[error("Re-encode error: {0}")]
    ReencodeError(String),

    /// Writing tags to an audio file failed
    #[error("Tagging error: {0}")]
    TaggingError(String),

    /// Reading or writing the track registry failed
    #[error("Registry error: {0}")]
    RegistryError(String),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] SerdeError),
}

/// Convert a string error to AppError::General
impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::General(error)
    }
}

/// Convert a &str error to AppError::General
impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::General(error.to_string())
    }
}
