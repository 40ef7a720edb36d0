// src/reencode.rs
// Optional ffmpeg re-encode of files the active DJ profile cannot play

use crate::config::Config;
use crate::error::AppError;
use crate::profiles::DjProfile;
use crate::utils::extension_of;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Something that may convert a downloaded file into a better suited format
pub trait Reencoder: Send + Sync {
    /// `Ok(Some(new_path))` when a new file was produced, `Ok(None)` when the
    /// file was left as it is
    fn reencode_if_needed(&self, path: &Path) -> Result<Option<PathBuf>, AppError>;
}

/// Never re-encodes
pub struct NoopReencoder;

impl Reencoder for NoopReencoder {
    fn reencode_if_needed(&self, _path: &Path) -> Result<Option<PathBuf>, AppError> {
        Ok(None)
    }
}

/// Whether a file with `ext` has to be re-encoded under the given settings
pub fn should_reencode(profile: &DjProfile, allow_reencode: bool, ext: &str) -> bool {
    allow_reencode && profile.is_restrictive() && !profile.is_ext_compatible(ext)
}

/// ffmpeg arguments converting `src` into `dst`; the output is always overwritten
pub fn build_ffmpeg_args(src: &Path, dst: &Path) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-i".to_string(),
        src.to_string_lossy().into_owned(),
        "-vn".to_string(),
    ];

    match extension_of(dst).as_str() {
        "aiff" | "aif" | "wav" => {
            args.extend(
                ["-acodec", "pcm_s16le", "-ar", "44100", "-ac", "2"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }
        _ => {
            args.push("-acodec".to_string());
            args.push("copy".to_string());
        }
    }

    args.push(dst.to_string_lossy().into_owned());
    args
}

/// Re-encoder backed by the ffmpeg executable
pub struct FfmpegReencoder {
    ffmpeg_path: String,
    profile: DjProfile,
    allow_reencode: bool,
    target_ext: String,
    remove_source: bool,
}

impl FfmpegReencoder {
    pub fn new(
        ffmpeg_path: impl Into<String>,
        profile: DjProfile,
        allow_reencode: bool,
        target_ext: impl Into<String>,
        remove_source: bool,
    ) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            profile,
            allow_reencode,
            target_ext: target_ext.into().trim_start_matches('.').to_lowercase(),
            remove_source,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.ffmpeg_path.clone(),
            DjProfile::from_config(config),
            config.allow_reencode_for_incompatible,
            config.preferred_high_quality_target.clone(),
            config.remove_source_after_reencode,
        )
    }

    /// Path the re-encoded file is written to
    pub fn target_path(&self, src: &Path) -> PathBuf {
        src.with_extension(&self.target_ext)
    }
}

impl Reencoder for FfmpegReencoder {
    fn reencode_if_needed(&self, path: &Path) -> Result<Option<PathBuf>, AppError> {
        let ext = extension_of(path);
        if !should_reencode(&self.profile, self.allow_reencode, &ext) {
            return Ok(None);
        }

        let dst = self.target_path(path);
        if dst == path {
            debug!("{} already has the target format", path.display());
            return Ok(None);
        }

        info!(
            "Re-encoding {} ({} -> {}) for profile {}",
            path.display(),
            ext,
            self.target_ext,
            self.profile
        );

        let output = Command::new(&self.ffmpeg_path)
            .args(build_ffmpeg_args(path, &dst))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    AppError::MissingDependency(format!("ffmpeg not found at '{}'", self.ffmpeg_path))
                }
                _ => AppError::ReencodeError(format!("failed to start ffmpeg: {}", e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ReencodeError(format!(
                "ffmpeg exited with {} for {}: {}",
                output.status,
                path.display(),
                stderr.trim()
            )));
        }

        if !dst.exists() {
            return Err(AppError::ReencodeError(format!(
                "ffmpeg reported success but {} is missing",
                dst.display()
            )));
        }

        if self.remove_source {
            if let Err(e) = fs::remove_file(path) {
                warn!("Could not remove source file {}: {}", path.display(), e);
            }
        }

        Ok(Some(dst))
    }
}
