// src/utils.rs

use crate::config::Config;
use crate::error::AppError;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Characters that are not allowed in file names on common file systems
static INVALID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\n\r\t]+"#).expect("valid file name pattern"));

/// Replace characters that are invalid in file names and collapse whitespace
pub fn sanitize_title(title: &str) -> String {
    let cleaned = INVALID_CHARS.replace_all(title, " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut a file name stem to `max_length` characters
pub fn shorten_filename_stem(stem: &str, max_length: usize) -> String {
    if stem.chars().count() <= max_length {
        return stem.to_string();
    }
    let cut: String = stem.chars().take(max_length).collect();
    cut.trim_end().to_string()
}

/// Two-digit track number, `00` when unknown
pub fn format_track_number(track_number: Option<u32>) -> String {
    match track_number {
        Some(n) if n > 0 => format!("{:02}", n),
        _ => "00".to_string(),
    }
}

/// Build a file name such as `03 Title.m4a` from the configured template
pub fn build_audio_filename(config: &Config, title: &str, track_number: Option<u32>) -> String {
    let stem = config
        .audio_filename_template
        .replace("{track_number_padded}", &format_track_number(track_number))
        .replace("{title_sanitized}", &sanitize_title(title));

    let stem = shorten_filename_stem(stem.trim(), config.max_filename_length);
    format!(
        "{}.{}",
        stem,
        config.audio_output_extension.trim_start_matches('.')
    )
}

/// Strip a trailing `.<ext>` from a file name.
///
/// Only suffixes of one to five ASCII alphanumerics count as an extension, so
/// titles like `Mr. Brightside` keep their dot.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => {
            let ext = &file_name[pos + 1..];
            if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            {
                &file_name[..pos]
            } else {
                file_name
            }
        }
        _ => file_name,
    }
}

/// Lowercase extension of a path without the leading dot
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// All existing files `<stem>.<ext>` in `dir`, in the order of `extensions`
pub fn find_existing_audio(dir: &Path, stem: &str, extensions: &[String]) -> Vec<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .filter(|candidate| candidate.is_file())
        .collect()
}

/// First existing file `<stem>.<ext>` in `dir`
pub fn find_downloaded_file(dir: &Path, stem: &str, extensions: &[String]) -> Option<PathBuf> {
    find_existing_audio(dir, stem, extensions).into_iter().next()
}

/// Make sure a directory exists
pub fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    if !dir.is_dir() {
        debug!("Creating directory {}", dir.display());
        fs::create_dir_all(dir).map_err(|e| {
            AppError::PathError(format!("Cannot create directory {}: {}", dir.display(), e))
        })?;
    }
    Ok(())
}

/// One-based, zero-padded label used in console output (`#03`)
pub fn track_label(track_index: usize) -> String {
    format!("#{:02}", track_index + 1)
}
