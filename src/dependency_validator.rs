//! Dependency checks for the external tools the pipeline shells out to
//!
//! Locates `yt-dlp` and `ffmpeg`, reads their versions and compares them against
//! the minimum versions known to work. Problems are reported as warnings only.

use crate::config::Config;
use crate::error::AppError;
use colored::*;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::io;
use std::process::{Command, Stdio};

// Minimum acceptable versions for dependencies
pub const MIN_YTDLP_VERSION: &str = "2023.07.06";
pub const MIN_FFMPEG_VERSION: &str = "4.0.0";

static FFMPEG_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ffmpeg version (?:n|git-)?(?:\d{4}-\d{2}-\d{2}-)?(\d+\.\d+(?:\.\d+)?)")
        .expect("valid ffmpeg version pattern")
});

static DATE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}\.\d{1,2}\.\d{1,2})").expect("valid date version pattern"));

static GENERIC_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.\d+(?:\.\d+)?)").expect("valid version pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyInfo {
    pub name: String,
    /// Program as configured (`YtDlpPath` / `FfmpegPath`)
    pub program: String,
    /// Resolved location, when `which`/`where` could find it
    pub path: Option<String>,
    pub version: String,
    pub is_min_version: bool,
}

/// Extract a version number from `--version` / `-version` output
pub fn parse_version(output: &str, name: &str) -> String {
    let captured = match name {
        "ffmpeg" => FFMPEG_VERSION
            .captures(output)
            .or_else(|| GENERIC_VERSION.captures(output)),
        "yt-dlp" => DATE_VERSION
            .captures(output)
            .or_else(|| GENERIC_VERSION.captures(output)),
        _ => GENERIC_VERSION.captures(output),
    };

    match captured.and_then(|c| c.get(1)) {
        Some(version) => version.as_str().trim().to_string(),
        None => {
            debug!("Unparseable version output for {}: {}", name, output);
            "unknown".to_string()
        }
    }
}

/// Numeric comparison of up to three dot-separated components
pub fn is_minimum_version(version: &str, min_version: &str) -> bool {
    let version_parts: Vec<u32> = version.split('.').filter_map(|s| s.parse().ok()).collect();
    let min_parts: Vec<u32> = min_version.split('.').filter_map(|s| s.parse().ok()).collect();

    if version_parts.is_empty() {
        return false;
    }

    for i in 0..3 {
        let v1 = version_parts.get(i).copied().unwrap_or(0);
        let v2 = min_parts.get(i).copied().unwrap_or(0);
        if v1 > v2 {
            return true;
        }
        if v1 < v2 {
            return false;
        }
    }
    true
}

fn minimum_for(name: &str) -> &'static str {
    match name {
        "yt-dlp" => MIN_YTDLP_VERSION,
        "ffmpeg" => MIN_FFMPEG_VERSION,
        _ => "0.0.0",
    }
}

fn version_arg(name: &str) -> &'static str {
    if name == "ffmpeg" {
        "-version"
    } else {
        "--version"
    }
}

fn locate(program: &str) -> Option<String> {
    #[cfg(target_os = "windows")]
    let finder = "where";

    #[cfg(not(target_os = "windows"))]
    let finder = "which";

    let output = Command::new(finder).arg(program).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}

/// Run `<program> --version` (or `-version` for ffmpeg) and parse the result
pub fn get_dependency_info(name: &str, program: &str) -> Result<DependencyInfo, AppError> {
    let output = Command::new(program)
        .arg(version_arg(name))
        .stdin(Stdio::null())
        .output()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                AppError::MissingDependency(format!("{} not found ('{}')", name, program))
            }
            _ => AppError::MissingDependency(format!("{} could not be started: {}", name, e)),
        })?;

    let combined = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let version = parse_version(&combined, name);
    let is_min_version = is_minimum_version(&version, minimum_for(name));

    Ok(DependencyInfo {
        name: name.to_string(),
        program: program.to_string(),
        path: locate(program),
        version,
        is_min_version,
    })
}

/// Check yt-dlp and ffmpeg as configured and print the findings
pub fn validate_dependencies(config: &Config) -> BTreeMap<String, Result<DependencyInfo, AppError>> {
    info!("Starting dependency validation");
    println!("{}", "Validating dependencies...".blue());

    let mut results = BTreeMap::new();
    let mut has_issues = false;

    for (name, program) in [("yt-dlp", &config.ytdlp_path), ("ffmpeg", &config.ffmpeg_path)] {
        let result = get_dependency_info(name, program);
        match &result {
            Ok(info) => {
                println!(
                    "{}: {} ({})",
                    name.green(),
                    info.version,
                    info.path.as_deref().unwrap_or(&info.program)
                );
                if !info.is_min_version {
                    warn!("{} {} is older than {}", name, info.version, minimum_for(name));
                    println!(
                        "{}: Version {} is below the minimum recommended ({})",
                        "WARNING".yellow(),
                        info.version,
                        minimum_for(name)
                    );
                    has_issues = true;
                }
            }
            Err(e) => {
                warn!("{}", e);
                println!("{}: {}", "WARNING".yellow(), e);
                has_issues = true;
            }
        }
        results.insert(name.to_string(), result);
    }

    if has_issues {
        warn!("Dependency validation completed with warnings");
        println!("{}", "\nDependency validation completed with warnings.".yellow());
    } else {
        info!("All dependencies validated successfully");
        println!("{}", "\nAll dependencies validated successfully.".green());
    }

    results
}
