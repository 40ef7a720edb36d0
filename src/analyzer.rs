// src/analyzer.rs
// Inventory of a playlist folder: formats, sizes and DJ compatibility

use crate::config::Config;
use crate::error::AppError;
use crate::profiles::DjProfile;
use crate::utils::extension_of;
use colored::*;
use humansize::{format_size, BINARY};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatStats {
    pub count: usize,
    pub bytes: u64,
    pub compatible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderAnalysis {
    pub folder: PathBuf,
    pub profile: DjProfile,
    /// Per extension, sorted by name
    pub formats: BTreeMap<String, FormatStats>,
    pub incompatible_files: Vec<PathBuf>,
}

impl FolderAnalysis {
    pub fn total_files(&self) -> usize {
        self.formats.values().map(|s| s.count).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.formats.values().map(|s| s.bytes).sum()
    }

    pub fn print(&self) {
        if self.formats.is_empty() {
            println!("{}", "No audio files found in the playlist folder.".yellow());
            return;
        }

        println!(
            "\nAudio files: {} ({})",
            self.total_files().to_string().bright_white().bold(),
            format_size(self.total_bytes(), BINARY)
        );
        println!("\nFormats:");
        println!("-------------------");
        for (ext, stats) in &self.formats {
            let flag = if stats.compatible {
                "OK".green()
            } else {
                "WARN".red()
            };
            println!(
                "  .{:<5} -> {:3} file(s) {:>10}   [{}]",
                ext,
                stats.count,
                format_size(stats.bytes, BINARY),
                flag
            );
        }
        println!("-------------------");

        if self.incompatible_files.is_empty() {
            println!(
                "\n{}",
                "All files are compatible with the active DJ profile.".green()
            );
        } else {
            println!("\n{}", "Files incompatible with the active DJ profile:".yellow());
            for file in &self.incompatible_files {
                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("- {}", name);
            }
        }
    }
}

/// Scan the playlist folder; `Ok(None)` when it does not exist
pub fn analyze_playlist_folder(
    config: &Config,
    playlist_id: &str,
) -> Result<Option<FolderAnalysis>, AppError> {
    let folder = config.playlist_dir(playlist_id);
    let profile = DjProfile::from_config(config);

    if !folder.is_dir() {
        debug!("Playlist folder {} does not exist", folder.display());
        return Ok(None);
    }

    let known = config.known_extensions();
    let mut files: Vec<PathBuf> = fs::read_dir(&folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && known.contains(&extension_of(path)))
        .collect();
    files.sort();

    let mut formats: BTreeMap<String, FormatStats> = BTreeMap::new();
    let mut incompatible_files = Vec::new();

    for path in files {
        let ext = extension_of(&path);
        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let compatible = profile.is_ext_compatible(&ext);

        let stats = formats.entry(ext).or_insert_with(|| FormatStats {
            compatible,
            ..FormatStats::default()
        });
        stats.count += 1;
        stats.bytes += size;

        if !compatible {
            incompatible_files.push(path);
        }
    }

    Ok(Some(FolderAnalysis {
        folder,
        profile,
        formats,
        incompatible_files,
    }))
}

/// Analyze and print the result for the CLI
pub fn print_playlist_analysis(config: &Config, playlist_id: &str) -> Result<(), AppError> {
    let profile = DjProfile::from_config(config);
    println!("{}", "========== PLAYLIST ANALYSIS ==========".bright_cyan().bold());
    println!("Output root:     {}", config.output_directory.display());
    println!("Playlist folder: {}", config.playlist_dir(playlist_id).display());
    println!("DJ profile:      {}", profile);
    println!("{}", "=======================================".bright_cyan());

    match analyze_playlist_folder(config, playlist_id)? {
        Some(analysis) => analysis.print(),
        None => {
            println!(
                "{}",
                "The playlist folder does not exist. Run a download for this playlist first."
                    .yellow()
            );
        }
    }
    Ok(())
}
