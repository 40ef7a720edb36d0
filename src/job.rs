// src/job.rs
// Download jobs and the job builder

use crate::config::Config;
use crate::error::AppError;
use crate::playlist::{load_playlist_data, search_query_for, PlaylistData, TrackRecord};
use crate::utils::{build_audio_filename, ensure_dir, strip_extension};
use log::{debug, info};
use std::path::PathBuf;

/// Typed tag metadata for one track, taken over from the exported record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMeta {
    pub title: Option<String>,
    pub artists: Vec<String>,
    pub primary_artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub release_date: Option<String>,
    pub year: Option<u32>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub duration_ms: Option<u64>,
    pub isrc: Option<String>,
    pub bpm: Option<f64>,
    pub key_notation: Option<String>,
    pub key_camelot: Option<String>,
    pub explicit: Option<bool>,
    pub cover_url: Option<String>,
}

impl TrackMeta {
    pub fn from_record(record: &TrackRecord) -> Self {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let release_date = non_empty(&record.release_date);
        let year = release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|y| y.parse::<u32>().ok());

        Self {
            title: non_empty(&record.title),
            artists: record
                .artists
                .clone()
                .unwrap_or_default()
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            primary_artist: non_empty(&record.primary_artist),
            album: non_empty(&record.album),
            album_artist: non_empty(&record.album_artist),
            release_date,
            year,
            track_number: record.track_number.filter(|n| *n > 0),
            disc_number: record.disc_number.filter(|n| *n > 0),
            duration_ms: record.duration_ms,
            isrc: non_empty(&record.isrc),
            bpm: record.bpm.filter(|b| *b > 0.0),
            key_notation: non_empty(&record.key_notation),
            key_camelot: non_empty(&record.key_camelot),
            explicit: record.explicit,
            cover_url: non_empty(&record.cover_url),
        }
    }

    /// Artist string for tags: all artists joined, else the primary artist
    pub fn artist_display(&self) -> Option<String> {
        if !self.artists.is_empty() {
            Some(self.artists.join(", "))
        } else {
            self.primary_artist.clone()
        }
    }
}

/// A single track to download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadJob {
    pub playlist_id: String,
    /// Zero-based position in the exported playlist
    pub track_index: usize,
    pub title: String,
    pub primary_artist: String,
    /// Plain `Artist - Title`, without the search prefix
    pub search_query: String,
    pub target_dir: PathBuf,
    /// File name without extension
    pub output_stem: String,
    pub source_track_id: Option<String>,
    pub source_url: Option<String>,
    pub track_meta: Option<TrackMeta>,
}

impl DownloadJob {
    /// `Artist - Title` for console output
    pub fn display_name(&self) -> String {
        search_query_for(&self.primary_artist, &self.title).unwrap_or_default()
    }

    /// Output path as handed to yt-dlp, extension left to the tool
    pub fn target_template(&self) -> PathBuf {
        self.target_dir.join(format!("{}.<ext>", self.output_stem))
    }
}

/// Turn exported playlist data into download jobs.
///
/// Tracks without title and artist are skipped; the others keep their original
/// position as `track_index`. The target directory is created if needed.
pub fn build_jobs_from_playlist_data(
    config: &Config,
    playlist_id: &str,
    data: &PlaylistData,
) -> Result<Vec<DownloadJob>, AppError> {
    let target_dir = config.playlist_dir(playlist_id);
    ensure_dir(&target_dir)?;

    let mut jobs = Vec::with_capacity(data.tracks.len());
    for (idx, track) in data.tracks.iter().enumerate() {
        let title = track.title_trimmed();
        let artist = track.artist_trimmed();

        let search_query = match search_query_for(artist, title) {
            Some(query) => query,
            None => {
                debug!("Skipping track {} without title and artist", idx);
                continue;
            }
        };

        let output_stem = match track
            .suggested_filename
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(suggested) => strip_extension(suggested).to_string(),
            None => {
                let file_name = build_audio_filename(config, title, track.track_number);
                strip_extension(&file_name).to_string()
            }
        };

        jobs.push(DownloadJob {
            playlist_id: playlist_id.to_string(),
            track_index: idx,
            title: title.to_string(),
            primary_artist: artist.to_string(),
            search_query,
            target_dir: target_dir.clone(),
            output_stem,
            source_track_id: track.spotify_track_id.clone().filter(|s| !s.is_empty()),
            source_url: track.spotify_url.clone().filter(|s| !s.is_empty()),
            track_meta: Some(TrackMeta::from_record(track)),
        });
    }

    debug!(
        "Built {} job(s) from {} track(s) of playlist {}",
        jobs.len(),
        data.tracks.len(),
        playlist_id
    );
    Ok(jobs)
}

/// Load the playlist data and build its jobs, keeping at most `limit`
pub fn plan_downloads_for_playlist(
    config: &Config,
    playlist_id: &str,
    limit: Option<usize>,
) -> Result<Vec<DownloadJob>, AppError> {
    let data = load_playlist_data(config, playlist_id)?;
    let mut jobs = build_jobs_from_playlist_data(config, playlist_id, &data)?;

    if let Some(limit) = limit {
        jobs.truncate(limit);
    }

    info!("Planned {} download(s) for playlist {}", jobs.len(), playlist_id);
    Ok(jobs)
}
