// src/tagging.rs
// Writes playlist metadata into downloaded audio files

use crate::error::AppError;
use crate::job::TrackMeta;
use crate::utils::extension_of;
use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use log::debug;
use std::path::Path;

/// Containers lofty can write tags into
const TAGGABLE_EXTENSIONS: [&str; 10] = [
    "mp3", "m4a", "mp4", "aac", "flac", "aiff", "aif", "wav", "opus", "ogg",
];

pub trait Tagger: Send + Sync {
    fn apply_tags(&self, path: &Path, meta: &TrackMeta) -> Result<(), AppError>;
}

pub fn is_taggable(path: &Path) -> bool {
    TAGGABLE_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Tagger backed by lofty
#[derive(Debug, Default, Clone)]
pub struct LoftyTagger;

impl Tagger for LoftyTagger {
    fn apply_tags(&self, path: &Path, meta: &TrackMeta) -> Result<(), AppError> {
        if !is_taggable(path) {
            debug!("Skipping tags for unsupported container {}", path.display());
            return Ok(());
        }

        let mut tagged_file = Probe::open(path)
            .map_err(|e| AppError::TaggingError(format!("{}: {}", path.display(), e)))?
            .read()
            .map_err(|e| AppError::TaggingError(format!("{}: {}", path.display(), e)))?;

        if tagged_file.primary_tag().is_none() {
            let tag_type = tagged_file.primary_tag_type();
            tagged_file.insert_tag(Tag::new(tag_type));
        }

        let tag = tagged_file.primary_tag_mut().ok_or_else(|| {
            AppError::TaggingError(format!("no writable tag for {}", path.display()))
        })?;

        write_meta(tag, meta);

        tagged_file
            .save_to_path(path, WriteOptions::default())
            .map_err(|e| AppError::TaggingError(format!("{}: {}", path.display(), e)))?;

        debug!("Tagged {}", path.display());
        Ok(())
    }
}

fn write_meta(tag: &mut Tag, meta: &TrackMeta) {
    if let Some(title) = &meta.title {
        tag.set_title(title.clone());
    }
    if let Some(artist) = meta.artist_display() {
        tag.set_artist(artist);
    }
    if let Some(album) = &meta.album {
        tag.set_album(album.clone());
    }
    if let Some(album_artist) = &meta.album_artist {
        tag.insert_text(ItemKey::AlbumArtist, album_artist.clone());
    }
    if let Some(track) = meta.track_number {
        tag.set_track(track);
    }
    if let Some(disc) = meta.disc_number {
        tag.set_disk(disc);
    }
    if let Some(year) = meta.year {
        tag.set_year(year);
    }
    if let Some(isrc) = &meta.isrc {
        tag.insert_text(ItemKey::Isrc, isrc.clone());
    }
    // ID3v2 and MP4 store BPM as an integer key, Vorbis comments as text
    if let Some(bpm) = meta.bpm {
        let bpm = format!("{}", bpm.round() as u32);
        tag.insert_text(ItemKey::IntegerBpm, bpm.clone());
        tag.insert_text(ItemKey::Bpm, bpm);
    }
    // Camelot notation takes precedence
    if let Some(key) = meta.key_camelot.as_ref().or(meta.key_notation.as_ref()) {
        tag.insert_text(ItemKey::InitialKey, key.clone());
    }
}
