// tests/postprocess_test.rs
// DJ profiles, re-encode decisions and tagging edge cases

use hound::{SampleFormat, WavSpec, WavWriter};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use playlistloader::config::Config;
use playlistloader::error::AppError;
use playlistloader::job::TrackMeta;
use playlistloader::profiles::DjProfile;
use playlistloader::reencode::{
    build_ffmpeg_args, should_reencode, FfmpegReencoder, NoopReencoder, Reencoder,
};
use playlistloader::tagging::{is_taggable, LoftyTagger, Tagger};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

#[test]
fn test_profile_from_name() {
    assert_eq!(DjProfile::from_name("none", false), DjProfile::None);
    assert_eq!(DjProfile::from_name("", false), DjProfile::None);
    assert_eq!(
        DjProfile::from_name("CDJ2000NXS2", true),
        DjProfile::Cdj2000Nxs2 { deny_wav: true }
    );
    assert!(matches!(
        DjProfile::from_name("rekordbox9", false),
        DjProfile::Unknown(_)
    ));
}

#[test]
fn test_cdj_profile_compatibility() {
    let profile = DjProfile::from_name("cdj2000nxs2", false);
    for ext in ["aiff", "aif", "flac", "m4a", "aac", "mp3", "wav", ".MP3"] {
        assert!(profile.is_ext_compatible(ext), "{} should be compatible", ext);
    }
    for ext in ["opus", "webm", "ogg"] {
        assert!(!profile.is_ext_compatible(ext), "{} should be incompatible", ext);
    }

    let no_wav = DjProfile::from_name("cdj2000nxs2", true);
    assert!(!no_wav.is_ext_compatible("wav"));
    assert!(no_wav.is_ext_compatible("aiff"));
}

#[test]
fn test_permissive_profiles_accept_everything() {
    assert!(DjProfile::None.is_ext_compatible("webm"));
    assert!(DjProfile::Unknown("x".into()).is_ext_compatible("opus"));
    assert!(!DjProfile::None.is_restrictive());
}

#[test]
fn test_should_reencode() {
    let cdj = DjProfile::from_name("cdj2000nxs2", false);
    assert!(should_reencode(&cdj, true, "opus"));
    assert!(!should_reencode(&cdj, true, "m4a"));
    assert!(!should_reencode(&cdj, false, "opus"));
    assert!(!should_reencode(&DjProfile::None, true, "opus"));
}

#[test]
fn test_ffmpeg_args_for_pcm_targets() {
    let args = build_ffmpeg_args(Path::new("/m/a.opus"), Path::new("/m/a.aiff"));
    assert_eq!(
        args,
        vec![
            "-y", "-i", "/m/a.opus", "-vn", "-acodec", "pcm_s16le", "-ar", "44100", "-ac", "2",
            "/m/a.aiff"
        ]
    );
}

#[test]
fn test_ffmpeg_args_copy_codec_otherwise() {
    let args = build_ffmpeg_args(Path::new("/m/a.webm"), Path::new("/m/a.m4a"));
    assert_eq!(args, vec!["-y", "-i", "/m/a.webm", "-vn", "-acodec", "copy", "/m/a.m4a"]);
}

#[test]
fn test_reencoder_leaves_compatible_files_alone() {
    let config = Config {
        dj_compatibility_profile: "cdj2000nxs2".to_string(),
        allow_reencode_for_incompatible: true,
        ffmpeg_path: "definitely-not-installed-ffmpeg".to_string(),
        ..Config::default()
    };
    let reencoder = FfmpegReencoder::from_config(&config);

    let result = reencoder
        .reencode_if_needed(Path::new("/music/track.m4a"))
        .unwrap();
    assert!(result.is_none());
    assert_eq!(
        reencoder.target_path(Path::new("/music/track.opus")),
        PathBuf::from("/music/track.aiff")
    );
}

#[test]
fn test_reencoder_reports_missing_ffmpeg() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("track.opus");
    fs::write(&src, b"audio").unwrap();

    let reencoder = FfmpegReencoder::new(
        "definitely-not-installed-ffmpeg",
        DjProfile::from_name("cdj2000nxs2", false),
        true,
        "aiff",
        true,
    );
    let result = reencoder.reencode_if_needed(&src);
    assert!(matches!(result, Err(AppError::MissingDependency(_))));
    // The source is kept when nothing was produced
    assert!(src.exists());
}

#[test]
fn test_noop_reencoder() {
    assert!(NoopReencoder
        .reencode_if_needed(Path::new("x.opus"))
        .unwrap()
        .is_none());
}

#[test]
fn test_tagging_skips_unsupported_containers() {
    let dir = tempdir().unwrap();
    let webm = dir.path().join("track.webm");
    fs::write(&webm, b"not really webm").unwrap();

    assert!(!is_taggable(&webm));
    assert!(is_taggable(Path::new("a.M4A")));
    assert!(LoftyTagger.apply_tags(&webm, &TrackMeta::default()).is_ok());
}

#[test]
fn test_tagging_invalid_file_is_an_error() {
    let dir = tempdir().unwrap();
    let flac = dir.path().join("broken.flac");
    fs::write(&flac, b"definitely not flac data").unwrap();

    let result = LoftyTagger.apply_tags(&flac, &TrackMeta::default());
    assert!(matches!(result, Err(AppError::TaggingError(_))));
}

fn write_silent_wav(path: &Path) {
    let spec = WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for _ in 0..4410 {
        writer.write_sample(0i16).unwrap();
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_tags_are_written_and_read_back() {
    let dir = tempdir().unwrap();
    let wav = dir.path().join("03 Mr. Brightside.wav");
    write_silent_wav(&wav);

    let meta = TrackMeta {
        title: Some("Mr. Brightside".to_string()),
        artists: vec!["The Killers".to_string(), "Guest".to_string()],
        album: Some("Hot Fuss".to_string()),
        track_number: Some(3),
        isrc: Some("USIR20400274".to_string()),
        bpm: Some(147.6),
        key_notation: Some("C# major".to_string()),
        key_camelot: Some("3B".to_string()),
        ..TrackMeta::default()
    };
    LoftyTagger.apply_tags(&wav, &meta).unwrap();

    let tagged_file = Probe::open(&wav).unwrap().read().unwrap();
    let tag = tagged_file.primary_tag().expect("primary tag written");

    assert_eq!(tag.title().as_deref(), Some("Mr. Brightside"));
    assert_eq!(tag.artist().as_deref(), Some("The Killers, Guest"));
    assert_eq!(tag.album().as_deref(), Some("Hot Fuss"));
    assert_eq!(tag.track(), Some(3));
    assert_eq!(tag.get_string(&ItemKey::Isrc), Some("USIR20400274"));
    assert_eq!(tag.get_string(&ItemKey::IntegerBpm), Some("148"));
    assert_eq!(tag.get_string(&ItemKey::InitialKey), Some("3B"));
}
