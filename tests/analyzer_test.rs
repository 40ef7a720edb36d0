// tests/analyzer_test.rs
use playlistloader::analyzer::analyze_playlist_folder;
use playlistloader::config::Config;
use playlistloader::download_manager::retag_downloads_for_playlist;
use playlistloader::error::AppError;
use playlistloader::job::TrackMeta;
use playlistloader::registry::{TrackInfo, TrackRegistry};
use playlistloader::tagging::Tagger;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

fn cdj_config(dir: &Path) -> Config {
    Config {
        output_directory: dir.to_path_buf(),
        dj_compatibility_profile: "cdj2000nxs2".to_string(),
        ..Config::default()
    }
}

#[test]
fn test_missing_folder_is_not_an_error() {
    let dir = tempdir().unwrap();
    let result = analyze_playlist_folder(&cdj_config(dir.path()), "nothing").unwrap();
    assert!(result.is_none());
}

#[test]
fn test_counts_sizes_and_incompatible_files() {
    let dir = tempdir().unwrap();
    let folder = dir.path().join("pl1");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("01 A.m4a"), vec![0u8; 100]).unwrap();
    fs::write(folder.join("02 B.m4a"), vec![0u8; 50]).unwrap();
    fs::write(folder.join("03 C.opus"), vec![0u8; 10]).unwrap();
    fs::write(folder.join("notes.txt"), b"ignored").unwrap();

    let analysis = analyze_playlist_folder(&cdj_config(dir.path()), "pl1")
        .unwrap()
        .unwrap();

    assert_eq!(analysis.total_files(), 3);
    assert_eq!(analysis.total_bytes(), 160);

    let m4a = &analysis.formats["m4a"];
    assert_eq!(m4a.count, 2);
    assert_eq!(m4a.bytes, 150);
    assert!(m4a.compatible);

    let opus = &analysis.formats["opus"];
    assert_eq!(opus.count, 1);
    assert!(!opus.compatible);

    assert_eq!(analysis.incompatible_files, vec![folder.join("03 C.opus")]);
    assert!(!analysis.formats.contains_key("txt"));
}

#[derive(Default)]
struct CountingTagger {
    tagged: Mutex<Vec<PathBuf>>,
    fail_on: Option<&'static str>,
}

impl Tagger for CountingTagger {
    fn apply_tags(&self, path: &Path, _meta: &TrackMeta) -> Result<(), AppError> {
        if let Some(name) = self.fail_on {
            if path.ends_with(name) {
                return Err(AppError::TaggingError("nope".to_string()));
            }
        }
        self.tagged.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

#[derive(Default)]
struct CountingRegistry {
    ids: Mutex<Vec<String>>,
}

impl TrackRegistry for CountingRegistry {
    fn register_file_for_track(&self, info: &TrackInfo, _path: &Path) -> Result<(), AppError> {
        self.ids.lock().unwrap().push(info.spotify_track_id.clone());
        Ok(())
    }
}

#[test]
fn test_retag_counts_tagged_skipped_and_failed() {
    let dir = tempdir().unwrap();
    let config = Config {
        output_directory: dir.path().to_path_buf(),
        ..Config::default()
    };
    fs::write(
        dir.path().join("spotify_playlist_pl1.json"),
        r#"{ "tracks": [
            { "spotify_track_id": "a", "title": "One", "primary_artist": "X", "track_number": 1 },
            { "spotify_track_id": "b", "title": "Two", "primary_artist": "X", "track_number": 2 },
            { "spotify_track_id": "c", "title": "Three", "primary_artist": "X", "track_number": 3 }
        ] }"#,
    )
    .unwrap();

    let folder = dir.path().join("pl1");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("01 One.m4a"), b"a").unwrap();
    fs::write(folder.join("03 Three.mp3"), b"c").unwrap();

    let tagger = CountingTagger {
        fail_on: Some("03 Three.mp3"),
        ..CountingTagger::default()
    };
    let registry = CountingRegistry::default();

    let summary =
        retag_downloads_for_playlist(&config, "pl1", None, &tagger, Some(&registry)).unwrap();

    assert_eq!(summary.tagged, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.registered, 1);
    assert_eq!(*registry.ids.lock().unwrap(), vec!["a".to_string()]);
}
