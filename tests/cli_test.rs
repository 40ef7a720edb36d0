// tests/cli_test.rs
use playlistloader::cli::build_cli;

#[test]
fn test_cli_basic_structure() {
    let app = build_cli();
    assert_eq!(app.get_name(), "playlistloader");

    let names: Vec<&str> = app.get_subcommands().map(|c| c.get_name()).collect();
    for expected in [
        "plan-downloads",
        "run-downloads",
        "retag-playlist",
        "analyze-playlist",
        "export-queries",
        "check-deps",
    ] {
        assert!(names.contains(&expected), "missing subcommand {}", expected);
    }
}

#[test]
fn test_plan_downloads_arguments() {
    let matches = build_cli()
        .try_get_matches_from(vec![
            "playlistloader",
            "plan-downloads",
            "--playlist-id",
            "37i9dQZF1DX",
            "--limit",
            "5",
        ])
        .unwrap();

    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "plan-downloads");
    assert_eq!(sub.get_one::<String>("playlist-id").unwrap(), "37i9dQZF1DX");
    assert_eq!(*sub.get_one::<usize>("limit").unwrap(), 5);
}

#[test]
fn test_run_downloads_overrides() {
    let matches = build_cli()
        .try_get_matches_from(vec![
            "playlistloader",
            "run-downloads",
            "--playlist-id",
            "abc",
            "--parallel",
            "4",
            "--retries",
            "0",
        ])
        .unwrap();

    let sub = matches.subcommand_matches("run-downloads").unwrap();
    assert_eq!(*sub.get_one::<usize>("parallel").unwrap(), 4);
    assert_eq!(*sub.get_one::<u32>("retries").unwrap(), 0);
    assert!(sub.get_one::<usize>("limit").is_none());
}

#[test]
fn test_parallel_must_be_positive() {
    let result = build_cli().try_get_matches_from(vec![
        "playlistloader",
        "run-downloads",
        "--playlist-id",
        "abc",
        "--parallel",
        "0",
    ]);
    assert!(result.is_err(), "--parallel 0 should be rejected");
}

#[test]
fn test_playlist_id_is_required() {
    let result = build_cli().try_get_matches_from(vec!["playlistloader", "run-downloads"]);
    assert!(result.is_err());

    // check-deps needs no playlist
    let result = build_cli().try_get_matches_from(vec!["playlistloader", "check-deps"]);
    assert!(result.is_ok());
}

#[test]
fn test_retag_and_export_flags() {
    let app = build_cli();

    let matches = app
        .clone()
        .try_get_matches_from(vec![
            "playlistloader",
            "retag-playlist",
            "-p",
            "abc",
            "--no-registry",
        ])
        .unwrap();
    let sub = matches.subcommand_matches("retag-playlist").unwrap();
    assert!(sub.get_flag("no-registry"));

    let matches = app
        .try_get_matches_from(vec![
            "playlistloader",
            "export-queries",
            "-p",
            "abc",
            "--output",
            "/tmp/queries.txt",
        ])
        .unwrap();
    let sub = matches.subcommand_matches("export-queries").unwrap();
    assert_eq!(sub.get_one::<String>("output").unwrap(), "/tmp/queries.txt");
}

#[test]
fn test_global_config_option() {
    let matches = build_cli()
        .try_get_matches_from(vec![
            "playlistloader",
            "--config",
            "my-config.json",
            "analyze-playlist",
            "--playlist-id",
            "abc",
        ])
        .unwrap();

    assert_eq!(matches.get_one::<String>("config").unwrap(), "my-config.json");
}

#[test]
fn test_missing_subcommand_is_an_error() {
    let result = build_cli().try_get_matches_from(vec!["playlistloader"]);
    assert!(result.is_err());
}
