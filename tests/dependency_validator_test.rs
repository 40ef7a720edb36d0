// tests/dependency_validator_test.rs
use playlistloader::dependency_validator::{
    get_dependency_info, is_minimum_version, parse_version, MIN_FFMPEG_VERSION, MIN_YTDLP_VERSION,
};
use playlistloader::error::AppError;

// Requires yt-dlp on the PATH
#[test]
#[ignore]
fn test_ytdlp_detection() {
    let info = get_dependency_info("yt-dlp", "yt-dlp").expect("yt-dlp should be installed");
    assert_eq!(info.name, "yt-dlp");
    assert_ne!(info.version, "unknown");
}

#[test]
fn test_missing_program_is_reported() {
    let result = get_dependency_info("yt-dlp", "definitely-not-installed-ytdlp-binary");
    assert!(matches!(result, Err(AppError::MissingDependency(_))));
}

#[test]
fn test_version_constants_format() {
    // yt-dlp uses YYYY.MM.DD
    let ytdlp_parts: Vec<&str> = MIN_YTDLP_VERSION.split('.').collect();
    assert_eq!(ytdlp_parts.len(), 3, "yt-dlp version should have three parts");
    assert_eq!(ytdlp_parts[0].len(), 4, "First part should be 4-digit year");
    let month = ytdlp_parts[1].parse::<u8>().expect("Month should be a number");
    assert!((1..=12).contains(&month));

    let ffmpeg_parts: Vec<&str> = MIN_FFMPEG_VERSION.split('.').collect();
    assert!(ffmpeg_parts.len() >= 2);
    for part in ffmpeg_parts {
        assert!(part.parse::<u32>().is_ok(), "Version part should be numeric");
    }
}

#[test]
fn test_ffmpeg_version_parsing() {
    let test_cases = [
        (
            "ffmpeg version 4.4.2 Copyright (c) 2000-2021 the FFmpeg developers",
            "4.4.2",
        ),
        ("ffmpeg version n5.1.2 Copyright (c) 2000-2022", "5.1.2"),
        ("ffmpeg version 6.0-static https://johnvansickle.com", "6.0"),
        (
            "ffmpeg version git-2023-01-01-5.1.2 Copyright (c) 2000-2023",
            "5.1.2",
        ),
    ];

    for (output, expected) in test_cases {
        assert_eq!(parse_version(output, "ffmpeg"), expected, "input: {}", output);
    }
}

#[test]
fn test_ytdlp_version_parsing() {
    assert_eq!(parse_version("2024.03.10\n", "yt-dlp"), "2024.03.10");
    assert_eq!(parse_version("yt-dlp 2023.7.6", "yt-dlp"), "2023.7.6");
    assert_eq!(parse_version("no digits here", "yt-dlp"), "unknown");
}

#[test]
fn test_minimum_version_comparison() {
    assert!(is_minimum_version("2024.03.10", MIN_YTDLP_VERSION));
    assert!(is_minimum_version("2023.07.06", MIN_YTDLP_VERSION));
    assert!(!is_minimum_version("2022.08.14", MIN_YTDLP_VERSION));

    assert!(is_minimum_version("4.4", MIN_FFMPEG_VERSION));
    assert!(is_minimum_version("6.0.1", MIN_FFMPEG_VERSION));
    assert!(!is_minimum_version("3.4.8", MIN_FFMPEG_VERSION));
    assert!(!is_minimum_version("unknown", MIN_FFMPEG_VERSION));
}
