// src/cli.rs

use clap::builder::RangedU64ValueParser;
use clap::{value_parser, Arg, ArgAction, Command};

fn playlist_id_arg() -> Arg {
    Arg::new("playlist-id")
        .long("playlist-id")
        .short('p')
        .help("Spotify playlist ID whose exported JSON should be used")
        .value_name("PLAYLIST_ID")
        .required(true)
}

fn limit_arg() -> Arg {
    Arg::new("limit")
        .long("limit")
        .short('l')
        .help("Only process the first N tracks")
        .value_name("N")
        .value_parser(value_parser!(usize))
}

/// Build the command-line interface for the application
pub fn build_cli() -> Command {
    Command::new("playlistloader")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Ibrahim Mohamed")
        .about("Downloads exported playlists as DJ-ready audio files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a config.json (overrides $PLAYLISTLOADER_CONFIG)")
                .value_name("PATH")
                .global(true),
        )
        .subcommand(
            Command::new("plan-downloads")
                .about("Dry run: show the planned jobs and yt-dlp invocations")
                .arg(playlist_id_arg())
                .arg(limit_arg()),
        )
        .subcommand(
            Command::new("run-downloads")
                .about("Download all tracks of a playlist and post-process them")
                .arg(playlist_id_arg())
                .arg(limit_arg())
                .arg(
                    Arg::new("parallel")
                        .long("parallel")
                        .help("Maximum number of parallel downloads (overrides MaxParallelDownloads)")
                        .value_name("N")
                        .value_parser(RangedU64ValueParser::<usize>::new().range(1..)),
                )
                .arg(
                    Arg::new("retries")
                        .long("retries")
                        .help("Retries per failed download (overrides DownloadMaxRetries)")
                        .value_name("N")
                        .value_parser(value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("retag-playlist")
                .about("Re-apply tags to already downloaded files")
                .arg(playlist_id_arg())
                .arg(limit_arg())
                .arg(
                    Arg::new("no-registry")
                        .long("no-registry")
                        .help("Do not update the track registry")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("analyze-playlist")
                .about("Show formats, sizes and DJ compatibility of a playlist folder")
                .arg(playlist_id_arg()),
        )
        .subcommand(
            Command::new("export-queries")
                .about("Write one yt-dlp search query per track into a text file")
                .arg(playlist_id_arg())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Target file (default: <OutputDirectory>/<YTDLP_TextFilePattern>)")
                        .value_name("PATH"),
                ),
        )
        .subcommand(
            Command::new("check-deps").about("Check that yt-dlp and ffmpeg are installed"),
        )
}
