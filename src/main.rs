// src/main.rs

use clap::ArgMatches;
use colored::*;
use env_logger::Builder;
use log::{debug, info, LevelFilter};
use playlistloader::analyzer::print_playlist_analysis;
use playlistloader::cli::build_cli;
use playlistloader::config::Config;
use playlistloader::dependency_validator::validate_dependencies;
use playlistloader::download_manager::{
    print_download_plan, retag_playlist, run_downloads_for_playlist,
};
use playlistloader::error::AppError;
use playlistloader::job::plan_downloads_for_playlist;
use playlistloader::playlist::export_search_queries;
use playlistloader::VERSION;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logger();
    info!("playlistloader starting up - version {}", VERSION);

    let matches = build_cli().get_matches();

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let mut config = Config::load(config_path.as_deref())?;
    debug!("Effective configuration: {:?}", config);

    match matches.subcommand() {
        Some(("plan-downloads", sub)) => {
            let playlist_id = playlist_id(sub)?;
            let jobs = plan_downloads_for_playlist(&config, playlist_id, limit(sub))?;
            print_download_plan(&config, &jobs);
        }
        Some(("run-downloads", sub)) => {
            let playlist_id = playlist_id(sub)?;
            if let Some(parallel) = sub.get_one::<usize>("parallel") {
                config.max_parallel_downloads = *parallel;
            }
            if let Some(retries) = sub.get_one::<u32>("retries") {
                config.download_max_retries = *retries;
            }
            config.validate()?;
            run_downloads_for_playlist(Arc::new(config), playlist_id, limit(sub)).await?;
        }
        Some(("retag-playlist", sub)) => {
            let playlist_id = playlist_id(sub)?;
            let use_registry = !sub.get_flag("no-registry");
            retag_playlist(&config, playlist_id, limit(sub), use_registry)?;
        }
        Some(("analyze-playlist", sub)) => {
            print_playlist_analysis(&config, playlist_id(sub)?)?;
        }
        Some(("export-queries", sub)) => {
            let output = sub.get_one::<String>("output").map(PathBuf::from);
            let path = export_search_queries(&config, playlist_id(sub)?, output.as_deref())?;
            println!("{} {}", "Search queries written to".green(), path.display());
        }
        Some(("check-deps", _)) => {
            validate_dependencies(&config);
        }
        _ => {
            build_cli().print_help()?;
        }
    }

    Ok(())
}

fn playlist_id(matches: &ArgMatches) -> Result<&str, AppError> {
    matches
        .get_one::<String>("playlist-id")
        .map(String::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::ValidationError("--playlist-id must not be empty".to_string()))
}

fn limit(matches: &ArgMatches) -> Option<usize> {
    matches.get_one::<usize>("limit").copied()
}

fn init_logger() {
    let mut builder = Builder::from_default_env();

    if cfg!(debug_assertions) {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Info);
    }

    builder.format(|buf, record| {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(
            buf,
            "[{} {} {}] {}",
            timestamp,
            record.level().to_string().to_uppercase(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    // RUST_LOG wins over the defaults above
    builder.parse_env("RUST_LOG");
    builder.init();
}
