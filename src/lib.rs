// src/lib.rs
// playlistloader as a library: planning, downloading and post-processing of exported playlists

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analyzer;
pub mod cli;
pub mod command;
pub mod config;
pub mod dependency_validator;
pub mod download_manager;
pub mod downloader;
pub mod error;
pub mod job;
pub mod playlist;
pub mod profiles;
pub mod reencode;
pub mod registry;
pub mod retry;
pub mod summary;
pub mod tagging;
pub mod utils;

pub use config::Config;
pub use download_manager::{DownloadScheduler, RunPhase, RunReport, WorkQueue};
pub use downloader::{JobExecutor, JobRunner, ToolOutput, ToolRunner};
pub use error::AppError;
pub use job::{DownloadJob, TrackMeta};
pub use retry::{run_with_retries, JobOutcomes, RetryPolicy};
pub use summary::RunSummary;
