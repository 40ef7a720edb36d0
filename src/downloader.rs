// src/downloader.rs
// Single-job execution: existing-file check, yt-dlp call, post-processing

use crate::command::{build_ytdlp_command, YtDlpCommand};
use crate::config::Config;
use crate::error::AppError;
use crate::job::DownloadJob;
use crate::profiles::DjProfile;
use crate::reencode::{FfmpegReencoder, Reencoder};
use crate::registry::{JsonTrackRegistry, TrackInfo, TrackRegistry};
use crate::tagging::{LoftyTagger, Tagger};
use crate::utils::{extension_of, find_downloaded_file, find_existing_audio, track_label};
use log::{debug, error, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

/// Captured result of an external tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs an external command to completion
pub trait ToolRunner: Send + Sync {
    fn run(&self, command: &YtDlpCommand) -> Result<ToolOutput, AppError>;
}

/// Spawns the real process
#[derive(Debug, Default, Clone)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, command: &YtDlpCommand) -> Result<ToolOutput, AppError> {
        debug!("Running: {}", command);
        let output = command
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => AppError::MissingDependency(format!(
                    "'{}' was not found. Install it or set YtDlpPath",
                    command.program
                )),
                io::ErrorKind::PermissionDenied => AppError::DownloadError(format!(
                    "permission denied when starting '{}'",
                    command.program
                )),
                _ => AppError::DownloadError(format!(
                    "failed to start '{}': {}",
                    command.program, e
                )),
            })?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Processes one job and reports whether it succeeded
pub trait JobRunner: Send + Sync {
    fn run_job(&self, job: &DownloadJob) -> bool;
}

/// Downloads one job and runs the best-effort post-processing chain
pub struct JobExecutor {
    config: Arc<Config>,
    profile: DjProfile,
    tool: Arc<dyn ToolRunner>,
    reencoder: Arc<dyn Reencoder>,
    tagger: Arc<dyn Tagger>,
    registry: Option<Arc<dyn TrackRegistry>>,
}

impl JobExecutor {
    pub fn new(
        config: Arc<Config>,
        tool: Arc<dyn ToolRunner>,
        reencoder: Arc<dyn Reencoder>,
        tagger: Arc<dyn Tagger>,
        registry: Option<Arc<dyn TrackRegistry>>,
    ) -> Self {
        let profile = DjProfile::from_config(&config);
        Self {
            config,
            profile,
            tool,
            reencoder,
            tagger,
            registry,
        }
    }

    /// Executor wired to yt-dlp, ffmpeg, lofty and (if enabled) the JSON registry
    pub fn from_config(config: Arc<Config>) -> Result<Self, AppError> {
        let registry = open_registry(&config)?;
        let reencoder = Arc::new(FfmpegReencoder::from_config(&config));
        Ok(Self::new(
            config,
            Arc::new(SystemToolRunner),
            reencoder,
            Arc::new(LoftyTagger),
            registry,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn execute(&self, job: &DownloadJob) -> bool {
        let label = track_label(job.track_index);
        let extensions = self.config.known_extensions();

        if self.config.skip_existing_files {
            let existing = find_existing_audio(&job.target_dir, &job.output_stem, &extensions);
            if !existing.is_empty() {
                for path in &existing {
                    info!("{} already present, skipping download: {}", label, path.display());
                }
                return true;
            }
        }

        let command = build_ytdlp_command(job, &self.config);
        info!("{} Downloading: {}", label, job.display_name());

        let output = match self.tool.run(&command) {
            Ok(output) => output,
            Err(e) => {
                error!("{} {}", label, e);
                return false;
            }
        };

        if !output.success() {
            error!(
                "{} yt-dlp failed (exit code {:?}) for '{}': {}",
                label,
                output.exit_code,
                job.search_query,
                output.stderr.trim()
            );
            return false;
        }

        let downloaded = match find_downloaded_file(&job.target_dir, &job.output_stem, &extensions)
        {
            Some(path) => path,
            None => {
                warn!(
                    "{} yt-dlp succeeded but no file '{}.*' was found in {}",
                    label,
                    job.output_stem,
                    job.target_dir.display()
                );
                return true;
            }
        };
        info!("{} Downloaded: {}", label, downloaded.display());

        self.post_process(job, &label, downloaded);
        true
    }

    fn post_process(&self, job: &DownloadJob, label: &str, downloaded: PathBuf) {
        let mut active = downloaded;

        let ext = extension_of(&active);
        if self.config.dj_warn_on_incompatible && !self.profile.is_ext_compatible(&ext) {
            warn!(
                "{} {} has format '{}' which is not compatible with profile {}",
                label,
                active.display(),
                ext,
                self.profile
            );
        }

        match self.reencoder.reencode_if_needed(&active) {
            Ok(Some(new_path)) => {
                info!("{} Re-encoded to {}", label, new_path.display());
                active = new_path;
            }
            Ok(None) => {}
            Err(e) => error!("{} Re-encode of {} failed: {}", label, active.display(), e),
        }

        if let Some(meta) = &job.track_meta {
            if let Err(e) = self.tagger.apply_tags(&active, meta) {
                warn!("{} Tagging {} failed: {}", label, active.display(), e);
            }
        }

        self.register(job, label, &active);
    }

    fn register(&self, job: &DownloadJob, label: &str, path: &Path) {
        let registry = match &self.registry {
            Some(registry) => registry,
            None => return,
        };
        let info = match track_info_for(job, self.config.registry_store_source_url) {
            Some(info) => info,
            None => return,
        };
        if !path.exists() {
            return;
        }

        if let Err(e) = registry.register_file_for_track(&info, path) {
            warn!("{} Registry update for {} failed: {}", label, path.display(), e);
        }
    }
}

impl JobRunner for JobExecutor {
    fn run_job(&self, job: &DownloadJob) -> bool {
        self.execute(job)
    }
}

/// Registry entry for a job; `None` when the job has no source track id
pub fn track_info_for(job: &DownloadJob, store_source_url: bool) -> Option<TrackInfo> {
    let id = job.source_track_id.clone()?;
    Some(TrackInfo {
        spotify_track_id: id,
        title: job.title.clone(),
        primary_artist: job.primary_artist.clone(),
        duration_ms: job.track_meta.as_ref().and_then(|m| m.duration_ms),
        source_url: if store_source_url {
            job.source_url.clone()
        } else {
            None
        },
    })
}

/// The JSON registry when `RegistryEnabled` is set
pub fn open_registry(config: &Config) -> Result<Option<Arc<dyn TrackRegistry>>, AppError> {
    if !config.registry_enabled {
        return Ok(None);
    }
    let registry = JsonTrackRegistry::open(config.registry_file())?;
    Ok(Some(Arc::new(registry)))
}
