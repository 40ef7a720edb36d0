// src/download_manager.rs
// Run scheduling: shared work queue, blocking worker pool, retag runs

use crate::command::build_ytdlp_command;
use crate::config::Config;
use crate::downloader::{open_registry, track_info_for, JobExecutor, JobRunner};
use crate::error::AppError;
use crate::job::{plan_downloads_for_playlist, DownloadJob};
use crate::registry::TrackRegistry;
use crate::retry::{run_with_retries, JobOutcomes, RetryPolicy};
use crate::summary::RunSummary;
use crate::tagging::{LoftyTagger, Tagger};
use crate::utils::{find_downloaded_file, track_label};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

/// Lifecycle of one download run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    Planning,
    Dispatching,
    Draining,
    Summarized,
}

/// FIFO of jobs shared by all workers of a run.
///
/// Every job is claimed by exactly one worker and acknowledged once processed.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<DownloadJob>>,
    enqueued: AtomicUsize,
    acknowledged: AtomicUsize,
}

impl WorkQueue {
    pub fn new(jobs: impl IntoIterator<Item = DownloadJob>) -> Self {
        let items: VecDeque<DownloadJob> = jobs.into_iter().collect();
        let enqueued = items.len();
        Self {
            items: Mutex::new(items),
            enqueued: AtomicUsize::new(enqueued),
            acknowledged: AtomicUsize::new(0),
        }
    }

    /// Take the next job, `None` once the queue is empty
    pub fn claim(&self) -> Option<DownloadJob> {
        self.items
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
    }

    pub fn ack(&self) {
        self.acknowledged.fetch_add(1, Ordering::SeqCst);
    }

    pub fn pending(&self) -> usize {
        self.items.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn enqueued(&self) -> usize {
        self.enqueued.load(Ordering::SeqCst)
    }

    pub fn acknowledged(&self) -> usize {
        self.acknowledged.load(Ordering::SeqCst)
    }

    /// All jobs claimed, processed and acknowledged
    pub fn is_drained(&self) -> bool {
        self.pending() == 0 && self.acknowledged() == self.enqueued()
    }
}

/// Number of workers for a batch: `min(max_parallel, job_count)`, at least one
/// as long as there is work
pub fn worker_count(max_parallel: usize, job_count: usize) -> usize {
    if job_count == 0 {
        0
    } else {
        max_parallel.max(1).min(job_count)
    }
}

/// Result of a dispatched batch
#[derive(Debug)]
pub struct RunReport {
    pub jobs: Vec<DownloadJob>,
    pub outcomes: HashMap<usize, bool>,
    pub workers_started: usize,
    pub summary: RunSummary,
}

/// Distributes jobs over a pool of blocking workers and collects their outcomes
pub struct DownloadScheduler {
    runner: Arc<dyn JobRunner>,
    policy: RetryPolicy,
    max_parallel: usize,
    show_progress: bool,
    phase: RunPhase,
}

impl DownloadScheduler {
    pub fn new(runner: Arc<dyn JobRunner>, policy: RetryPolicy, max_parallel: usize) -> Self {
        Self {
            runner,
            policy,
            max_parallel,
            show_progress: false,
            phase: RunPhase::NotStarted,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!("Run phase: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Plan the jobs of a playlist and run them.
    ///
    /// `Ok(None)` when there is nothing to download.
    pub async fn run_playlist(
        &mut self,
        config: &Config,
        playlist_id: &str,
        limit: Option<usize>,
    ) -> Result<Option<RunReport>, AppError> {
        self.enter(RunPhase::Planning);
        let jobs = plan_downloads_for_playlist(config, playlist_id, limit)?;
        if jobs.is_empty() {
            warn!("No downloadable tracks in playlist {}", playlist_id);
            return Ok(None);
        }
        Ok(Some(self.dispatch(jobs).await))
    }

    /// Run every job through the retry wrapper and wait for all workers
    pub async fn dispatch(&mut self, mut jobs: Vec<DownloadJob>) -> RunReport {
        self.enter(RunPhase::Dispatching);
        jobs.sort_by_key(|job| job.track_index);

        let workers = worker_count(self.max_parallel, jobs.len());
        let queue = Arc::new(WorkQueue::new(jobs.iter().cloned()));
        let outcomes = Arc::new(JobOutcomes::new());
        let progress = self.progress_bar(jobs.len());

        if workers <= 1 {
            info!("Processing {} job(s) sequentially", jobs.len());
        } else {
            info!(
                "Processing {} job(s) with {} parallel workers",
                jobs.len(),
                workers
            );
        }

        let mut set = JoinSet::new();
        for worker_id in 0..workers {
            let runner = Arc::clone(&self.runner);
            let queue = Arc::clone(&queue);
            let outcomes = Arc::clone(&outcomes);
            let progress = progress.clone();
            let policy = self.policy;
            set.spawn_blocking(move || {
                worker_loop(
                    worker_id,
                    runner.as_ref(),
                    &queue,
                    &policy,
                    &outcomes,
                    &progress,
                )
            });
        }

        self.enter(RunPhase::Draining);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(processed) => debug!("Worker finished after {} job(s)", processed),
                Err(e) => error!("Download worker terminated abnormally: {}", e),
            }
        }
        progress.finish_and_clear();

        if !queue.is_drained() {
            warn!(
                "{} of {} job(s) were not acknowledged",
                queue.enqueued() - queue.acknowledged(),
                queue.enqueued()
            );
        }

        let outcomes = match Arc::try_unwrap(outcomes) {
            Ok(outcomes) => outcomes.into_map(),
            Err(shared) => shared.snapshot(),
        };

        self.enter(RunPhase::Summarized);
        let summary = RunSummary::from_outcomes(&jobs, &outcomes);
        RunReport {
            jobs,
            outcomes,
            workers_started: workers,
            summary,
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar
    }
}

fn worker_loop(
    worker_id: usize,
    runner: &dyn JobRunner,
    queue: &WorkQueue,
    policy: &RetryPolicy,
    outcomes: &JobOutcomes,
    progress: &ProgressBar,
) -> usize {
    let label = format!("worker-{}", worker_id + 1);
    let mut processed = 0;

    while let Some(job) = queue.claim() {
        progress.set_message(job.display_name());
        run_with_retries(runner, &job, policy, outcomes, &label);
        queue.ack();
        progress.inc(1);
        processed += 1;
    }

    processed
}

/// Full pipeline for one playlist: plan, download, post-process, print the summary
pub async fn run_downloads_for_playlist(
    config: Arc<Config>,
    playlist_id: &str,
    limit: Option<usize>,
) -> Result<Option<RunSummary>, AppError> {
    let executor = JobExecutor::from_config(Arc::clone(&config))?;
    let mut scheduler = DownloadScheduler::new(
        Arc::new(executor),
        RetryPolicy::from_config(&config),
        config.max_parallel_downloads,
    )
    .with_progress(config.show_progress);

    let report = match scheduler.run_playlist(&config, playlist_id, limit).await? {
        Some(report) => report,
        None => {
            println!("{}", "No tracks to download.".yellow());
            return Ok(None);
        }
    };

    report.summary.print();
    Ok(Some(report.summary))
}

/// Dry run: print every job with its target and tool invocation
pub fn print_download_plan(config: &Config, jobs: &[DownloadJob]) {
    if jobs.is_empty() {
        println!("{}", "No tracks to download.".yellow());
        return;
    }

    println!(
        "{} {}",
        "Planned downloads:".bright_cyan().bold(),
        jobs.len()
    );
    for job in jobs {
        println!(
            "{} {}",
            track_label(job.track_index).bright_white().bold(),
            job.display_name()
        );
        println!(
            "    target:  {}",
            job.target_template()
                .display()
                .to_string()
                .green()
        );
        println!("    command: {}", build_ytdlp_command(job, config));
    }
}

/// Counts of a retag run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetagSummary {
    pub tagged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub registered: usize,
}

impl RetagSummary {
    pub fn print(&self) {
        println!("\n{}", "========== RETAG-SUMMARY ==========".bright_cyan().bold());
        println!("Tagged: {}", self.tagged.to_string().green());
        println!("Skipped (no file): {}", self.skipped.to_string().yellow());
        println!("Failed: {}", self.failed.to_string().red());
        println!("Registered: {}", self.registered);
    }
}

/// Re-apply tags (and registry entries) to already downloaded files
pub fn retag_downloads_for_playlist(
    config: &Config,
    playlist_id: &str,
    limit: Option<usize>,
    tagger: &dyn Tagger,
    registry: Option<&dyn TrackRegistry>,
) -> Result<RetagSummary, AppError> {
    let jobs = plan_downloads_for_playlist(config, playlist_id, limit)?;
    let extensions = config.known_extensions();
    let mut summary = RetagSummary::default();

    for job in &jobs {
        let label = track_label(job.track_index);
        let path = match find_downloaded_file(&job.target_dir, &job.output_stem, &extensions) {
            Some(path) => path,
            None => {
                debug!("{} No file for '{}', skipping", label, job.output_stem);
                summary.skipped += 1;
                continue;
            }
        };

        if let Some(meta) = &job.track_meta {
            if let Err(e) = tagger.apply_tags(&path, meta) {
                warn!("{} Tagging {} failed: {}", label, path.display(), e);
                summary.failed += 1;
                continue;
            }
        }
        summary.tagged += 1;
        info!("{} Tagged {}", label, path.display());

        if let (Some(registry), Some(info)) = (
            registry,
            track_info_for(job, config.registry_store_source_url),
        ) {
            match registry.register_file_for_track(&info, &path) {
                Ok(()) => summary.registered += 1,
                Err(e) => warn!("{} Registry update for {} failed: {}", label, path.display(), e),
            }
        }
    }

    Ok(summary)
}

/// Retag with lofty and, unless disabled, the configured registry
pub fn retag_playlist(
    config: &Config,
    playlist_id: &str,
    limit: Option<usize>,
    use_registry: bool,
) -> Result<RetagSummary, AppError> {
    let registry = if use_registry {
        open_registry(config)?
    } else {
        None
    };
    let summary = retag_downloads_for_playlist(
        config,
        playlist_id,
        limit,
        &LoftyTagger,
        registry.as_deref(),
    )?;
    summary.print();
    Ok(summary)
}
