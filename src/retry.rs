// src/retry.rs
// Per-job retry loop with a fixed backoff

use crate::config::Config;
use crate::downloader::JobRunner;
use crate::job::DownloadJob;
use log::{error, warn};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Pause between two failed attempts
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.download_max_retries, config.retry_backoff())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Final result per `track_index` for one run
#[derive(Debug, Default)]
pub struct JobOutcomes {
    inner: Mutex<HashMap<usize, bool>>,
}

impl JobOutcomes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, track_index: usize, success: bool) {
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if map.insert(track_index, success).is_some() {
            warn!("Outcome for track index {} recorded twice", track_index);
        }
    }

    pub fn get(&self, track_index: usize) -> Option<bool> {
        self.snapshot().get(&track_index).copied()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> HashMap<usize, bool> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn into_map(self) -> HashMap<usize, bool> {
        self.inner.into_inner().unwrap_or_else(|p| p.into_inner())
    }
}

/// Run `job` until it succeeds or the attempts are used up, then record the result.
///
/// A panic inside an attempt counts as a failed attempt.
pub fn run_with_retries(
    runner: &dyn JobRunner,
    job: &DownloadJob,
    policy: &RetryPolicy,
    outcomes: &JobOutcomes,
    worker_label: &str,
) -> bool {
    let max_attempts = policy.max_attempts();
    let mut success = false;

    for attempt in 1..=max_attempts {
        success = match panic::catch_unwind(AssertUnwindSafe(|| runner.run_job(job))) {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "[{}] Job #{:02} panicked on attempt {}",
                    worker_label,
                    job.track_index + 1,
                    attempt
                );
                false
            }
        };

        if success {
            break;
        }

        if attempt < max_attempts {
            warn!(
                "[{}] Attempt {}/{} failed for '{}', retrying in {} ms",
                worker_label,
                attempt,
                max_attempts,
                job.search_query,
                policy.backoff.as_millis()
            );
            if !policy.backoff.is_zero() {
                thread::sleep(policy.backoff);
            }
        } else {
            error!(
                "[{}] Giving up on '{}' after {} attempt(s)",
                worker_label, job.search_query, max_attempts
            );
        }
    }

    outcomes.record(job.track_index, success);
    success
}
