// src/summary.rs

use crate::job::DownloadJob;
use crate::utils::track_label;
use colored::*;
use std::collections::HashMap;
use std::fmt;

const HEADER: &str = "========== DOWNLOAD-SUMMARY ==========";
const RULE: &str = "======================================";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedJob {
    pub track_index: usize,
    pub artist: String,
    pub title: String,
}

/// Aggregate result of one download run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Ordered by `track_index`
    pub failed_jobs: Vec<FailedJob>,
}

impl RunSummary {
    /// Jobs without a recorded outcome count as failed
    pub fn from_outcomes(jobs: &[DownloadJob], outcomes: &HashMap<usize, bool>) -> Self {
        let mut failed_jobs: Vec<FailedJob> = jobs
            .iter()
            .filter(|job| !outcomes.get(&job.track_index).copied().unwrap_or(false))
            .map(|job| FailedJob {
                track_index: job.track_index,
                artist: job.primary_artist.clone(),
                title: job.title.clone(),
            })
            .collect();
        failed_jobs.sort_by_key(|f| f.track_index);

        let total = jobs.len();
        let failed = failed_jobs.len();
        Self {
            total,
            succeeded: total - failed,
            failed,
            failed_jobs,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Print the summary to the console with colors
    pub fn print(&self) {
        println!("\n{}", HEADER.bright_cyan().bold());
        println!("Gesamt: {}", self.total);
        println!("Erfolgreich: {}", self.succeeded.to_string().green());
        if self.failed > 0 {
            println!("Fehlgeschlagen: {}", self.failed.to_string().red());
        } else {
            println!("Fehlgeschlagen: {}", self.failed);
        }
        println!("{}", RULE.bright_cyan());

        if !self.failed_jobs.is_empty() {
            println!("{}", "Fehlgeschlagene Titel:".yellow());
            for job in &self.failed_jobs {
                println!("{}", failed_line(job).red());
            }
        }
    }
}

fn failed_line(job: &FailedJob) -> String {
    format!(
        "- {} | {} - {}",
        track_label(job.track_index),
        job.artist,
        job.title
    )
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", HEADER)?;
        writeln!(f, "Gesamt: {}", self.total)?;
        writeln!(f, "Erfolgreich: {}", self.succeeded)?;
        writeln!(f, "Fehlgeschlagen: {}", self.failed)?;
        write!(f, "{}", RULE)?;
        if !self.failed_jobs.is_empty() {
            write!(f, "\nFehlgeschlagene Titel:")?;
            for job in &self.failed_jobs {
                write!(f, "\n{}", failed_line(job))?;
            }
        }
        Ok(())
    }
}
