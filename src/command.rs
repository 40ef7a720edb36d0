// src/command.rs
// yt-dlp command construction

use crate::config::Config;
use crate::job::DownloadJob;
use std::fmt;
use std::process::Command;

/// A fully built external tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YtDlpCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl YtDlpCommand {
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for YtDlpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=%+,@".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// `bestaudio[ext=a]/bestaudio[ext=b]/.../bestaudio/best`
pub fn format_selector(preferred_formats: &[String]) -> String {
    let mut parts: Vec<String> = preferred_formats
        .iter()
        .map(|f| f.trim().trim_start_matches('.'))
        .filter(|f| !f.is_empty())
        .map(|f| format!("bestaudio[ext={}]", f))
        .collect();
    parts.push("bestaudio".to_string());
    parts.push("best".to_string());
    parts.join("/")
}

/// Build the yt-dlp invocation for one job
pub fn build_ytdlp_command(job: &DownloadJob, config: &Config) -> YtDlpCommand {
    let output_template = job
        .target_dir
        .join(format!("{}.%(ext)s", job.output_stem))
        .to_string_lossy()
        .into_owned();

    YtDlpCommand {
        program: config.ytdlp_path.clone(),
        args: vec![
            "--no-playlist".to_string(),
            "-f".to_string(),
            format_selector(&config.audio_preferred_formats),
            "-o".to_string(),
            output_template,
            format!("{}{}", config.search_prefix, job.search_query),
        ],
    }
}
