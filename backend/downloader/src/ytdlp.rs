//! `yt-dlp` process adapter for [`VideoFetcher`].

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use fetchbot_core::{FetchError, VideoFetcher, VideoJob};

/// Longest stderr excerpt carried in an error.
const MAX_STDERR_CHARS: usize = 500;

/// Runs a yt-dlp compatible binary once per job and waits for it.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    binary: PathBuf,
    /// Passed before the generated arguments (cookies, proxies, ...).
    extra_args: Vec<String>,
    timeout: Duration,
}

impl YtDlpFetcher {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
            timeout,
        }
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Full argument list for `job`, extra args first.
    pub fn build_args(&self, job: &VideoJob) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.push("-o".to_string());
        args.push(job.output_template().to_string_lossy().into_owned());
        args.push("-f".to_string());
        args.push(job.format.clone());
        args.push("--merge-output-format".to_string());
        args.push(job.merge_format.clone());
        if job.no_playlist {
            args.push("--no-playlist".to_string());
        }
        // Keeps URLs that start with '-' from being read as options.
        args.push("--".to_string());
        args.push(job.url.clone());
        args
    }
}

#[async_trait]
impl VideoFetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, job: &VideoJob) -> Result<(), FetchError> {
        let args = self.build_args(job);
        debug!(binary = %self.binary.display(), ?args, "Spawning video fetcher");

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                FetchError::Collaborator(format!("failed to start {}: {e}", self.binary.display()))
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(FetchError::Collaborator(format!("waiting for {}: {e}", self.binary.display()))),
            Err(_) => {
                return Err(FetchError::Collaborator(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
            return Err(FetchError::Collaborator(format!(
                "exit status {}: {excerpt}",
                output.status.code().map_or_else(|| "signal".to_string(), |c| c.to_string())
            )));
        }

        info!(url = %job.url, "Video fetcher finished");
        Ok(())
    }
}
