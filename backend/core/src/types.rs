use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What a download command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadKind {
    /// Generic file, saved under the last URL path segment.
    File,
    /// Video page, handed to the video fetcher.
    Video,
    /// Application package; same fetch path as `File`.
    App,
}

impl fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadKind::File => write!(f, "file"),
            DownloadKind::Video => write!(f, "video"),
            DownloadKind::App => write!(f, "app"),
        }
    }
}

impl FromStr for DownloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(DownloadKind::File),
            "video" => Ok(DownloadKind::Video),
            "app" => Ok(DownloadKind::App),
            other => Err(format!("unknown download kind '{other}' (expected file, video, or app)")),
        }
    }
}

/// A single download command, built per inbound message and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub kind: DownloadKind,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, kind: DownloadKind) -> Self {
        Self { url: url.into(), kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadOutcome {
    Success,
    Failure,
}

/// Result handed back to the router. Consumed immediately, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub outcome: DownloadOutcome,
    pub saved_path: Option<PathBuf>,
    pub error_detail: Option<String>,
}

impl DownloadResult {
    /// Success with the full path of the complete file on disk.
    pub fn saved(path: impl Into<PathBuf>) -> Self {
        Self {
            outcome: DownloadOutcome::Success,
            saved_path: Some(path.into()),
            error_detail: None,
        }
    }

    /// Success without a path (video downloads report no filename).
    pub fn completed() -> Self {
        Self {
            outcome: DownloadOutcome::Success,
            saved_path: None,
            error_detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            outcome: DownloadOutcome::Failure,
            saved_path: None,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == DownloadOutcome::Success
    }
}

/// Byte and chunk counters for one streamed transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    pub bytes: u64,
    /// Number of buffer-sized reads written to disk.
    pub chunks: u64,
    /// Size of the largest single read, never above the configured chunk size.
    pub largest_chunk: usize,
}

impl TransferStats {
    pub fn record(&mut self, len: usize) {
        self.bytes += len as u64;
        self.chunks += 1;
        self.largest_chunk = self.largest_chunk.max(len);
    }
}

/// Work order for the external video fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoJob {
    pub url: String,
    pub output_dir: PathBuf,
    /// Naming template relative to `output_dir`, e.g. `%(title)s.%(ext)s`.
    pub template: String,
    /// Format selector, e.g. `bestvideo+bestaudio/best`.
    pub format: String,
    /// Container the separate streams are merged into.
    pub merge_format: String,
    pub no_playlist: bool,
}

impl VideoJob {
    /// Full output template (`<output_dir>/<template>`).
    pub fn output_template(&self) -> PathBuf {
        self.output_dir.join(&self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_and_display() {
        for kind in [DownloadKind::File, DownloadKind::Video, DownloadKind::App] {
            assert_eq!(kind.to_string().parse::<DownloadKind>().unwrap(), kind);
        }
        assert!("movie".parse::<DownloadKind>().is_err());
    }

    #[test]
    fn test_result_constructors() {
        let ok = DownloadResult::saved("/tmp/downloads/report.pdf");
        assert!(ok.is_success());
        assert_eq!(ok.saved_path.as_deref(), Some(std::path::Path::new("/tmp/downloads/report.pdf")));

        let done = DownloadResult::completed();
        assert!(done.is_success());
        assert!(done.saved_path.is_none());

        let bad = DownloadResult::failed("HTTP status 404");
        assert!(!bad.is_success());
        assert!(bad.saved_path.is_none());
        assert_eq!(bad.error_detail.as_deref(), Some("HTTP status 404"));
    }

    #[test]
    fn test_transfer_stats_record() {
        let mut stats = TransferStats::default();
        stats.record(8192);
        stats.record(100);
        assert_eq!(stats.bytes, 8292);
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.largest_chunk, 8192);
    }

    #[test]
    fn test_video_output_template() {
        let job = VideoJob {
            url: "https://video.test/watch?v=1".into(),
            output_dir: PathBuf::from("downloads"),
            template: "%(title)s.%(ext)s".into(),
            format: "best".into(),
            merge_format: "mp4".into(),
            no_playlist: true,
        };
        assert_eq!(job.output_template(), PathBuf::from("downloads").join("%(title)s.%(ext)s"));
    }
}
