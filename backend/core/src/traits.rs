use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::VideoJob;

/// External capability that downloads and merges a video to disk.
///
/// Treated as opaque: it either completes, leaving one media file under
/// `job.output_dir`, or reports failure.
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    /// Name used in logs (e.g. "yt-dlp").
    fn name(&self) -> &str;

    /// Run the job to completion.
    async fn fetch(&self, job: &VideoJob) -> Result<(), FetchError>;
}
