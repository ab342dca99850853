//! Bounded-memory copy of an HTTP response body to disk.

use std::path::Path;

use futures_util::TryStreamExt;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::debug;

use fetchbot_core::{FetchError, TransferStats};

/// Default read buffer size.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Stream `response` into a newly created (or truncated) file at `path`.
///
/// The body goes through a single `chunk_size` buffer; each read is written
/// before the next one is issued. Body read failures are transport errors,
/// write failures are I/O errors. The file handle is flushed on success and
/// dropped on every path.
pub async fn stream_to_file(
    response: reqwest::Response,
    path: &Path,
    chunk_size: usize,
) -> Result<TransferStats, FetchError> {
    let body = response.bytes_stream().map_err(std::io::Error::other);
    let mut reader = StreamReader::new(Box::pin(body));

    let mut file = File::create(path).await?;
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut stats = TransferStats::default();

    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|e| FetchError::Transport(format!("reading response body: {e}")))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).await?;
        stats.record(n);
    }

    file.flush().await?;
    file.sync_all().await?;

    debug!(path = %path.display(), bytes = stats.bytes, chunks = stats.chunks, "Body written");
    Ok(stats)
}
