//! Fetchbot download service.
//!
//! Streams generic files to a destination directory in bounded memory and
//! delegates videos to an injected [`VideoFetcher`](fetchbot_core::VideoFetcher).

pub mod filename;
pub mod service;
pub mod stream;
pub mod ytdlp;

pub use filename::{derive_filename, FALLBACK_FILENAME};
pub use service::{DownloadService, DownloadSettings, SavedFile, VideoSettings};
pub use stream::DEFAULT_CHUNK_SIZE;
pub use ytdlp::YtDlpFetcher;
