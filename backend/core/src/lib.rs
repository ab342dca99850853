pub mod error;
pub mod message;
pub mod traits;
pub mod types;

pub use error::FetchError;
pub use message::{InboundMessage, OutboundReply};
pub use traits::VideoFetcher;
pub use types::{
    DownloadKind, DownloadOutcome, DownloadRequest, DownloadResult, TransferStats, VideoJob,
};
