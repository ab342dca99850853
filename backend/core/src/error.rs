use thiserror::Error;

/// Classified failure of a single fetch.
///
/// Every variant collapses to the same `Failure` outcome at the
/// `DownloadResult` level; the classification exists for logs.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("video fetcher failed: {0}")]
    Collaborator(String),
}

impl FetchError {
    /// Short stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidInput(_) => "invalid_input",
            FetchError::Transport(_) => "transport",
            FetchError::HttpStatus { .. } => "http_status",
            FetchError::Io(_) => "io",
            FetchError::Collaborator(_) => "collaborator",
        }
    }
}
