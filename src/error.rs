use std::path::PathBuf;

/// All errors that can occur in subsum.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request allowance exhausted for instance {instance_key}")]
    QuotaExhausted { instance_key: u16 },

    #[error("invalid port {port}: must be within {min}..={max}")]
    InvalidPort { port: u16, min: u16, max: u16 },

    #[error("API key file not found: {path}")]
    ApiKeyNotFound { path: PathBuf },

    #[error("download error: {0}")]
    Download(String),

    #[error("yt-dlp not found — install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("caption file not found: {path}")]
    CaptionNotFound { path: PathBuf },

    #[error("summarization error: {0}")]
    Summarization(String),

    #[error("counter store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is a pure rejection that consumed no allowance.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, Error::QuotaExhausted { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
