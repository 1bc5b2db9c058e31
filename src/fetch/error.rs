use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid image URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Download of {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("Download of {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {url} failed: HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Download of {url} exceeds the {limit} byte limit")]
    TooLarge { url: String, limit: u64 },

    #[error("Content from {url} is not a decodable image: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl FetchError {
    /// True when the bytes arrived but weren't an image.
    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode { .. })
    }
}
