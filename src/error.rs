//! Error types for the fetch pipeline, catalog and storage.

/// Errors produced by this crate.
///
/// `InvalidInput` is fatal for a whole request. Everything else raised while fetching
/// a single (indicator, country) pair is caught by the collector and turned into a
/// [`PairFailure`](crate::collect::PairFailure).
#[derive(Debug, thiserror::Error)]
pub enum WdiError {
    /// Bad year range or codes that sanitize to nothing.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport failure, including timeouts.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("request failed with HTTP {status}: {url}")]
    Status { status: u16, url: String },

    /// The API returned its `[{"message": ...}]` error envelope.
    #[error("world bank api error: {0}")]
    Api(String),

    /// The body parsed as JSON but not into the expected envelope.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    /// The worker pool for the fan-out could not be built.
    #[error("failed to build worker pool: {0}")]
    Pool(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, WdiError>;
