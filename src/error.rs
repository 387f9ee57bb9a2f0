//! Error handling types and utilities.

/// A specialized Result type for blog-search configuration and CLI operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods. The search pipeline itself never surfaces errors to the
/// caller; it degrades to an empty result set instead.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when retrieving or decoding the search index fails.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("network failure fetching '{source_url}': {message}")]
    Network { source_url: String, message: String },
    /// The server answered with a non-success status.
    #[error("'{source_url}' responded with HTTP {status}")]
    Status { source_url: String, status: u16 },
    /// The payload was not valid JSON for an index document.
    #[error("malformed index document from '{source_url}': {error}")]
    Malformed {
        source_url: String,
        #[source]
        error: serde_json::Error,
    },
    /// The payload was `null` or had no `data` field.
    #[error("empty index document from '{source_url}'")]
    MissingData { source_url: String },
    /// The source could not be resolved to a URL.
    #[error("invalid index source '{source_url}': {message}")]
    InvalidUrl { source_url: String, message: String },
    /// A file-backed source could not be read.
    #[error("failed to read '{source_url}': {error}")]
    Io {
        source_url: String,
        #[source]
        error: std::io::Error,
    },
}
