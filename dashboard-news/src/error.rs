//! Error types for the news module

use thiserror::Error;

/// Errors that can occur while fetching or normalizing feeds
#[derive(Debug, Error)]
pub enum NewsError {
    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Proxy answered with a non-success HTTP status
    #[error("HTTP error (status {status}): {message}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Context for the failure
        message: String,
    },

    /// Proxy answered 200 but reported a failed conversion
    #[error("Proxy status \"{status}\": {message}")]
    ProxyStatus {
        status: String,
        message: String,
    },

    /// Failed to parse the proxy payload
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Feed did not answer within the per-source timeout
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// A single feed item could not be normalized
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
