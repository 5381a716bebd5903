//! Error types for the quote proxy.

use thiserror::Error;

/// Failure modes of a quote lookup, from login to response parsing.
///
/// Every variant is returned as data, never raised across a batch: a failed
/// instrument occupies its own result slot and the remaining lookups proceed.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// A session could not be established, or credentials are missing.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The vendor answered with a non-success status code.
    #[error("Upstream HTTP {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    /// Network-level failure before any vendor response was read.
    #[error("Network error: {0}")]
    Transport(String),

    /// The response parsed but carried no usable price field.
    #[error("No usable price for {0}")]
    PriceNotFound(String),

    /// The response was not in the expected list/record form. Carries the raw
    /// payload for diagnostics instead of silently returning nothing.
    #[error("Unexpected response shape: {payload}")]
    ShapeMismatch { payload: serde_json::Value },
}

/// Result type alias for quote operations.
pub type QuoteResult<T> = Result<T, QuoteError>;
