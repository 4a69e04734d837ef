use thiserror::Error;

/// Message used when the backend gives no usable `message` field.
pub(crate) fn generic_message(status: u16) -> String {
    format!("Request failed with status {status}")
}

/// Top-level error type for the `medcart-api` crate.
///
/// Covers every failure mode of a single request against the storefront
/// backend. `medcart-core` stores these in cache entries and folds them
/// into mutation results.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Transport-level failure (DNS, connection refused, reset, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// URL parsing error (bad base URL or resource key).
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The bearer token cannot be encoded as a header value.
    #[error("Invalid bearer token: {0}")]
    InvalidToken(String),

    // ── Backend responses ───────────────────────────────────────────
    /// Non-2xx response. `message` is decoded from the body when present.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    /// 2xx response whose envelope carried `success: false`.
    #[error("Request rejected: {message}")]
    Rejected { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The request future panicked before producing a response.
    #[error("Request aborted: {0}")]
    Aborted(String),
}

impl Error {
    /// HTTP status associated with this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::Rejected { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the server refused our credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Nothing in this crate retries on its own; callers decide.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// A message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } | Self::Rejected { message, .. } => message.clone(),
            Self::Network(_) => "Unable to reach the server. Check your connection.".into(),
            Self::Timeout { .. } => "The server took too long to respond.".into(),
            other => other.to_string(),
        }
    }
}
