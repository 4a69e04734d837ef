// ── Core error types ──
//
// User-facing errors from medcart-core. The `From<medcart_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants.
// Cache entries keep the raw `medcart_api::Error` instead, so views can
// inspect status codes on stale-plus-error rendering.

use thiserror::Error;

use crate::form::FieldErrors;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the storefront backend: {reason}")]
    Network { reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Not signed in or session expired: {message}")]
    Unauthorized { message: String },

    // ── Backend errors ───────────────────────────────────────────────
    #[error("{message}")]
    Api { message: String, status: Option<u16> },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Cannot decode {what}: {message}")]
    Decode { what: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Draft storage error: {0}")]
    Draft(#[from] std::io::Error),
}

impl From<medcart_api::Error> for CoreError {
    fn from(err: medcart_api::Error) -> Self {
        use medcart_api::Error as Api;

        if err.is_unauthorized() {
            return CoreError::Unauthorized {
                message: err.user_message(),
            };
        }

        match err {
            Api::Network(e) => CoreError::Network {
                reason: e.to_string(),
            },
            Api::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(message) => CoreError::Config {
                message: format!("TLS setup failed: {message}"),
            },
            Api::InvalidToken(message) => CoreError::Unauthorized { message },
            Api::Http {
                status, message, ..
            }
            | Api::Rejected { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            Api::Deserialization { message, .. } => CoreError::Decode {
                what: "response body".into(),
                message,
            },
            Api::Aborted(message) => CoreError::Api {
                message,
                status: None,
            },
        }
    }
}
