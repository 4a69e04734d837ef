//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use medcart_config::ConfigError;
use medcart_core::{CoreError, FieldErrors};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the storefront backend")]
    #[diagnostic(
        code(medcart::connection_failed),
        help(
            "Check that the backend is running and the base URL is right.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not signed in or session expired: {message}")]
    #[diagnostic(
        code(medcart::auth_failed),
        help("Sign in again with: medcart login --email <EMAIL>")
    )]
    AuthFailed { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(medcart::login_rejected),
        help("Check the email and password, and pass --role for doctor or admin accounts.")
    )]
    LoginRejected { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(medcart::not_found),
        help("Run: medcart {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(medcart::api_error))]
    Api { message: String, status: Option<u16> },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(medcart::validation))]
    Validation { field: String, reason: String },

    #[error("The form has errors: {errors}")]
    #[diagnostic(
        code(medcart::invalid_form),
        help("Fix the listed fields and run the command again.")
    )]
    InvalidForm { errors: FieldErrors },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(medcart::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: medcart config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(medcart::no_config),
        help(
            "Create a profile with: medcart config init\n\
             or pass --base-url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(medcart::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(medcart::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(medcart::timeout),
        help("Increase timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Cannot decode {what}: {message}")]
    #[diagnostic(code(medcart::decode))]
    Decode { what: String, message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::LoginRejected { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::InvalidForm { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Api { status, .. } => match status {
                Some(403) => exit_code::PERMISSION,
                Some(404) => exit_code::NOT_FOUND,
                Some(409) => exit_code::CONFLICT,
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }

    /// Error for a cache entry that settled with an error and no data.
    pub fn from_fetch(err: &medcart_api::Error) -> Self {
        if err.is_unauthorized() {
            return Self::AuthFailed {
                message: err.user_message(),
            };
        }
        match err {
            medcart_api::Error::Network(e) => Self::ConnectionFailed {
                reason: e.to_string(),
            },
            medcart_api::Error::Timeout { timeout_secs } => Self::Timeout {
                seconds: *timeout_secs,
            },
            other => Self::Api {
                message: other.user_message(),
                status: other.status(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network { reason } => Self::ConnectionFailed { reason },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Unauthorized { message } => Self::AuthFailed { message },
            CoreError::Api { message, status } => Self::Api { message, status },
            CoreError::Validation(errors) => Self::InvalidForm { errors },
            CoreError::Decode { what, message } => Self::Decode { what, message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Draft(e) => Self::Io(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
