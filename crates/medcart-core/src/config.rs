// ── Runtime client configuration ──
//
// Describes how to reach the storefront backend and how the cache behaves.
// Carries credentials but never touches disk; the CLI builds a
// `ClientConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use medcart_api::{TlsMode, TransportConfig};

use crate::cache::CacheConfig;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (local development backends).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Everything needed to build a [`Storefront`](crate::context::Storefront).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g. `https://api.medcart.id`).
    pub base_url: Url,
    /// Bearer token from a previous login, if any.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    pub timeout: Duration,
    pub cache: CacheConfig,
    /// Where form drafts are kept. Drafts are disabled when `None`.
    pub drafts_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            cache: CacheConfig::default(),
            drafts_dir: None,
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            ..TransportConfig::default()
        }
    }
}
