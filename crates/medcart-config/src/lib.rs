//! Shared configuration for medcart tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `medcart_core::ClientConfig`. The CLI adds
//! flag-aware overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use medcart_core::{CacheConfig, ClientConfig, TlsVerification};

const KEYRING_SERVICE: &str = "medcart";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile named `name`, or the default profile when `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://api.medcart.id").
    pub base_url: String,

    /// Bearer token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the bearer token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Cache dedupe window in milliseconds.
    pub dedupe_interval_ms: Option<u64>,

    /// Focus revalidation throttle in milliseconds.
    pub focus_throttle_ms: Option<u64>,

    /// Seconds an unobserved cache entry is kept.
    pub idle_eviction_secs: Option<u64>,

    /// Where form drafts are stored. Defaults to the platform data dir.
    pub drafts_dir: Option<PathBuf>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("id", "medcart", "medcart")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default directory for form drafts.
pub fn drafts_path() -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("drafts");
            p
        },
        |dirs| dirs.data_dir().join("drafts"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("medcart");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered over defaults and under `MEDCART_` env
/// vars (`MEDCART_DEFAULTS__TIMEOUT=10`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MEDCART_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credentials ─────────────────────────────────────────────────────

fn token_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/token"),
    )?)
}

/// Resolve the bearer token for a profile.
///
/// Order: the profile's `token_env` variable, the system keyring, then
/// plaintext in the config. `None` means browse anonymously.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = token_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile.token.clone().map(SecretString::from)
}

/// Save a token from a fresh login into the system keyring.
pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    token_entry(profile_name)?.set_password(token.expose_secret())?;
    Ok(())
}

/// Remove a profile's token from the keyring. Missing entries are fine.
pub fn forget_token(profile_name: &str) -> Result<(), ConfigError> {
    match token_entry(profile_name)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ClientConfig` from a profile, resolving credentials.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let token = resolve_token(profile, profile_name);
    build_client_config(profile, defaults, token)
}

/// Build a `ClientConfig` from a profile with an already-resolved token.
pub fn build_client_config(
    profile: &Profile,
    defaults: &Defaults,
    token: Option<SecretString>,
) -> Result<ClientConfig, ConfigError> {
    let base_url: url::Url = profile
        .base_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {}", profile.base_url),
        })?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("expected http or https, got '{}'", base_url.scheme()),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let base_cache = CacheConfig::default();
    let cache = CacheConfig {
        dedupe_interval: profile
            .dedupe_interval_ms
            .map_or(base_cache.dedupe_interval, Duration::from_millis),
        focus_throttle: profile
            .focus_throttle_ms
            .map_or(base_cache.focus_throttle, Duration::from_millis),
        idle_eviction: profile
            .idle_eviction_secs
            .map_or(base_cache.idle_eviction, Duration::from_secs),
    };

    let mut config = ClientConfig::new(base_url);
    config.token = token;
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.cache = cache;
    config.drafts_dir = Some(profile.drafts_dir.clone().unwrap_or_else(drafts_path));
    Ok(config)
}
