//! CLI configuration -- thin wrapper around `medcart_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--base-url, --token, --insecure, --timeout).

use secrecy::SecretString;

use medcart_core::{ClientConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use medcart_config::{
    Config, Profile, config_path, forget_token, load_config_or_default, save_config, store_token,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
///
/// CLI flag overrides take priority over profile values. Without a
/// profile, `--base-url` alone is enough to browse anonymously.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let fallback;
    let profile = if let Some(profile) = cfg.profiles.get(&profile_name) {
        profile
    } else if let Some(ref url) = global.base_url {
        fallback = Profile {
            base_url: url.clone(),
            ..Profile::default()
        };
        &fallback
    } else if global.profile.is_some() {
        let available: Vec<_> = cfg.profiles.keys().cloned().collect();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    } else {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    };

    let mut overridden = Profile {
        base_url: global
            .base_url
            .clone()
            .unwrap_or_else(|| profile.base_url.clone()),
        timeout: global.timeout.or(profile.timeout),
        ..profile.clone()
    };
    if global.insecure {
        overridden.insecure = Some(true);
    }

    let token = match global.token {
        Some(ref token) => Some(SecretString::from(token.clone())),
        None => medcart_config::resolve_token(profile, &profile_name),
    };

    let config = medcart_config::build_client_config(&overridden, &cfg.defaults, token)?;
    if config.tls == TlsVerification::DangerAcceptInvalid {
        tracing::warn!("TLS certificate verification is disabled");
    }
    Ok(config)
}
