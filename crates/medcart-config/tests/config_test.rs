// Config file loading and translation to `ClientConfig`.
#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};

use medcart_config::{
    Config, ConfigError, Defaults, Profile, build_client_config, load_config_from, save_config_to,
};
use medcart_core::TlsVerification;

const SAMPLE: &str = r#"
default_profile = "staging"

[defaults]
output = "json"
timeout = 15

[profiles.staging]
base_url = "https://staging.medcart.id"
dedupe_interval_ms = 500
idle_eviction_secs = 60
drafts_dir = "/var/tmp/medcart-drafts"

[profiles.local]
base_url = "http://localhost:8080"
insecure = true
timeout = 5
"#;

fn write_sample() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();
    (dir, path)
}

#[test]
fn loads_profiles_and_defaults() {
    let (_dir, path) = write_sample();
    let config = load_config_from(&path).unwrap();

    assert_eq!(config.defaults.output, "json");
    assert_eq!(config.defaults.color, "auto");
    assert_eq!(config.profiles.len(), 2);

    let (name, profile) = config.profile(None).unwrap();
    assert_eq!(name, "staging");
    assert_eq!(profile.base_url, "https://staging.medcart.id");

    let (name, _) = config.profile(Some("local")).unwrap();
    assert_eq!(name, "local");
    assert!(matches!(
        config.profile(Some("prod")),
        Err(ConfigError::ProfileNotFound { ref name }) if name == "prod"
    ));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.default_profile.as_deref(), Some("default"));
    assert!(config.profiles.is_empty());
}

#[test]
fn profile_translates_to_client_config() {
    let (_dir, path) = write_sample();
    let config = load_config_from(&path).unwrap();
    let (_, staging) = config.profile(Some("staging")).unwrap();

    let client = build_client_config(
        staging,
        &config.defaults,
        Some(SecretString::from("tok-1".to_owned())),
    )
    .unwrap();

    assert_eq!(client.base_url.as_str(), "https://staging.medcart.id/");
    assert_eq!(client.timeout, Duration::from_secs(15));
    assert_eq!(client.tls, TlsVerification::SystemDefaults);
    assert_eq!(client.cache.dedupe_interval, Duration::from_millis(500));
    assert_eq!(client.cache.focus_throttle, Duration::from_secs(5));
    assert_eq!(client.cache.idle_eviction, Duration::from_secs(60));
    assert_eq!(client.drafts_dir, Some(PathBuf::from("/var/tmp/medcart-drafts")));
    assert_eq!(client.token.unwrap().expose_secret(), "tok-1");

    let (_, local) = config.profile(Some("local")).unwrap();
    let client = build_client_config(local, &config.defaults, None).unwrap();
    assert_eq!(client.tls, TlsVerification::DangerAcceptInvalid);
    assert_eq!(client.timeout, Duration::from_secs(5));
}

#[test]
fn rejects_non_http_base_url() {
    let profile = Profile {
        base_url: "ftp://files.medcart.id".into(),
        ..Profile::default()
    };
    let err = build_client_config(&profile, &Defaults::default(), None).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "base_url"));
}

#[test]
fn save_then_load_keeps_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.profiles.insert(
        "default".into(),
        Profile {
            base_url: "https://api.medcart.id".into(),
            timeout: Some(20),
            ..Profile::default()
        },
    );
    save_config_to(&config, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let (_, profile) = loaded.profile(None).unwrap();
    assert_eq!(profile.base_url, "https://api.medcart.id");
    assert_eq!(profile.timeout, Some(20));
}
