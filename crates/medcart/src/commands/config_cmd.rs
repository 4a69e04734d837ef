//! Config command handlers. None of these touch the backend.

use dialoguer::{Confirm, Input};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile, save_config};
use crate::error::CliError;
use crate::output;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Io(std::io::Error::other(e.to_string()))
}

fn parse_flag<T: std::str::FromStr>(
    field: &str,
    value: &str,
    expected: &str,
) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

fn profiles_list(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Apply `key = value` to a profile.
fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "base_url" | "base-url" => {
            let url: url::Url = parse_flag("base_url", &value, "a URL")?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(CliError::Validation {
                    field: "base_url".into(),
                    reason: "must be an http or https URL".into(),
                });
            }
            profile.base_url = value;
        }
        "token_env" | "token-env" => profile.token_env = Some(value),
        "insecure" => {
            profile.insecure = Some(parse_flag(key, &value, "'true' or 'false'")?);
        }
        "timeout" => profile.timeout = Some(parse_flag(key, &value, "a number (seconds)")?),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "dedupe_interval_ms" => {
            profile.dedupe_interval_ms = Some(parse_flag(key, &value, "a number (milliseconds)")?);
        }
        "focus_throttle_ms" => {
            profile.focus_throttle_ms = Some(parse_flag(key, &value, "a number (milliseconds)")?);
        }
        "idle_eviction_secs" => {
            profile.idle_eviction_secs = Some(parse_flag(key, &value, "a number (seconds)")?);
        }
        "drafts_dir" | "drafts-dir" => profile.drafts_dir = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: base_url, token_env, insecure, \
                     timeout, ca_cert, dedupe_interval_ms, focus_throttle_ms, \
                     idle_eviction_secs, drafts_dir"
                ),
            });
        }
    }
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("medcart setup\n");

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let base_url: String = Input::new()
                .with_prompt("Backend URL")
                .default("https://api.medcart.id".into())
                .interact_text()
                .map_err(prompt_err)?;

            let insecure = Confirm::new()
                .with_prompt("Accept invalid TLS certificates? (local development only)")
                .default(false)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile::default();
            set_key(&mut profile, "base_url", base_url)?;
            if insecure {
                profile.insecure = Some(true);
            }

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Sign in with: medcart login --email <EMAIL>");
            Ok(())
        }

        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            for profile in cfg.profiles.values_mut() {
                if profile.token.is_some() {
                    profile.token = Some("********".into());
                }
            }
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |c| c.default_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;
            save_config(&cfg)?;
            if !global.quiet {
                let message = format!("Set {key} on profile '{profile_name}'");
                output::status_line(&global.color, true, &message);
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: medcart config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: profiles_list(&cfg),
                });
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            if !global.quiet {
                let message = format!("Default profile set to '{name}'");
                output::status_line(&global.color, true, &message);
            }
            Ok(())
        }
    }
}
