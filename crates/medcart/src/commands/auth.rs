//! `login` / `logout`.

use secrecy::SecretString;
use serde_json::Value;

use medcart_core::form::LoginSchema;
use medcart_core::{CoreError, Form, FormValues, Storefront, SubmitOutcome};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

fn read_password(args: &LoginArgs) -> Result<String, CliError> {
    if let Some(ref var) = args.password_env {
        return std::env::var(var).map_err(|_| CliError::Validation {
            field: "password_env".into(),
            reason: format!("environment variable '{var}' is not set"),
        });
    }
    rpassword::prompt_password("Password: ").map_err(CliError::Io)
}

fn remember(profile: &str, token: &SecretString) {
    match config::store_token(profile, token) {
        Ok(()) => tracing::debug!(profile, "token stored in keyring"),
        Err(e) => tracing::warn!(profile, error = %e, "could not store token in keyring"),
    }
}

pub async fn login(
    store: &Storefront,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = read_password(&args)?;
    let values: FormValues = [("email", args.email.as_str()), ("password", password.as_str())]
        .into_iter()
        .collect();
    let mut form = Form::bind(LoginSchema, values);

    let cfg = config::load_config_or_default();
    let profile = config::active_profile_name(global, &cfg);
    let session = store.session().clone();
    let role = args.role;

    let outcome = form
        .submit(|input| async move {
            let auth = session.login(role, &input.email, &input.password).await?;
            remember(&profile, &auth.token);
            let user = serde_json::to_value(&auth.user).map_err(|e| CoreError::Decode {
                what: "login response".into(),
                message: e.to_string(),
            })?;
            Ok::<Value, CoreError>(user)
        })
        .await;

    match outcome {
        SubmitOutcome::Succeeded(user) => {
            if !global.quiet {
                let who = user
                    .as_ref()
                    .and_then(|u| u.get("email"))
                    .and_then(Value::as_str)
                    .unwrap_or(&args.email);
                let message = format!("Signed in as {who} ({role})");
                output::status_line(&global.color, true, &message);
            }
            Ok(())
        }
        SubmitOutcome::Invalid => Err(CliError::InvalidForm {
            errors: form.errors().clone(),
        }),
        SubmitOutcome::Failed(message) => Err(CliError::LoginRejected { message }),
    }
}

/// Forget the stored token. Needs no backend.
pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile = config::active_profile_name(global, &cfg);
    config::forget_token(&profile)?;
    if !global.quiet {
        let message = format!("Signed out of profile '{profile}'");
        output::status_line(&global.color, true, &message);
    }
    Ok(())
}
