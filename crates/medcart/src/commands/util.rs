//! Shared helpers for command handlers.

use std::io::IsTerminal;

use serde::de::DeserializeOwned;
use serde_json::Value;

use medcart_core::{
    CoreError, Form, MutationRequest, MutationResult, NotificationLevel, Page, ResourceKey, Schema,
    Storefront, SubmitOutcome, SubscribeOptions,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Subscribe to `key`, wait for the first fetch to settle, and decode it.
pub async fn load<T: DeserializeOwned>(
    store: &Storefront,
    key: ResourceKey,
) -> Result<T, CliError> {
    let mut subscription = store.subscribe(key.clone(), SubscribeOptions::default());
    let Some(entry) = subscription.settled().await else {
        return Err(CliError::Decode {
            what: key.to_string(),
            message: "cache closed before the fetch finished".into(),
        });
    };

    match (entry.data_as::<T>()?, entry.error) {
        (Some(data), None) => Ok(data),
        (Some(data), Some(err)) => {
            tracing::warn!(%key, error = %err, "showing stale data");
            Ok(data)
        }
        (None, Some(err)) => Err(CliError::from_fetch(&err)),
        (None, None) => Err(CliError::Decode {
            what: key.to_string(),
            message: "backend returned no data".into(),
        }),
    }
}

/// Load a collection that may come back paginated or as a bare array.
pub async fn load_list<T: DeserializeOwned>(
    store: &Storefront,
    key: ResourceKey,
) -> Result<Vec<T>, CliError> {
    let value: Value = load(store, key.clone()).await?;
    let decoded = if value.is_array() {
        serde_json::from_value::<Vec<T>>(value)
    } else {
        serde_json::from_value::<Page<T>>(value).map(|page| page.items)
    };
    decoded.map_err(|e| CliError::Decode {
        what: key.to_string(),
        message: e.to_string(),
    })
}

/// Turn a 404 into a resource-specific not-found error.
pub fn not_found(
    err: CliError,
    resource_type: &str,
    identifier: u64,
    list_command: &str,
) -> CliError {
    match err {
        CliError::Api {
            status: Some(404), ..
        } => CliError::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.to_string(),
            list_command: list_command.into(),
        },
        other => other,
    }
}

/// Validate `form` and send the request built from its payload.
///
/// Returns the response data on success. Field errors and backend
/// rejections become `CliError`s.
pub async fn submit_form<S, B>(
    store: &Storefront,
    form: &mut Form<S>,
    build: B,
    global: &GlobalOpts,
) -> Result<Option<Value>, CliError>
where
    S: Schema,
    B: FnOnce(S::Output) -> Result<MutationRequest, CoreError>,
{
    let coordinator = store.mutations().clone();
    let outcome = form
        .submit(|payload| async move {
            match build(payload) {
                Ok(request) => coordinator.perform(&request).await,
                Err(e) => MutationResult::failed(e.to_string()),
            }
        })
        .await;

    if let Some(note) = form.take_notification() {
        if !global.quiet {
            let ok = note.level == NotificationLevel::Success;
            output::status_line(&global.color, ok, &note.message);
        }
    }

    match outcome {
        SubmitOutcome::Succeeded(data) => Ok(data),
        SubmitOutcome::Invalid => Err(CliError::InvalidForm {
            errors: form.errors().clone(),
        }),
        SubmitOutcome::Failed(message) => Err(CliError::Api {
            message,
            status: None,
        }),
    }
}

/// Run a request with no form in front of it.
pub async fn perform(
    store: &Storefront,
    request: &MutationRequest,
    done: &str,
    global: &GlobalOpts,
) -> Result<Option<Value>, CliError> {
    let result = store.mutations().perform(request).await;
    if !result.success {
        return Err(CliError::Api {
            message: result.message.unwrap_or_else(|| "Request failed".into()),
            status: None,
        });
    }
    if !global.quiet {
        output::status_line(&global.color, true, done);
    }
    Ok(result.data)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, global: &GlobalOpts, action: &str) -> Result<bool, CliError> {
    if global.yes {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Render a `Value` as the plain-format id, when it has one.
pub fn id_of(value: &Value) -> String {
    value
        .get("id")
        .map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}
