// ── Form binding ──
//
// A `Form` owns the raw field values of one form, validates them through
// a `Schema` on submit, and hands the typed payload to a submit callback
// (usually a mutation). Validation failures never reach the network.

pub mod rules;
mod schema;
pub mod schemas;

use std::future::Future;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::drafts::DraftStore;
use crate::error::CoreError;
use crate::mutation::MutationResult;

pub use schema::{FieldErrors, FormValues, Schema};
pub use schemas::{
    AddressInput, AddressSchema, CategoryInput, CategorySchema, DoctorRegisterInput,
    DoctorRegisterSchema, LoginInput, LoginSchema, PharmacyInput, PharmacySchema, ProductInput,
    ProductSchema, RegisterInput, RegisterSchema,
};

const DEFAULT_SUCCESS: &str = "Saved successfully";
const DEFAULT_FAILURE: &str = "Something went wrong. Please try again.";

/// Where a form is in its submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStatus {
    #[default]
    Idle,
    Validating,
    Submitting,
}

/// How a submit ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; see [`Form::errors`]. Nothing was sent.
    Invalid,
    /// The callback succeeded. Values were reset to their defaults.
    Succeeded(Option<Value>),
    /// The callback failed with this message. Values are untouched.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient toast raised by a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

struct Draft {
    store: DraftStore,
    name: String,
}

/// One bound form.
pub struct Form<S: Schema> {
    schema: S,
    defaults: FormValues,
    values: FormValues,
    errors: FieldErrors,
    status: watch::Sender<FormStatus>,
    notification: Option<Notification>,
    draft: Option<Draft>,
}

impl<S: Schema> Form<S> {
    pub fn bind(schema: S, defaults: FormValues) -> Self {
        let (status, _) = watch::channel(FormStatus::Idle);
        Self {
            schema,
            values: defaults.clone(),
            defaults,
            errors: FieldErrors::new(),
            status,
            notification: None,
            draft: None,
        }
    }

    /// Bind a form whose values persist in `store` under `name`.
    ///
    /// A saved draft is laid over `defaults`.
    pub fn with_drafts(
        schema: S,
        defaults: FormValues,
        store: DraftStore,
        name: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        let mut form = Self::bind(schema, defaults);
        if let Some(saved) = store.load(&name)? {
            debug!(draft = %name, "restoring form draft");
            for (field, value) in saved.iter() {
                form.values.set(field, value);
            }
        }
        form.draft = Some(Draft { store, name });
        Ok(form)
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn status(&self) -> FormStatus {
        *self.status.borrow()
    }

    /// Follow status transitions, e.g. to disable a submit button.
    pub fn watch_status(&self) -> watch::Receiver<FormStatus> {
        self.status.subscribe()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Take the notification, dismissing it.
    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    /// Change one field. Clears that field's error.
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) {
        self.values.set(field, value);
        self.errors.remove(field);
        if let Some(ref draft) = self.draft {
            if let Err(e) = draft.store.save(&draft.name, &self.values) {
                warn!(draft = %draft.name, error = %e, "failed to save form draft");
            }
        }
    }

    /// Validate, then hand the payload to `on_valid`.
    ///
    /// `on_valid` may resolve to a [`MutationResult`] or to a
    /// `Result<Value, CoreError>`; either way a failure leaves the values
    /// in place and raises an error notification.
    pub async fn submit<F, Fut, R>(&mut self, on_valid: F) -> SubmitOutcome
    where
        F: FnOnce(S::Output) -> Fut,
        Fut: Future<Output = R>,
        R: Into<MutationResult>,
    {
        self.notification = None;
        self.status.send_replace(FormStatus::Validating);

        let payload = match self.schema.validate(&self.values) {
            Ok(payload) => payload,
            Err(errors) => {
                debug!(fields = errors.len(), "form validation failed");
                self.errors = errors;
                self.status.send_replace(FormStatus::Idle);
                return SubmitOutcome::Invalid;
            }
        };
        self.errors.clear();

        self.status.send_replace(FormStatus::Submitting);
        let result: MutationResult = on_valid(payload).await.into();
        self.status.send_replace(FormStatus::Idle);

        if result.success {
            self.values = self.defaults.clone();
            if let Some(ref draft) = self.draft {
                if let Err(e) = draft.store.clear(&draft.name) {
                    warn!(draft = %draft.name, error = %e, "failed to clear form draft");
                }
            }
            self.notification = Some(Notification {
                level: NotificationLevel::Success,
                message: result.message.unwrap_or_else(|| DEFAULT_SUCCESS.into()),
            });
            SubmitOutcome::Succeeded(result.data)
        } else {
            let message = result.message.unwrap_or_else(|| DEFAULT_FAILURE.into());
            debug!(%message, "form submit failed");
            self.notification = Some(Notification {
                level: NotificationLevel::Error,
                message: message.clone(),
            });
            SubmitOutcome::Failed(message)
        }
    }
}
