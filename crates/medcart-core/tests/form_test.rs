// Form state machine and draft persistence. No network involved.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::json;

use medcart_core::form::{AddressSchema, CategorySchema};
use medcart_core::{
    CoreError, DraftStore, Form, FormStatus, FormValues, MutationResult, NotificationLevel,
    SubmitOutcome,
};

fn address_values() -> FormValues {
    [
        ("recipient", "Sari"),
        ("phone", "081234567890"),
        ("street", "Jl. Merdeka 1"),
        ("city", "Bandung"),
        ("postal_code", "40111"),
    ]
    .into_iter()
    .collect()
}

#[tokio::test]
async fn submit_passes_through_submitting_and_resets_on_success() {
    let defaults: FormValues = [("name", "")].into_iter().collect();
    let mut form = Form::bind(CategorySchema, defaults.clone());
    form.set_field("name", "Vitamins");
    let status = form.watch_status();

    let outcome = form
        .submit(|input| {
            let seen = *status.borrow();
            async move {
                assert_eq!(seen, FormStatus::Submitting);
                assert_eq!(input.name, "Vitamins");
                MutationResult::ok(json!({"id": 1, "name": "Vitamins"}))
            }
        })
        .await;

    assert_eq!(outcome, SubmitOutcome::Succeeded(Some(json!({"id": 1, "name": "Vitamins"}))));
    assert_eq!(form.status(), FormStatus::Idle);
    assert_eq!(form.values(), &defaults);
    let note = form.take_notification().unwrap();
    assert_eq!(note.level, NotificationLevel::Success);
    assert!(form.notification().is_none());
}

#[tokio::test]
async fn callback_error_keeps_values() {
    let mut form = Form::bind(CategorySchema, FormValues::new());
    form.set_field("name", "Vitamins");

    let outcome = form
        .submit(|_| async {
            Err::<serde_json::Value, _>(CoreError::Api {
                message: "Category service unavailable".into(),
                status: Some(503),
            })
        })
        .await;

    assert_eq!(outcome, SubmitOutcome::Failed("Category service unavailable".into()));
    assert_eq!(form.values().get("name"), "Vitamins");
    assert_eq!(form.status(), FormStatus::Idle);
}

#[tokio::test]
async fn editing_a_field_clears_its_error() {
    let mut form = Form::bind(CategorySchema, FormValues::new());
    let outcome = form
        .submit(|_| async { MutationResult::ok(json!(null)) })
        .await;
    assert_eq!(outcome, SubmitOutcome::Invalid);
    assert_eq!(form.errors().get("name"), Some("Category name is required"));

    form.set_field("name", "Vi");
    assert!(form.errors().is_empty());
}

#[tokio::test]
async fn drafts_restore_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let store = DraftStore::new(dir.path());

    let mut form =
        Form::with_drafts(AddressSchema, FormValues::new(), store.clone(), "address").unwrap();
    for (field, value) in address_values().iter() {
        form.set_field(field, value);
    }
    drop(form);

    let mut restored =
        Form::with_drafts(AddressSchema, FormValues::new(), store.clone(), "address").unwrap();
    assert_eq!(restored.values(), &address_values());

    let outcome = restored
        .submit(|input| async move {
            assert_eq!(input.postal_code, "40111");
            MutationResult::ok(json!({"id": 10}))
        })
        .await;
    assert!(matches!(outcome, SubmitOutcome::Succeeded(_)));
    assert_eq!(store.load("address").unwrap(), None);
}
