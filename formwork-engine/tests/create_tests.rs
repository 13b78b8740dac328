mod common;

use common::*;
use formwork_engine::IntoEnvelope;
use formwork_schema::{Listener, PropertyDefinition, SchemaOptions, Timestamps, Validator};
use formwork_types::{ErrorMessage, ValidationResult, Value, VALIDATION_FAILED};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn user_model() -> formwork_engine::Model {
    model(vec![
        (
            "name",
            PropertyDefinition::new().required().validator(Validator::sync(|v, _| {
                v.as_str().is_some_and(|s| !s.trim().is_empty())
            })),
        ),
        ("age", PropertyDefinition::new().with_default(0).validator(number())),
        ("role", PropertyDefinition::new().with_default("member").should_init(false)),
        ("sku", PropertyDefinition::new().with_default("").readonly_lax()),
        ("nameLength", {
            PropertyDefinition::new()
                .dependent()
                .with_default(0)
                .depends_on(["name"])
                .resolver(formwork_schema::Resolver::sync(|s| {
                    json!(s.get("name").and_then(Value::as_str).map_or(0, str::len))
                }))
        }),
    ])
}

// ── Defaults & eligibility ───────────────────────────────────────

#[tokio::test]
async fn create_fills_defaults_and_dependents() {
    let created = user_model()
        .create(record(json!({"name": "Ada"})))
        .await
        .unwrap();
    assert_eq!(
        Value::Object(created.data),
        json!({"name": "Ada", "age": 0, "role": "member", "sku": "", "nameLength": 3})
    );
}

#[tokio::test]
async fn unknown_dependent_and_blocked_keys_are_ignored() {
    let created = user_model()
        .create(record(json!({
            "name": "Ada",
            "ghost": 1,
            "nameLength": 99,
            "role": "admin",
        })))
        .await
        .unwrap();
    assert!(!created.data.contains_key("ghost"));
    assert_eq!(created.data["nameLength"], json!(3));
    assert_eq!(created.data["role"], json!("member"));
}

#[tokio::test]
async fn init_gate_sees_the_other_inputs() {
    let m = model(vec![
        ("plan", PropertyDefinition::new().with_default("free")),
        (
            "seats",
            PropertyDefinition::new()
                .with_default(1)
                .should_init(formwork_schema::Gate::when(|s| {
                    s.get("plan") == Some(&json!("team"))
                })),
        ),
    ]);

    let free = m.create(record(json!({"seats": 9}))).await.unwrap();
    assert_eq!(free.data["seats"], json!(1));

    let team = m.create(record(json!({"plan": "team", "seats": 9}))).await.unwrap();
    assert_eq!(team.data["seats"], json!(9));
}

// ── Validation ───────────────────────────────────────────────────

#[tokio::test]
async fn every_invalid_field_is_reported() {
    let error = user_model()
        .create(record(json!({"name": "  ", "age": "old"})))
        .await
        .unwrap_err();
    assert_eq!(error.message, ErrorMessage::ValidationError);
    assert_eq!(error.payload.keys().collect::<Vec<_>>(), vec!["age", "name"]);
    assert_eq!(error.reasons("age").unwrap(), [VALIDATION_FAILED]);
}

#[tokio::test]
async fn missing_required_field() {
    let error = user_model().create(record(json!({"age": 3}))).await.unwrap_err();
    assert_eq!(error.reasons("name").unwrap(), ["'name' is required"]);
}

#[tokio::test]
async fn callable_required_uses_its_reason() {
    let m = model(vec![
        ("kind", PropertyDefinition::new().with_default("basic")),
        (
            "licence",
            PropertyDefinition::new().with_default("").required_when(|s| {
                (s.get("kind") == Some(&json!("pro")), "pro accounts need a licence")
            }),
        ),
    ]);

    assert!(m.create(record(json!({}))).await.is_ok());
    let error = m.create(record(json!({"kind": "pro"}))).await.unwrap_err();
    assert_eq!(error.reasons("licence").unwrap(), ["pro accounts need a licence"]);
}

#[tokio::test]
async fn validated_value_replaces_input() {
    let m = model(vec![(
        "email",
        PropertyDefinition::new().with_default("").validator(Validator::sync(|v, _| {
            let trimmed = v.as_str().unwrap_or_default().trim().to_lowercase();
            ValidationResult::valid().with_validated(trimmed)
        })),
    )]);
    let created = m.create(record(json!({"email": "  ADA@Example.com "}))).await.unwrap();
    assert_eq!(created.data["email"], json!("ada@example.com"));
}

#[tokio::test]
async fn validator_metadata_reaches_the_payload() {
    let m = model(vec![(
        "password",
        PropertyDefinition::new().required().validator(Validator::sync(|v, _| {
            let len = v.as_str().map_or(0, str::len);
            ValidationResult::invalid("too short")
                .with_metadata(record(json!({"min": 8, "got": len})))
        })),
    )]);
    let error = m.create(record(json!({"password": "abc"}))).await.unwrap_err();
    let field = &error.payload["password"];
    assert_eq!(field.reasons, vec!["too short"]);
    assert_eq!(field.metadata.as_ref().unwrap()["got"], json!(3));
}

#[tokio::test]
async fn validator_error_becomes_validation_failed() {
    let m = model(vec![(
        "code",
        PropertyDefinition::new()
            .with_default("")
            .validator(Validator::try_sync(|_, _| Err(anyhow::anyhow!("lookup service down")))),
    )]);
    let error = m.create(record(json!({"code": "x"}))).await.unwrap_err();
    assert_eq!(error.reasons("code").unwrap(), [VALIDATION_FAILED]);
}

#[tokio::test]
async fn async_validators_are_awaited() {
    let m = model(vec![(
        "slug",
        PropertyDefinition::new().with_default("").validator(Validator::new(|v, _| async move {
            tokio::task::yield_now().await;
            Ok(ValidationResult::from(v.as_str().is_some_and(|s| !s.contains(' '))))
        })),
    )]);
    assert!(m.create(record(json!({"slug": "a-b"}))).await.is_ok());
    assert!(m.create(record(json!({"slug": "a b"}))).await.is_err());
}

// ── Constants & timestamps ───────────────────────────────────────

#[tokio::test]
async fn constants_are_set_and_not_overridable() {
    let ids = Arc::new(AtomicUsize::new(0));
    let next = Arc::clone(&ids);
    let m = model(vec![
        ("kind", PropertyDefinition::new().constant().value("user")),
        (
            "id",
            PropertyDefinition::new()
                .constant()
                .value_with(move || json!(next.fetch_add(1, Ordering::SeqCst) + 1)),
        ),
        ("name", PropertyDefinition::new().with_default("")),
    ]);

    let first = m.create(record(json!({"kind": "admin"}))).await.unwrap();
    let second = m.create(record(json!({}))).await.unwrap();
    assert_eq!(first.data["kind"], json!("user"));
    assert_eq!(first.data["id"], json!(1));
    assert_eq!(second.data["id"], json!(2));
}

#[tokio::test]
async fn timestamps_are_added_on_create() {
    let m = model_with(
        vec![("name", PropertyDefinition::new().with_default(""))],
        SchemaOptions::new().timestamps(Timestamps::custom("born", "touched")),
    );
    let created = m.create(record(json!({}))).await.unwrap();
    let born = created.data["born"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(born).is_ok());
    assert_eq!(created.data["born"], created.data["touched"]);
}

// ── Hooks & envelope ─────────────────────────────────────────────

#[tokio::test]
async fn success_hooks_are_deferred() {
    let (hook, calls) = counting_listener();
    let m = model(vec![(
        "name",
        PropertyDefinition::new().with_default("").on_success(hook),
    )]);

    let created = m
        .create_with_options(record(json!({})), record(json!({"source": "import"})))
        .await
        .unwrap();
    assert_eq!(count(&calls), 0);
    assert_eq!(created.handle_success.len(), 1);

    let options = created.handle_success.run().await;
    assert_eq!(count(&calls), 1);
    assert_eq!(options["source"], json!("import"));
}

#[tokio::test]
async fn failure_hooks_run_for_failing_fields_only() {
    let (name_hook, name_calls) = counting_listener();
    let (age_hook, age_calls) = counting_listener();
    let m = model(vec![
        ("name", PropertyDefinition::new().required().on_failure(name_hook)),
        ("age", PropertyDefinition::new().with_default(0).on_failure(age_hook)),
    ]);

    assert!(m.create(record(json!({"age": 4}))).await.is_err());
    assert_eq!(count(&name_calls), 1);
    assert_eq!(count(&age_calls), 0);
}

#[tokio::test]
async fn failing_hooks_do_not_break_success() {
    let m = model(vec![(
        "name",
        PropertyDefinition::new()
            .with_default("")
            .on_success(Listener::try_sync(|_| Err(anyhow::anyhow!("mailer offline")))),
    )]);
    let created = m.create(record(json!({}))).await.unwrap();
    assert!(created.handle_success.run().await.is_empty());
}

#[tokio::test]
async fn envelope_holds_exactly_one_side() {
    let ok = user_model().create(record(json!({"name": "Ada"}))).await.into_envelope();
    assert_eq!(ok["error"], Value::Null);
    assert_eq!(ok["data"]["name"], json!("Ada"));

    let err = user_model().create(record(json!({}))).await.into_envelope();
    assert_eq!(err["data"], Value::Null);
    assert_eq!(err["error"]["message"], json!("Validation Error"));
    assert_eq!(err["error"]["payload"]["name"]["reasons"], json!(["'name' is required"]));
}
