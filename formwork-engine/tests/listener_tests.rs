mod common;

use common::*;
use formwork_engine::{define_schema, ModelConfig};
use formwork_schema::{Listener, ListenerResult, PropertyDefinition, SchemaOptions, Validator};
use formwork_types::{ErrorMessage, Value, VALIDATION_FAILED};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};

// ── Partial updates ──────────────────────────────────────────────

#[tokio::test]
async fn on_create_partial_sets_other_properties() {
    let m = model(vec![
        (
            "title",
            PropertyDefinition::new().required().on_create(Listener::sync(|s| {
                let slug = s
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase()
                    .replace(' ', "-");
                record(json!({ "slug": slug }))
            })),
        ),
        ("slug", PropertyDefinition::new().with_default("")),
    ]);
    let created = m.create(record(json!({"title": "Hello World"}))).await.unwrap();
    assert_eq!(created.data["slug"], json!("hello-world"));
}

#[tokio::test]
async fn partial_values_are_validated() {
    let m = model(vec![
        (
            "a",
            PropertyDefinition::new()
                .with_default(0)
                .on_create(Listener::sync(|_| record(json!({"b": "not a number"})))),
        ),
        ("b", PropertyDefinition::new().with_default(0).validator(number())),
    ]);
    let error = m.create(record(json!({}))).await.unwrap_err();
    assert_eq!(error.reasons("b").unwrap(), [VALIDATION_FAILED]);
}

#[tokio::test]
async fn partial_updates_recompute_dependents() {
    let m = model(vec![
        (
            "first",
            PropertyDefinition::new()
                .with_default("")
                .on_create(Listener::sync(|_| record(json!({"last": "Lovelace"})))),
        ),
        ("last", PropertyDefinition::new().with_default("")),
        ("surname", mirror("last")),
    ]);
    let created = m.create(record(json!({"first": "Ada"}))).await.unwrap();
    assert_eq!(created.data["surname"], json!("Lovelace"));
}

#[tokio::test]
async fn listeners_see_earlier_changes() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let m = model(vec![(
        "n",
        PropertyDefinition::new()
            .with_default(0)
            .on_create(Listener::sync(|s| record(json!({"n": int(s, "n") + 1}))))
            .on_create(Listener::sync(move |s| {
                log.lock().unwrap().push(int(s, "n"));
            })),
    )]);
    let created = m.create(record(json!({"n": 1}))).await.unwrap();
    assert_eq!(created.data["n"], json!(2));
    assert_eq!(*seen.lock().unwrap(), vec![2]);
}

// ── Side effects ─────────────────────────────────────────────────

fn counter_model() -> formwork_engine::Model {
    counter_model_with(PropertyDefinition::new().with_default(0))
}

fn counter_model_with(count: PropertyDefinition) -> formwork_engine::Model {
    model(vec![
        ("count", count),
        (
            "increment",
            PropertyDefinition::new()
                .side_effect()
                .validator(Validator::sync(|v, _| v.is_i64()))
                .on_change(Listener::sync(|s| {
                    record(json!({"count": int(s, "count") + int(s, "increment")}))
                })),
        ),
    ])
}

#[tokio::test]
async fn side_effects_fold_back_into_persisted_values() {
    let created = counter_model()
        .create(record(json!({"increment": 3})))
        .await
        .unwrap();
    assert_eq!(Value::Object(created.data), json!({"count": 3}));
}

#[tokio::test]
async fn side_effect_only_update_persists_its_effect() {
    let updated = counter_model()
        .update(record(json!({"count": 5})), record(json!({"increment": 2})), None)
        .await
        .unwrap();
    assert_eq!(Value::Object(updated.data), json!({"count": 7}));
}

#[tokio::test]
async fn invalid_side_effect_never_fires() {
    let error = counter_model()
        .create(record(json!({"increment": "lots"})))
        .await
        .unwrap_err();
    assert_eq!(error.reasons("increment").unwrap(), [VALIDATION_FAILED]);
}

// ── Notification counts ──────────────────────────────────────────

#[tokio::test]
async fn on_change_runs_once_for_provided_input() {
    let (listener, calls) = counting_listener();
    let m = model(vec![("b", PropertyDefinition::new().with_default(0).on_change(listener))]);

    m.create(record(json!({"b": 1}))).await.unwrap();
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn partial_to_later_property_notifies_it_once() {
    let (listener, calls) = counting_listener();
    let m = model(vec![
        (
            "a",
            PropertyDefinition::new()
                .with_default(0)
                .on_create(Listener::sync(|_| record(json!({"b": 5})))),
        ),
        ("b", PropertyDefinition::new().with_default(0).on_change(listener)),
    ]);

    let created = m.create(record(json!({"a": 1}))).await.unwrap();
    assert_eq!(created.data["b"], json!(5));
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn dependents_recomputed_by_a_partial_are_notified_once() {
    let (listener, calls) = counting_listener();
    let m = model(vec![
        (
            "a",
            PropertyDefinition::new()
                .with_default(0)
                .on_create(Listener::sync(|_| record(json!({"b": 5})))),
        ),
        ("b", PropertyDefinition::new().with_default(0)),
        ("c", mirror("b").on_change(listener)),
    ]);

    let created = m.create(record(json!({"a": 1}))).await.unwrap();
    assert_eq!(created.data["c"], json!(5));
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn side_effect_changes_are_notified_once_on_create() {
    let (listener, calls) = counting_listener();
    let m = counter_model_with(PropertyDefinition::new().with_default(0).on_change(listener));

    let created = m.create(record(json!({"increment": 3}))).await.unwrap();
    assert_eq!(created.data["count"], json!(3));
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn side_effect_changes_are_notified_once_on_update() {
    let (listener, calls) = counting_listener();
    let m = counter_model_with(PropertyDefinition::new().with_default(0).on_change(listener));

    let updated = m
        .update(record(json!({"count": 5})), record(json!({"increment": 2})), None)
        .await
        .unwrap();
    assert_eq!(Value::Object(updated.data), json!({"count": 7}));
    assert_eq!(count(&calls), 1);
}

// ── Listener failures ────────────────────────────────────────────

#[tokio::test]
async fn listener_error_fails_its_property() {
    let m = model(vec![(
        "avatar",
        PropertyDefinition::new()
            .with_default("")
            .on_create(Listener::try_sync(|_| Err(anyhow::anyhow!("storage unavailable")))),
    )]);
    let error = m.create(record(json!({}))).await.unwrap_err();
    assert_eq!(error.message, ErrorMessage::ValidationError);
    assert_eq!(error.reasons("avatar").unwrap(), [VALIDATION_FAILED]);
}

#[tokio::test]
async fn async_listeners_run_in_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (first, second) = (Arc::clone(&order), Arc::clone(&order));
    let m = model(vec![(
        "x",
        PropertyDefinition::new()
            .with_default(0)
            .on_create(Listener::new(move |_| {
                let first = Arc::clone(&first);
                async move {
                    tokio::task::yield_now().await;
                    first.lock().unwrap().push("first");
                    Ok(ListenerResult::NoOp)
                }
            }))
            .on_create(Listener::sync(move |_| {
                second.lock().unwrap().push("second");
            })),
    )]);
    m.create(record(json!({}))).await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
}

// ── Depth guard ──────────────────────────────────────────────────

fn runaway_definitions() -> formwork_schema::Definitions {
    defs(vec![(
        "counter",
        PropertyDefinition::new()
            .with_default(0)
            .on_change(Listener::sync(|s| record(json!({"counter": int(s, "counter") + 1})))),
    )])
}

#[tokio::test]
async fn runaway_listener_hits_the_depth_guard() {
    init_tracing();
    let m = define_schema(runaway_definitions(), SchemaOptions::new())
        .unwrap()
        .with_config(ModelConfig {
            max_resolution_depth: 3,
        })
        .get_model();

    let error = m.create(record(json!({"counter": 1}))).await.unwrap_err();
    assert_eq!(error.message, ErrorMessage::CyclicResolution);
    assert_eq!(
        error.reasons("counter").unwrap(),
        ["maximum resolution depth of 3 exceeded"]
    );
}

#[tokio::test]
async fn default_depth_guard_applies() {
    init_tracing();
    let m = define_schema(runaway_definitions(), SchemaOptions::new())
        .unwrap()
        .get_model();
    let error = m.create(record(json!({}))).await.unwrap_err();
    assert_eq!(error.message, ErrorMessage::CyclicResolution);
}

#[tokio::test]
async fn converging_listeners_stay_under_the_guard() {
    let m = model(vec![(
        "level",
        PropertyDefinition::new()
            .with_default(0)
            .on_change(Listener::sync(|s| {
                let level = int(s, "level");
                (level < 10).then(|| record(json!({"level": level + 1})))
            })),
    )]);
    let created = m.create(record(json!({}))).await.unwrap();
    assert_eq!(created.data["level"], json!(10));
}
