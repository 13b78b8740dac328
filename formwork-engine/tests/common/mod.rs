//! Shared helpers for engine tests.

#![allow(dead_code)]

use formwork_engine::{define_schema, Model};
use formwork_schema::{
    Definitions, Listener, PropertyDefinition, Resolver, SchemaOptions, Validator,
};
use formwork_types::{Record, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn record(value: Value) -> Record {
    formwork_types::into_record(value).unwrap()
}

pub fn defs(entries: Vec<(&str, PropertyDefinition)>) -> Definitions {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

pub fn model(entries: Vec<(&str, PropertyDefinition)>) -> Model {
    model_with(entries, SchemaOptions::new())
}

pub fn model_with(entries: Vec<(&str, PropertyDefinition)>, options: SchemaOptions) -> Model {
    init_tracing();
    define_schema(defs(entries), options).unwrap().get_model()
}

pub fn accept() -> Validator {
    Validator::sync(|_, _| true)
}

pub fn number() -> Validator {
    Validator::sync(|value, _| value.is_number())
}

pub fn int(summary: &formwork_schema::Summary, key: &str) -> i64 {
    summary.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// A dependent copying `source`.
pub fn mirror(source: &'static str) -> PropertyDefinition {
    PropertyDefinition::new()
        .dependent()
        .with_default(0)
        .depends_on([source])
        .resolver(Resolver::sync(move |s| {
            s.get(source).cloned().unwrap_or(Value::Null)
        }))
}

/// A listener that counts its calls.
pub fn counting_listener() -> (Listener, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let listener = Listener::sync(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (listener, calls)
}

pub fn count(calls: &AtomicUsize) -> usize {
    calls.load(Ordering::SeqCst)
}
