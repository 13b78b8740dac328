//! Per-operation working state.

use formwork_schema::{OptionsHandle, Summary};
use formwork_types::{Record, Value};
use std::collections::HashMap;

/// Values and bookkeeping owned by one in-flight operation.
///
/// Callbacks never see this directly: they get a [`Summary`] snapshot, so a
/// callback can only influence the operation through what it returns.
#[derive(Debug, Clone)]
pub struct OperationContext {
    values: Record,
    previous: Option<Record>,
    options: OptionsHandle,
    /// Persisted properties whose value changed, in order of first change.
    changed: Vec<String>,
    /// Input properties accepted from the caller.
    provided: Vec<String>,
    /// Input key used for each provided property (its name or its alias).
    external_keys: HashMap<String, String>,
}

impl OperationContext {
    /// Context for a create, seeded with initial persisted values.
    pub fn for_create(initial: Record, options: Record) -> Self {
        Self::new(initial, None, options)
    }

    /// Context for an update of `previous`, seeded with its persisted values.
    pub fn for_update(initial: Record, previous: Record, options: Record) -> Self {
        Self::new(initial, Some(previous), options)
    }

    fn new(values: Record, previous: Option<Record>, options: Record) -> Self {
        Self {
            values,
            previous,
            options: OptionsHandle::new(options),
            changed: Vec::new(),
            provided: Vec::new(),
            external_keys: HashMap::new(),
        }
    }

    pub fn is_update(&self) -> bool {
        self.previous.is_some()
    }

    /// Snapshot handed to callbacks.
    pub fn summary(&self) -> Summary {
        Summary::new(
            self.values.clone(),
            self.previous.clone(),
            self.is_update(),
            self.options.clone(),
        )
    }

    /// Snapshot with `draft` layered over the current values.
    pub fn draft_summary(&self, draft: &Record) -> Summary {
        let mut values = self.values.clone();
        for (key, value) in draft {
            values.insert(key.clone(), value.clone());
        }
        Summary::new(values, self.previous.clone(), self.is_update(), self.options.clone())
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn values(&self) -> &Record {
        &self.values
    }

    /// Value `name` had before this operation.
    pub fn previous_value(&self, name: &str) -> Option<&Value> {
        self.previous.as_ref().and_then(|previous| previous.get(name))
    }

    /// Writes a value without tracking it as a change.
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Writes a persisted value and records the change.
    pub fn write(&mut self, name: &str, value: Value) {
        self.set(name, value);
        self.mark_changed(name);
    }

    pub fn mark_changed(&mut self, name: &str) {
        if !self.changed.iter().any(|n| n == name) {
            self.changed.push(name.to_string());
        }
    }

    pub fn changed(&self) -> &[String] {
        &self.changed
    }

    pub fn has_changed(&self, name: &str) -> bool {
        self.changed.iter().any(|n| n == name)
    }

    pub fn mark_provided(&mut self, name: &str, external_key: &str) {
        if !self.provided.iter().any(|n| n == name) {
            self.provided.push(name.to_string());
        }
        self.external_keys
            .insert(name.to_string(), external_key.to_string());
    }

    pub fn provided(&self) -> &[String] {
        &self.provided
    }

    pub fn was_provided(&self, name: &str) -> bool {
        self.provided.iter().any(|n| n == name)
    }

    /// Key errors for `name` are reported under: the input key the caller
    /// used, or the property name.
    pub fn external_key<'a>(&'a self, name: &'a str) -> &'a str {
        self.external_keys.get(name).map_or(name, String::as_str)
    }

    pub fn options(&self) -> &OptionsHandle {
        &self.options
    }
}
