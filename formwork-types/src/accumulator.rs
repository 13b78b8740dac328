//! Field-keyed error collection.

use crate::error::{ErrorMessage, ErrorPayload, FieldError, OperationError};
use std::collections::BTreeMap;

/// Collects validation failures for the lifetime of one operation.
///
/// The first write for a field is stored verbatim. Later writes never replace
/// its reasons; only their metadata is shallow-merged in. Fields are always
/// surfaced in sorted order.
#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator {
    payload: ErrorPayload,
}

impl ErrorAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `error` against `field`, merging with any earlier entry.
    pub fn set(&mut self, field: impl Into<String>, error: FieldError) -> &mut Self {
        let field = field.into();
        match self.payload.get_mut(&field) {
            Some(existing) => existing.merge(error),
            None => {
                self.payload.insert(field, error);
            }
        }
        self
    }

    /// Shorthand for recording a single reason without metadata.
    pub fn add_reason(&mut self, field: impl Into<String>, reason: impl Into<String>) -> &mut Self {
        self.set(field, FieldError::new(reason))
    }

    /// Folds every entry of `other` into this accumulator.
    pub fn absorb(&mut self, other: ErrorAccumulator) -> &mut Self {
        for (field, error) in other.payload {
            self.set(field, error);
        }
        self
    }

    /// Returns true once at least one failure has been recorded.
    pub fn is_loaded(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Failing field keys, sorted.
    pub fn fields(&self) -> Vec<&str> {
        self.payload.keys().map(String::as_str).collect()
    }

    /// Returns true if `field` has a recorded failure.
    pub fn contains(&self, field: &str) -> bool {
        self.payload.contains_key(field)
    }

    /// Returns the failure recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.payload.get(field)
    }

    /// Borrows the accumulated payload.
    pub fn payload(&self) -> &ErrorPayload {
        &self.payload
    }

    /// Consumes the accumulator, returning the payload.
    pub fn into_payload(self) -> ErrorPayload {
        self.payload
    }

    /// Consumes the accumulator into an [`OperationError`].
    pub fn into_error(self, message: ErrorMessage) -> OperationError {
        OperationError::new(message, self.payload)
    }

    /// Field → reasons view, as used by schema-construction payloads.
    pub fn reason_map(&self) -> BTreeMap<String, Vec<String>> {
        self.payload
            .iter()
            .map(|(field, error)| (field.clone(), error.reasons.clone()))
            .collect()
    }
}
