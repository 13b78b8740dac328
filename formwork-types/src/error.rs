//! Failure envelope returned by model operations.

use crate::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field-keyed failures. A `BTreeMap` so payloads serialize in a stable order.
pub type ErrorPayload = BTreeMap<String, FieldError>;

/// Top-level message of an [`OperationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorMessage {
    /// One or more fields failed validation.
    #[serde(rename = "Validation Error")]
    ValidationError,
    /// The property definitions themselves are contradictory.
    #[serde(rename = "Invalid Schema")]
    InvalidSchema,
    /// An update resolved to no change at all.
    #[serde(rename = "Nothing to update")]
    NothingToUpdate,
    /// Listener re-resolution exceeded the configured depth.
    #[serde(rename = "Cyclic Resolution")]
    CyclicResolution,
}

impl ErrorMessage {
    /// Returns the exact message string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "Validation Error",
            Self::InvalidSchema => "Invalid Schema",
            Self::NothingToUpdate => "Nothing to update",
            Self::CyclicResolution => "Cyclic Resolution",
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons and optional metadata recorded against one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub reasons: Vec<String>,
    pub metadata: Option<Record>,
}

impl FieldError {
    /// A single-reason error without metadata.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reasons: vec![reason.into()],
            metadata: None,
        }
    }

    /// An error carrying several reasons.
    pub fn with_reasons<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reasons: reasons.into_iter().map(Into::into).collect(),
            metadata: None,
        }
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Record) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Folds a later error for the same field into this one.
    ///
    /// The first reasons list is kept as is. Metadata is shallow-merged with
    /// later keys winning.
    pub(crate) fn merge(&mut self, later: FieldError) {
        if let Some(later_meta) = later.metadata {
            match &mut self.metadata {
                Some(meta) => meta.extend(later_meta),
                None => self.metadata = Some(later_meta),
            }
        }
    }
}

/// Failure outcome of a create/update/clone call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct OperationError {
    pub message: ErrorMessage,
    pub payload: ErrorPayload,
}

impl OperationError {
    /// Creates an error with the given message and payload.
    pub fn new(message: ErrorMessage, payload: ErrorPayload) -> Self {
        Self { message, payload }
    }

    /// Field validation failure.
    pub fn validation(payload: ErrorPayload) -> Self {
        Self::new(ErrorMessage::ValidationError, payload)
    }

    /// The update-specific "no eligible change" error. Its payload is empty.
    pub fn nothing_to_update() -> Self {
        Self::new(ErrorMessage::NothingToUpdate, ErrorPayload::new())
    }

    /// Returns true for the "Nothing to update" error.
    pub fn is_nothing_to_update(&self) -> bool {
        self.message == ErrorMessage::NothingToUpdate
    }

    /// Returns the reasons recorded for `field`, if any.
    pub fn reasons(&self, field: &str) -> Option<&[String]> {
        self.payload.get(field).map(|e| e.reasons.as_slice())
    }
}
