//! Validator results.

use crate::error::FieldError;
use crate::{Record, Value};
use serde::{Deserialize, Serialize};

/// Reason used whenever a callback fails without saying why.
pub const VALIDATION_FAILED: &str = "validation failed";

/// What a property validator reports for one value.
///
/// `validated` replaces the input value when present, letting validators
/// normalize (trim, round, coerce) what they accept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Record>,
}

impl ValidationResult {
    /// Accepts the value unchanged.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// Rejects the value with one reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reasons: vec![reason.into()],
            ..Self::default()
        }
    }

    /// Rejects the value with several reasons.
    pub fn invalid_with<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            valid: false,
            reasons: reasons.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Replaces the accepted value.
    #[must_use]
    pub fn with_validated(mut self, value: impl Into<Value>) -> Self {
        self.validated = Some(value.into());
        self
    }

    /// Attaches metadata surfaced with the failure.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Record) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns the value to keep: `validated` if set, otherwise `input`.
    pub fn accepted_value(&self, input: Value) -> Value {
        self.validated.clone().unwrap_or(input)
    }

    /// Converts a rejection into the accumulator entry.
    pub fn into_field_error(self) -> FieldError {
        let reasons = if self.reasons.is_empty() {
            vec![VALIDATION_FAILED.to_string()]
        } else {
            self.reasons
        };
        FieldError {
            reasons,
            metadata: self.metadata,
        }
    }
}

impl From<bool> for ValidationResult {
    fn from(valid: bool) -> Self {
        if valid {
            Self::valid()
        } else {
            Self::default()
        }
    }
}
