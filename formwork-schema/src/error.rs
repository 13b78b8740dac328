//! Error types for schema construction.

use formwork_types::ErrorMessage;
use std::collections::BTreeMap;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while turning definitions into a [`Schema`](crate::Schema).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// The definition validator rejected the definitions or options.
    #[error("{message}")]
    Invalid {
        message: ErrorMessage,
        payload: BTreeMap<String, Vec<String>>,
    },

    /// A validated definition lacked a rule its kind needs.
    #[error("property '{property}' is missing its '{rule}' rule")]
    Incomplete {
        property: String,
        rule: &'static str,
    },
}

impl SchemaError {
    /// Field-keyed reasons; `None` for [`SchemaError::Incomplete`].
    pub fn payload(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            Self::Invalid { payload, .. } => Some(payload),
            Self::Incomplete { .. } => None,
        }
    }

    /// Reasons reported for `field`.
    pub fn reasons(&self, field: &str) -> &[String] {
        self.payload()
            .and_then(|payload| payload.get(field))
            .map_or(&[], Vec::as_slice)
    }

    /// The error message class.
    pub fn message(&self) -> Option<ErrorMessage> {
        match self {
            Self::Invalid { message, .. } => Some(*message),
            Self::Incomplete { .. } => None,
        }
    }
}
