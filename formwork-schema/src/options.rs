//! Schema-wide options: timestamps and post-validation.

use crate::callbacks::PostValidator;
use serde::{Deserialize, Serialize};

/// Default name of the creation timestamp.
pub const DEFAULT_CREATED_AT: &str = "createdAt";
/// Default name of the update timestamp.
pub const DEFAULT_UPDATED_AT: &str = "updatedAt";

fn default_created_at() -> String {
    DEFAULT_CREATED_AT.to_string()
}

fn default_updated_at() -> String {
    DEFAULT_UPDATED_AT.to_string()
}

/// `timestamps` option: `false`, `true`, or custom field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamps {
    Toggle(bool),
    Custom {
        #[serde(rename = "createdAt", default = "default_created_at")]
        created_at: String,
        #[serde(rename = "updatedAt", default = "default_updated_at")]
        updated_at: String,
    },
}

impl Default for Timestamps {
    fn default() -> Self {
        Self::Toggle(false)
    }
}

impl Timestamps {
    /// Custom names; either may be left at its default.
    pub fn custom(created_at: impl Into<String>, updated_at: impl Into<String>) -> Self {
        Self::Custom {
            created_at: created_at.into(),
            updated_at: updated_at.into(),
        }
    }

    /// Field names in use, or `None` when timestamps are disabled.
    pub fn keys(&self) -> Option<TimestampKeys> {
        match self {
            Self::Toggle(false) => None,
            Self::Toggle(true) => Some(TimestampKeys {
                created_at: default_created_at(),
                updated_at: default_updated_at(),
            }),
            Self::Custom {
                created_at,
                updated_at,
            } => Some(TimestampKeys {
                created_at: created_at.clone(),
                updated_at: updated_at.clone(),
            }),
        }
    }
}

/// Resolved timestamp field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampKeys {
    pub created_at: String,
    pub updated_at: String,
}

/// One cross-field validation rule.
#[derive(Debug, Clone)]
pub struct PostValidateConfig {
    pub properties: Vec<String>,
    pub validators: Vec<PostValidator>,
}

impl PostValidateConfig {
    /// A config with a single validator.
    pub fn new<I, S>(properties: I, validator: PostValidator) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_validators(properties, vec![validator])
    }

    /// A config whose validators run in order, stopping at the first failure.
    pub fn with_validators<I, S>(properties: I, validators: Vec<PostValidator>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
            validators,
        }
    }

    /// Appends a validator to the chain.
    #[must_use]
    pub fn then(mut self, validator: PostValidator) -> Self {
        self.validators.push(validator);
        self
    }
}

/// `postValidate` option: one config or a list of them.
#[derive(Debug, Clone)]
pub enum PostValidate {
    Single(PostValidateConfig),
    Many(Vec<PostValidateConfig>),
}

impl PostValidate {
    /// The configs in declaration order.
    pub fn configs(&self) -> &[PostValidateConfig] {
        match self {
            Self::Single(config) => std::slice::from_ref(config),
            Self::Many(configs) => configs,
        }
    }
}

impl From<PostValidateConfig> for PostValidate {
    fn from(config: PostValidateConfig) -> Self {
        Self::Single(config)
    }
}

impl From<Vec<PostValidateConfig>> for PostValidate {
    fn from(configs: Vec<PostValidateConfig>) -> Self {
        Self::Many(configs)
    }
}

/// Options accepted at schema construction.
#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    pub timestamps: Timestamps,
    pub post_validate: Option<PostValidate>,
}

impl SchemaOptions {
    /// Default options: no timestamps, no post-validation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `timestamps` option.
    #[must_use]
    pub fn timestamps(mut self, timestamps: impl Into<Timestamps>) -> Self {
        self.timestamps = timestamps.into();
        self
    }

    /// Sets the `postValidate` option.
    #[must_use]
    pub fn post_validate(mut self, post_validate: impl Into<PostValidate>) -> Self {
        self.post_validate = Some(post_validate.into());
        self
    }
}

impl From<bool> for Timestamps {
    fn from(enabled: bool) -> Self {
        Self::Toggle(enabled)
    }
}
