//! Model configuration.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Default bound on nested listener re-resolution.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 16;

/// Runtime knobs of a [`Model`](crate::Model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// How many times a listener's partial update may re-enter resolution
    /// before the operation fails with `Cyclic Resolution`.
    pub max_resolution_depth: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
        }
    }
}

impl ModelConfig {
    /// Parses a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = ModelConfig::from_json("{}").unwrap();
        assert_eq!(config.max_resolution_depth, DEFAULT_MAX_RESOLUTION_DEPTH);
    }

    #[test]
    fn depth_can_be_overridden() {
        let config = ModelConfig::from_json(r#"{"max_resolution_depth": 3}"#).unwrap();
        assert_eq!(config.max_resolution_depth, 3);
    }
}
