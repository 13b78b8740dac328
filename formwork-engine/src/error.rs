//! Engine error types.

use formwork_schema::SchemaError;

/// Result type alias for engine setup.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised while setting up a model. Operation failures are reported
/// as [`OperationError`](formwork_types::OperationError) instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
