//! What create and update hand back.

use formwork_schema::{Listener, Summary};
use formwork_types::{OperationError, Record, Value};
use serde_json::json;
use tracing::warn;

/// Outcome of [`Model::create`](crate::Model::create) and
/// [`Model::update`](crate::Model::update): data or error, never both.
pub type OperationResult = Result<Success, OperationError>;

/// A successful operation.
#[derive(Debug)]
pub struct Success {
    /// Persisted values: all of them on create, the changed ones on update.
    pub data: Record,
    /// Deferred `onSuccess` hooks; call [`SuccessHandler::run`] once the
    /// data has been stored.
    pub handle_success: SuccessHandler,
}

/// Runs the `onSuccess` hooks of an operation.
#[derive(Debug)]
pub struct SuccessHandler {
    hooks: Vec<(String, Listener)>,
    summary: Summary,
}

impl SuccessHandler {
    pub(crate) fn new(hooks: Vec<(String, Listener)>, summary: Summary) -> Self {
        Self { hooks, summary }
    }

    /// Number of hooks that will run.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook in order and returns the final options snapshot.
    /// Hook errors are logged and skipped.
    pub async fn run(self) -> Record {
        for (property, hook) in &self.hooks {
            if let Err(error) = hook.call(self.summary.clone()).await {
                warn!(property = %property, %error, "onSuccess hook failed");
            }
        }
        self.summary.get_options()
    }
}

/// Renders a result as the `{ data, error }` envelope.
pub trait IntoEnvelope {
    fn into_envelope(self) -> Value;
}

impl IntoEnvelope for OperationResult {
    fn into_envelope(self) -> Value {
        match self {
            Ok(success) => json!({ "data": success.data, "error": null }),
            Err(error) => json!({ "data": null, "error": error }),
        }
    }
}
