//! Lifecycle engine and model facade for formwork.
//!
//! [`define_schema`] validates property definitions and returns a
//! [`SchemaHandle`]; [`SchemaHandle::get_model`] yields a [`Model`] whose
//! operations each drive a [`LifecycleRunner`]:
//!
//! 1. **CollectingInput**: map input keys (names or aliases) to properties
//!    and drop the ones not eligible for this operation
//! 2. **Validating**: run validators concurrently, check required fields
//! 3. **ResolvingSideEffects**: recompute dependents through the
//!    [`DependencyGraph`], fire side-effect `onChange` listeners
//! 4. **RunningListeners**: `onCreate`/`onUpdate` and `onChange` chains;
//!    partial updates they return re-enter resolution one level deeper
//! 5. **PostValidating**: cross-field post-validators
//!
//! # Example
//!
//! ```
//! use formwork_engine::define_schema;
//! use formwork_schema::{Definitions, PropertyDefinition, SchemaOptions, Validator};
//! use serde_json::json;
//!
//! let mut definitions = Definitions::new();
//! definitions.insert(
//!     "name".to_string(),
//!     PropertyDefinition::new()
//!         .required()
//!         .validator(Validator::sync(|value, _| value.is_string())),
//! );
//!
//! let model = define_schema(definitions, SchemaOptions::new())
//!     .unwrap()
//!     .get_model();
//!
//! let input = formwork_types::into_record(json!({"name": "Ada"})).unwrap();
//! let created = futures::executor::block_on(model.create(input)).unwrap();
//! assert_eq!(created.data["name"], json!("Ada"));
//! ```

mod config;
mod context;
mod error;
mod graph;
mod model;
mod outcome;
mod post_validation;
mod runner;

pub use config::{ModelConfig, DEFAULT_MAX_RESOLUTION_DEPTH};
pub use context::OperationContext;
pub use error::{EngineError, Result};
pub use graph::DependencyGraph;
pub use model::{define_schema, CloneOptions, Model, SchemaHandle};
pub use outcome::{IntoEnvelope, OperationResult, Success, SuccessHandler};
pub use runner::{LifecycleRunner, LifecycleState};
