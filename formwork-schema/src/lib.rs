//! Property definitions and schema compilation for formwork.
//!
//! A schema starts life as an ordered map of loose [`PropertyDefinition`]s.
//! [`Schema::new`] runs the [`DefinitionValidator`] over them and, if every
//! rule combination is legal, compiles each one into a [`CompiledProperty`]
//! with a closed [`PropertyKind`].
//!
//! ```text
//! PropertyDefinition ──▶ DefinitionValidator ──▶ Schema { CompiledProperty.. }
//!                              │
//!                              └──▶ SchemaError::Invalid { message, payload }
//! ```
//!
//! User callbacks (validators, resolvers, listeners, post-validators) are
//! async and fallible; see [`callbacks`].

pub mod callbacks;
mod error;
pub mod messages;
mod options;
mod post_validate;
mod property;
mod schema;
mod summary;
mod validator;

pub use callbacks::{
    ConstantValue, FieldFailure, Gate, Listener, ListenerResult, PostValidation, PostValidator,
    Required, RequiredCheck, Resolver, Sanitizer, Validator,
};
pub use error::{Result, SchemaError};
pub use options::{
    PostValidate, PostValidateConfig, SchemaOptions, TimestampKeys, Timestamps,
    DEFAULT_CREATED_AT, DEFAULT_UPDATED_AT,
};
pub use property::{PropertyDefinition, Readonly};
pub use schema::{CompiledProperty, Hooks, PropertyKind, Schema};
pub use summary::{OptionsHandle, Summary};
pub use validator::{Definitions, DefinitionValidator, ValidationReport};
