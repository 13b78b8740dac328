//! Caller-supplied callbacks.
//!
//! Every callback is stored behind an `Arc` so definitions stay cheap to
//! clone, and every asynchronous callback yields a `'static` boxed future so
//! the engine can join them freely. An `Err` returned by a callback plays the
//! role of a thrown exception: the engine turns it into a field failure or a
//! logged fallback, it never propagates.

use crate::summary::Summary;
use formwork_types::{FieldError, Record, ValidationResult, Value, VALIDATION_FAILED};
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

macro_rules! opaque_debug {
    ($($ty:ident),* $(,)?) => {
        $(
            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(concat!(stringify!($ty), "(..)"))
                }
            }
        )*
    };
}

type ValidatorFn =
    dyn Fn(Value, Summary) -> BoxFuture<'static, anyhow::Result<ValidationResult>> + Send + Sync;
type SanitizerFn =
    dyn Fn(Value, Summary) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync;
type ResolverFn = dyn Fn(Summary) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync;
type ListenerFn =
    dyn Fn(Summary) -> BoxFuture<'static, anyhow::Result<ListenerResult>> + Send + Sync;
type PostValidatorFn =
    dyn Fn(Summary, Vec<String>) -> BoxFuture<'static, anyhow::Result<PostValidation>>
        + Send
        + Sync;

// ── Validator ────────────────────────────────────────────────────

/// Checks (and may normalize) one input value.
#[derive(Clone)]
pub struct Validator(Arc<ValidatorFn>);

impl Validator {
    /// Wraps an asynchronous validator.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, Summary) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ValidationResult>> + Send + 'static,
    {
        Self(Arc::new(move |value, summary| f(value, summary).boxed()))
    }

    /// Wraps a synchronous validator that cannot fail. Returning a `bool` is enough.
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(&Value, &Summary) -> R + Send + Sync + 'static,
        R: Into<ValidationResult>,
    {
        Self(Arc::new(move |value, summary| {
            future::ready(Ok(f(&value, &summary).into())).boxed()
        }))
    }

    /// Wraps a synchronous validator that may fail.
    pub fn try_sync<F>(f: F) -> Self
    where
        F: Fn(&Value, &Summary) -> anyhow::Result<ValidationResult> + Send + Sync + 'static,
    {
        Self(Arc::new(move |value, summary| future::ready(f(&value, &summary)).boxed()))
    }

    /// Runs the validator.
    pub fn call(
        &self,
        value: Value,
        summary: Summary,
    ) -> BoxFuture<'static, anyhow::Result<ValidationResult>> {
        (self.0)(value, summary)
    }
}

// ── Sanitizer ────────────────────────────────────────────────────

/// Transforms a validated virtual value before dependents see it.
#[derive(Clone)]
pub struct Sanitizer(Arc<SanitizerFn>);

impl Sanitizer {
    /// Wraps an asynchronous sanitizer.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, Summary) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self(Arc::new(move |value, summary| f(value, summary).boxed()))
    }

    /// Wraps a synchronous sanitizer.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Value, &Summary) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(move |value, summary| future::ready(f(&value, &summary)).boxed()))
    }

    /// Runs the sanitizer.
    pub fn call(
        &self,
        value: Value,
        summary: Summary,
    ) -> BoxFuture<'static, anyhow::Result<Value>> {
        (self.0)(value, summary)
    }
}

// ── Resolver ─────────────────────────────────────────────────────

/// Computes the value of a dependent property.
#[derive(Clone)]
pub struct Resolver(Arc<ResolverFn>);

impl Resolver {
    /// Wraps an asynchronous resolver.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Summary) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self(Arc::new(move |summary| f(summary).boxed()))
    }

    /// Wraps a synchronous resolver that cannot fail.
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(&Summary) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        Self(Arc::new(move |summary| future::ready(Ok(f(&summary).into())).boxed()))
    }

    /// Wraps a synchronous resolver that may fail.
    pub fn try_sync<F>(f: F) -> Self
    where
        F: Fn(&Summary) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(move |summary| future::ready(f(&summary)).boxed()))
    }

    /// Runs the resolver.
    pub fn call(&self, summary: Summary) -> BoxFuture<'static, anyhow::Result<Value>> {
        (self.0)(summary)
    }
}

// ── Listener ─────────────────────────────────────────────────────

/// What a listener hands back to the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ListenerResult {
    /// Nothing to fold back.
    #[default]
    NoOp,
    /// Values to treat as freshly provided input.
    PartialUpdate(Record),
}

impl From<()> for ListenerResult {
    fn from(_: ()) -> Self {
        Self::NoOp
    }
}

impl From<Record> for ListenerResult {
    fn from(partial: Record) -> Self {
        if partial.is_empty() {
            Self::NoOp
        } else {
            Self::PartialUpdate(partial)
        }
    }
}

impl From<Option<Record>> for ListenerResult {
    fn from(partial: Option<Record>) -> Self {
        partial.map_or(Self::NoOp, Self::from)
    }
}

impl From<Value> for ListenerResult {
    /// Objects become partial updates; every other shape is ignored.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from(map),
            _ => Self::NoOp,
        }
    }
}

/// Lifecycle hook (`onCreate`, `onUpdate`, `onChange`, `onDelete`,
/// `onSuccess`, `onFailure`).
#[derive(Clone)]
pub struct Listener(Arc<ListenerFn>);

impl Listener {
    /// Wraps an asynchronous listener.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Summary) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ListenerResult>> + Send + 'static,
    {
        Self(Arc::new(move |summary| f(summary).boxed()))
    }

    /// Wraps a synchronous listener that cannot fail.
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(&Summary) -> R + Send + Sync + 'static,
        R: Into<ListenerResult>,
    {
        Self(Arc::new(move |summary| future::ready(Ok(f(&summary).into())).boxed()))
    }

    /// Wraps a synchronous listener that may fail.
    pub fn try_sync<F>(f: F) -> Self
    where
        F: Fn(&Summary) -> anyhow::Result<ListenerResult> + Send + Sync + 'static,
    {
        Self(Arc::new(move |summary| future::ready(f(&summary)).boxed()))
    }

    /// Runs the listener.
    pub fn call(&self, summary: Summary) -> BoxFuture<'static, anyhow::Result<ListenerResult>> {
        (self.0)(summary)
    }
}

// ── Predicates ───────────────────────────────────────────────────

type PredicateFn = dyn Fn(&Summary) -> bool + Send + Sync;
type RequiredFn = dyn Fn(&Summary) -> RequiredCheck + Send + Sync;

/// `shouldInit` / `shouldUpdate` rule.
#[derive(Clone)]
pub enum Gate {
    Static(bool),
    When(Arc<PredicateFn>),
}

impl Gate {
    /// Builds a predicate gate.
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(&Summary) -> bool + Send + Sync + 'static,
    {
        Self::When(Arc::new(f))
    }

    /// Evaluates the gate.
    pub fn allows(&self, summary: &Summary) -> bool {
        match self {
            Self::Static(open) => *open,
            Self::When(f) => f(summary),
        }
    }

    /// True only for a literal `false`.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Static(false))
    }
}

impl From<bool> for Gate {
    fn from(open: bool) -> Self {
        Self::Static(open)
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(open) => write!(f, "Gate::Static({open})"),
            Self::When(_) => f.write_str("Gate::When(..)"),
        }
    }
}

/// Outcome of a callable `required` rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredCheck {
    pub required: bool,
    pub reason: Option<String>,
}

impl From<bool> for RequiredCheck {
    fn from(required: bool) -> Self {
        Self {
            required,
            reason: None,
        }
    }
}

impl From<(bool, &str)> for RequiredCheck {
    fn from((required, reason): (bool, &str)) -> Self {
        Self {
            required,
            reason: Some(reason.to_string()),
        }
    }
}

impl From<(bool, String)> for RequiredCheck {
    fn from((required, reason): (bool, String)) -> Self {
        Self {
            required,
            reason: Some(reason),
        }
    }
}

/// `required` rule: a literal or a predicate with an optional reason.
#[derive(Clone)]
pub enum Required {
    Static(bool),
    When(Arc<RequiredFn>),
}

impl Required {
    /// Builds a callable requirement.
    pub fn when<F, R>(f: F) -> Self
    where
        F: Fn(&Summary) -> R + Send + Sync + 'static,
        R: Into<RequiredCheck>,
    {
        Self::When(Arc::new(move |summary| f(summary).into()))
    }

    /// Evaluates the rule.
    pub fn check(&self, summary: &Summary) -> RequiredCheck {
        match self {
            Self::Static(required) => RequiredCheck::from(*required),
            Self::When(f) => f(summary),
        }
    }

    /// True for `required: true`.
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Static(true))
    }

    /// True for a predicate.
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::When(_))
    }

    /// True unless the rule is a literal `false`.
    pub fn may_require(&self) -> bool {
        !matches!(self, Self::Static(false))
    }
}

impl From<bool> for Required {
    fn from(required: bool) -> Self {
        Self::Static(required)
    }
}

impl fmt::Debug for Required {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(required) => write!(f, "Required::Static({required})"),
            Self::When(_) => f.write_str("Required::When(..)"),
        }
    }
}

// ── Constant values ──────────────────────────────────────────────

/// Value of a constant property: literal, or generated per entity.
#[derive(Clone)]
pub enum ConstantValue {
    Fixed(Value),
    Generated(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl ConstantValue {
    /// Produces the value for a new entity.
    pub fn produce(&self) -> Value {
        match self {
            Self::Fixed(value) => value.clone(),
            Self::Generated(f) => f(),
        }
    }

    /// True when every entity gets a freshly generated value.
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

impl fmt::Debug for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => write!(f, "ConstantValue::Fixed({value})"),
            Self::Generated(_) => f.write_str("ConstantValue::Generated(..)"),
        }
    }
}

// ── Post-validation ──────────────────────────────────────────────

/// Failure reported by a post-validator for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFailure {
    /// `false`, or a shape that carries no reason.
    Failed,
    Reason(String),
    Reasons(Vec<String>),
    Detailed {
        reasons: Vec<String>,
        metadata: Option<Record>,
    },
}

impl FieldFailure {
    /// Normalizes one dynamic field value. `None` means "no error".
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null | Value::Bool(true) => None,
            Value::Bool(false) => Some(Self::Failed),
            Value::String(reason) => Some(Self::Reason(reason)),
            Value::Array(items) => {
                let reasons: Vec<String> = items
                    .into_iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect();
                Some(if reasons.is_empty() {
                    Self::Failed
                } else {
                    Self::Reasons(reasons)
                })
            }
            Value::Object(mut map) => {
                let mut reasons = Vec::new();
                if let Some(Value::String(reason)) = map.remove("reason") {
                    reasons.push(reason);
                }
                if let Some(Value::Array(items)) = map.remove("reasons") {
                    reasons.extend(
                        items
                            .into_iter()
                            .filter_map(|i| i.as_str().map(str::to_string)),
                    );
                }
                let metadata = match map.remove("metadata") {
                    Some(Value::Object(meta)) => Some(meta),
                    _ => None,
                };
                Some(Self::Detailed { reasons, metadata })
            }
            Value::Number(_) => Some(Self::Failed),
        }
    }

    /// Converts into the accumulator entry.
    pub fn into_field_error(self) -> FieldError {
        let (reasons, metadata) = match self {
            Self::Failed => (Vec::new(), None),
            Self::Reason(reason) => (vec![reason], None),
            Self::Reasons(reasons) => (reasons, None),
            Self::Detailed { reasons, metadata } => (reasons, metadata),
        };
        let reasons = if reasons.is_empty() {
            vec![VALIDATION_FAILED.to_string()]
        } else {
            reasons
        };
        FieldError { reasons, metadata }
    }
}

/// Result of one post-validator.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PostValidation {
    #[default]
    Pass,
    Fail(BTreeMap<String, FieldFailure>),
}

impl PostValidation {
    /// Fails a single field with one reason.
    pub fn fail(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut failures = BTreeMap::new();
        failures.insert(field.into(), FieldFailure::Reason(reason.into()));
        Self::Fail(failures)
    }

    /// Returns true when at least one field failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail(failures) if !failures.is_empty())
    }
}

impl From<()> for PostValidation {
    fn from(_: ()) -> Self {
        Self::Pass
    }
}

impl From<Value> for PostValidation {
    /// Objects are field → failure maps; numbers, strings, arrays, booleans
    /// and null are "no error".
    fn from(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::Pass;
        };
        let failures: BTreeMap<String, FieldFailure> = map
            .into_iter()
            .filter_map(|(field, value)| FieldFailure::from_value(value).map(|f| (field, f)))
            .collect();
        if failures.is_empty() {
            Self::Pass
        } else {
            Self::Fail(failures)
        }
    }
}

/// Cross-field validator registered through a post-validate config.
///
/// Receives the operation summary and the config properties provided in
/// this operation.
#[derive(Clone)]
pub struct PostValidator(Arc<PostValidatorFn>);

impl PostValidator {
    /// Wraps an asynchronous post-validator.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Summary, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<PostValidation>> + Send + 'static,
    {
        Self(Arc::new(move |summary, provided| f(summary, provided).boxed()))
    }

    /// Wraps a synchronous post-validator that cannot fail.
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(&Summary, &[String]) -> R + Send + Sync + 'static,
        R: Into<PostValidation>,
    {
        Self(Arc::new(move |summary, provided| {
            future::ready(Ok(f(&summary, &provided).into())).boxed()
        }))
    }

    /// Wraps a synchronous post-validator that may fail.
    pub fn try_sync<F>(f: F) -> Self
    where
        F: Fn(&Summary, &[String]) -> anyhow::Result<PostValidation> + Send + Sync + 'static,
    {
        Self(Arc::new(move |summary, provided| future::ready(f(&summary, &provided)).boxed()))
    }

    /// Runs the post-validator.
    pub fn call(
        &self,
        summary: Summary,
        provided: Vec<String>,
    ) -> BoxFuture<'static, anyhow::Result<PostValidation>> {
        (self.0)(summary, provided)
    }
}

opaque_debug!(Validator, Sanitizer, Resolver, Listener, PostValidator);
