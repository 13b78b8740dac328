//! Loose property definition builder.
//!
//! A [`PropertyDefinition`] accepts any combination of rules, legal or not.
//! The definition validator decides whether the combination makes sense and
//! the schema compiler turns legal ones into a closed [`PropertyKind`].
//!
//! [`PropertyKind`]: crate::PropertyKind

use crate::callbacks::{
    ConstantValue, Gate, Listener, Required, RequiredCheck, Resolver, Sanitizer, Validator,
};
use crate::summary::Summary;
use formwork_types::Value;
use std::sync::Arc;

/// `readonly` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readonly {
    /// Settable at creation, then only while still equal to its default.
    Strict,
    /// Only set when the caller supplies it; immutable after its first change.
    Lax,
}

/// One entry of a schema, as written by the caller.
#[derive(Debug, Clone, Default)]
pub struct PropertyDefinition {
    pub(crate) default: Option<Value>,
    pub(crate) required: Option<Required>,
    pub(crate) readonly: Option<Readonly>,
    pub(crate) dependent: bool,
    pub(crate) depends_on: Vec<String>,
    pub(crate) resolver: Option<Resolver>,
    pub(crate) is_virtual: bool,
    pub(crate) alias: Option<String>,
    pub(crate) side_effect: bool,
    pub(crate) validator: Option<Validator>,
    pub(crate) sanitizer: Option<Sanitizer>,
    pub(crate) should_init: Option<Gate>,
    pub(crate) should_update: Option<Gate>,
    pub(crate) on_create: Vec<Listener>,
    pub(crate) on_update: Vec<Listener>,
    pub(crate) on_change: Vec<Listener>,
    pub(crate) on_delete: Vec<Listener>,
    pub(crate) on_success: Vec<Listener>,
    pub(crate) on_failure: Vec<Listener>,
    pub(crate) constant: bool,
    pub(crate) value: Option<ConstantValue>,
}

impl PropertyDefinition {
    /// An empty definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `default`
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// `required: true`
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = Some(Required::Static(true));
        self
    }

    /// `required: (summary) => boolean | [boolean, reason]`
    #[must_use]
    pub fn required_when<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Summary) -> R + Send + Sync + 'static,
        R: Into<RequiredCheck>,
    {
        self.required = Some(Required::when(f));
        self
    }

    /// `readonly: true`
    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.readonly = Some(Readonly::Strict);
        self
    }

    /// `readonly: "lax"`
    #[must_use]
    pub fn readonly_lax(mut self) -> Self {
        self.readonly = Some(Readonly::Lax);
        self
    }

    /// `dependent: true`
    #[must_use]
    pub fn dependent(mut self) -> Self {
        self.dependent = true;
        self
    }

    /// `dependsOn`. Repeated keys are kept once.
    #[must_use]
    pub fn depends_on<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            let key = key.into();
            if !self.depends_on.contains(&key) {
                self.depends_on.push(key);
            }
        }
        self
    }

    /// `resolver`
    #[must_use]
    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// `virtual: true`
    #[must_use]
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// `alias`
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// `sideEffect: true`
    #[must_use]
    pub fn side_effect(mut self) -> Self {
        self.side_effect = true;
        self
    }

    /// `validator`
    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// `sanitizer`
    #[must_use]
    pub fn sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    /// `shouldInit`
    #[must_use]
    pub fn should_init(mut self, gate: impl Into<Gate>) -> Self {
        self.should_init = Some(gate.into());
        self
    }

    /// `shouldUpdate`
    #[must_use]
    pub fn should_update(mut self, gate: impl Into<Gate>) -> Self {
        self.should_update = Some(gate.into());
        self
    }

    /// Appends an `onCreate` listener.
    #[must_use]
    pub fn on_create(mut self, listener: Listener) -> Self {
        self.on_create.push(listener);
        self
    }

    /// Appends an `onUpdate` listener.
    #[must_use]
    pub fn on_update(mut self, listener: Listener) -> Self {
        self.on_update.push(listener);
        self
    }

    /// Appends an `onChange` listener.
    #[must_use]
    pub fn on_change(mut self, listener: Listener) -> Self {
        self.on_change.push(listener);
        self
    }

    /// Appends an `onDelete` listener.
    #[must_use]
    pub fn on_delete(mut self, listener: Listener) -> Self {
        self.on_delete.push(listener);
        self
    }

    /// Appends an `onSuccess` hook.
    #[must_use]
    pub fn on_success(mut self, listener: Listener) -> Self {
        self.on_success.push(listener);
        self
    }

    /// Appends an `onFailure` hook.
    #[must_use]
    pub fn on_failure(mut self, listener: Listener) -> Self {
        self.on_failure.push(listener);
        self
    }

    /// `constant: true`
    #[must_use]
    pub fn constant(mut self) -> Self {
        self.constant = true;
        self
    }

    /// `value` of a constant.
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(ConstantValue::Fixed(value.into()));
        self
    }

    /// `value` of a constant, generated for every new entity.
    #[must_use]
    pub fn value_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.value = Some(ConstantValue::Generated(Arc::new(f)));
        self
    }

    /// Names of the rules this definition declares, alphabetically.
    pub fn rules(&self) -> Vec<&'static str> {
        let declared = [
            ("alias", self.alias.is_some()),
            ("constant", self.constant),
            ("default", self.default.is_some()),
            ("dependent", self.dependent),
            ("dependsOn", !self.depends_on.is_empty()),
            ("onChange", !self.on_change.is_empty()),
            ("onCreate", !self.on_create.is_empty()),
            ("onDelete", !self.on_delete.is_empty()),
            ("onFailure", !self.on_failure.is_empty()),
            ("onSuccess", !self.on_success.is_empty()),
            ("onUpdate", !self.on_update.is_empty()),
            ("readonly", self.readonly.is_some()),
            ("required", self.required.is_some()),
            ("resolver", self.resolver.is_some()),
            ("sanitizer", self.sanitizer.is_some()),
            ("shouldInit", self.should_init.is_some()),
            ("shouldUpdate", self.should_update.is_some()),
            ("sideEffect", self.side_effect),
            ("validator", self.validator.is_some()),
            ("value", self.value.is_some()),
            ("virtual", self.is_virtual),
        ];
        declared
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect()
    }

    /// True if the definition names a value source or an access rule.
    pub(crate) fn has_base_rule(&self) -> bool {
        self.default.is_some()
            || self.readonly.is_some()
            || self.required.is_some()
            || self.dependent
            || self.is_virtual
            || self.side_effect
            || self.constant
    }

    pub(crate) fn is_lax(&self) -> bool {
        self.readonly == Some(Readonly::Lax)
    }

    pub(crate) fn may_be_required(&self) -> bool {
        self.required.as_ref().is_some_and(Required::may_require)
    }

    pub(crate) fn init_blocked(&self) -> bool {
        self.should_init.as_ref().is_some_and(Gate::is_blocked)
    }
}
