//! Compiled schema.
//!
//! Definitions that pass the [`DefinitionValidator`] are compiled into
//! [`CompiledProperty`] values whose [`PropertyKind`] only carries the rules
//! legal for that kind. The engine never sees a [`PropertyDefinition`].

use crate::callbacks::{ConstantValue, Gate, Listener, Required, Resolver, Sanitizer, Validator};
use crate::error::{Result, SchemaError};
use crate::options::{PostValidateConfig, SchemaOptions, TimestampKeys};
use crate::property::{PropertyDefinition, Readonly};
use crate::validator::{Definitions, DefinitionValidator};
use formwork_types::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// Lifecycle hooks attached to a property.
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    pub on_create: Vec<Listener>,
    pub on_update: Vec<Listener>,
    pub on_change: Vec<Listener>,
    pub on_delete: Vec<Listener>,
    pub on_success: Vec<Listener>,
    pub on_failure: Vec<Listener>,
}

/// What a property is, with the rules that kind may carry.
#[derive(Debug, Clone)]
pub enum PropertyKind {
    /// Settable, persisted property.
    Real {
        default: Value,
        required: Option<Required>,
        readonly: Option<Readonly>,
        validator: Option<Validator>,
        should_init: Option<Gate>,
        should_update: Option<Gate>,
    },
    /// Persisted property computed from its triggers.
    Dependent {
        default: Value,
        depends_on: Vec<String>,
        resolver: Resolver,
        readonly: bool,
    },
    /// Write-only input that only feeds dependents.
    Virtual {
        alias: Option<String>,
        required: Option<Required>,
        validator: Validator,
        sanitizer: Option<Sanitizer>,
        should_init: Option<Gate>,
        should_update: Option<Gate>,
    },
    /// Write-only input consumed by its `onChange` listeners.
    SideEffect {
        validator: Validator,
        should_init: Option<Gate>,
        should_update: Option<Gate>,
    },
    /// Immutable value fixed at creation.
    Constant(ConstantValue),
}

/// A validated, compiled property.
#[derive(Debug, Clone)]
pub struct CompiledProperty {
    name: String,
    kind: PropertyKind,
    hooks: Hooks,
}

impl CompiledProperty {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Real, dependent and constant properties end up in entity data.
    pub fn is_persisted(&self) -> bool {
        matches!(
            self.kind,
            PropertyKind::Real { .. } | PropertyKind::Dependent { .. } | PropertyKind::Constant(_)
        )
    }

    /// Properties a caller may supply.
    pub fn is_input(&self) -> bool {
        matches!(
            self.kind,
            PropertyKind::Real { .. }
                | PropertyKind::Virtual { .. }
                | PropertyKind::SideEffect { .. }
        )
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, PropertyKind::Virtual { .. })
    }

    pub fn is_side_effect(&self) -> bool {
        matches!(self.kind, PropertyKind::SideEffect { .. })
    }

    pub fn is_dependent(&self) -> bool {
        matches!(self.kind, PropertyKind::Dependent { .. })
    }

    /// Default of a real or dependent property; `null` otherwise.
    pub fn default_value(&self) -> Value {
        match &self.kind {
            PropertyKind::Real { default, .. } | PropertyKind::Dependent { default, .. } => {
                default.clone()
            }
            _ => Value::Null,
        }
    }

    pub fn validator(&self) -> Option<&Validator> {
        match &self.kind {
            PropertyKind::Real { validator, .. } => validator.as_ref(),
            PropertyKind::Virtual { validator, .. }
            | PropertyKind::SideEffect { validator, .. } => Some(validator),
            _ => None,
        }
    }

    pub fn required(&self) -> Option<&Required> {
        match &self.kind {
            PropertyKind::Real { required, .. } | PropertyKind::Virtual { required, .. } => {
                required.as_ref()
            }
            _ => None,
        }
    }

    pub fn should_init(&self) -> Option<&Gate> {
        match &self.kind {
            PropertyKind::Real { should_init, .. }
            | PropertyKind::Virtual { should_init, .. }
            | PropertyKind::SideEffect { should_init, .. } => should_init.as_ref(),
            _ => None,
        }
    }

    pub fn should_update(&self) -> Option<&Gate> {
        match &self.kind {
            PropertyKind::Real { should_update, .. }
            | PropertyKind::Virtual { should_update, .. }
            | PropertyKind::SideEffect { should_update, .. } => should_update.as_ref(),
            _ => None,
        }
    }

    /// Readonly rule; a readonly dependent behaves as strict.
    pub fn readonly(&self) -> Option<Readonly> {
        match &self.kind {
            PropertyKind::Real { readonly, .. } => *readonly,
            PropertyKind::Dependent { readonly: true, .. } => Some(Readonly::Strict),
            _ => None,
        }
    }

    pub fn is_lax(&self) -> bool {
        self.readonly() == Some(Readonly::Lax)
    }

    pub fn sanitizer(&self) -> Option<&Sanitizer> {
        match &self.kind {
            PropertyKind::Virtual { sanitizer, .. } => sanitizer.as_ref(),
            _ => None,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::Virtual { alias, .. } => alias.as_deref(),
            _ => None,
        }
    }

    /// Trigger keys of a dependent; empty otherwise.
    pub fn depends_on(&self) -> &[String] {
        match &self.kind {
            PropertyKind::Dependent { depends_on, .. } => depends_on,
            _ => &[],
        }
    }

    pub fn resolver(&self) -> Option<&Resolver> {
        match &self.kind {
            PropertyKind::Dependent { resolver, .. } => Some(resolver),
            _ => None,
        }
    }

    pub fn constant(&self) -> Option<&ConstantValue> {
        match &self.kind {
            PropertyKind::Constant(value) => Some(value),
            _ => None,
        }
    }
}

/// A validated schema, ready to back a model.
#[derive(Debug, Clone)]
pub struct Schema {
    properties: IndexMap<String, CompiledProperty>,
    aliases: HashMap<String, String>,
    timestamps: Option<TimestampKeys>,
    post_validate: Vec<PostValidateConfig>,
}

impl Schema {
    /// Validates `definitions` and `options`, then compiles them.
    pub fn new(definitions: Definitions, options: SchemaOptions) -> Result<Self> {
        let report = DefinitionValidator::new(&definitions, &options).validate();
        if !report.valid {
            debug!(
                fields = ?report.errors_by_field.keys().collect::<Vec<_>>(),
                "schema rejected: {}", report.message
            );
            return Err(SchemaError::Invalid {
                message: report.message,
                payload: report.errors_by_field,
            });
        }

        let mut properties = IndexMap::with_capacity(definitions.len());
        let mut aliases = HashMap::new();
        for (name, definition) in definitions {
            let property = compile(name.clone(), definition)?;
            if let Some(alias) = property.alias() {
                aliases.insert(alias.to_string(), name.clone());
            }
            properties.insert(name, property);
        }

        let post_validate = options
            .post_validate
            .map(|post_validate| post_validate.configs().to_vec())
            .unwrap_or_default();

        debug!(properties = properties.len(), "schema compiled");
        Ok(Self {
            properties,
            aliases,
            timestamps: options.timestamps.keys(),
            post_validate,
        })
    }

    pub fn property(&self, name: &str) -> Option<&CompiledProperty> {
        self.properties.get(name)
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &CompiledProperty> {
        self.properties.values()
    }

    /// Maps an input key to its property. Aliases take precedence over
    /// property names so an alias can shadow the dependent it feeds.
    pub fn resolve_input_key(&self, key: &str) -> Option<&CompiledProperty> {
        self.aliases
            .get(key)
            .and_then(|name| self.properties.get(name))
            .or_else(|| self.properties.get(key))
    }

    /// Timestamp field names, when enabled.
    pub fn timestamps(&self) -> Option<&TimestampKeys> {
        self.timestamps.as_ref()
    }

    pub fn post_validators(&self) -> &[PostValidateConfig] {
        &self.post_validate
    }

    /// Persisted properties in declaration order.
    pub fn persisted(&self) -> impl Iterator<Item = &CompiledProperty> {
        self.properties().filter(|p| p.is_persisted())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn compile(name: String, def: PropertyDefinition) -> Result<CompiledProperty> {
    let missing = |rule: &'static str| SchemaError::Incomplete {
        property: name.clone(),
        rule,
    };

    let kind = if def.constant {
        PropertyKind::Constant(def.value.ok_or_else(|| missing("value"))?)
    } else if def.is_virtual {
        PropertyKind::Virtual {
            alias: def.alias,
            required: def.required,
            validator: def.validator.ok_or_else(|| missing("validator"))?,
            sanitizer: def.sanitizer,
            should_init: def.should_init,
            should_update: def.should_update,
        }
    } else if def.side_effect {
        PropertyKind::SideEffect {
            validator: def.validator.ok_or_else(|| missing("validator"))?,
            should_init: def.should_init,
            should_update: def.should_update,
        }
    } else if def.dependent {
        PropertyKind::Dependent {
            default: def.default.ok_or_else(|| missing("default"))?,
            depends_on: def.depends_on,
            resolver: def.resolver.ok_or_else(|| missing("resolver"))?,
            readonly: def.readonly.is_some(),
        }
    } else {
        PropertyKind::Real {
            default: def.default.unwrap_or(Value::Null),
            required: def.required,
            readonly: def.readonly,
            validator: def.validator,
            should_init: def.should_init,
            should_update: def.should_update,
        }
    };

    let hooks = Hooks {
        on_create: def.on_create,
        on_update: def.on_update,
        on_change: def.on_change,
        on_delete: def.on_delete,
        on_success: def.on_success,
        on_failure: def.on_failure,
    };

    Ok(CompiledProperty { name, kind, hooks })
}
