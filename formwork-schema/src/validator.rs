//! Static analysis of property definitions.
//!
//! Each field is classified into exactly one rule family (constant, virtual,
//! side effect, dependent, real) and every check of that family runs, so a
//! field reports all of its problems at once. Alias and sanitizer placement
//! are checked for every non-constant field.

use crate::messages as msg;
use crate::options::SchemaOptions;
use crate::post_validate;
use crate::property::PropertyDefinition;
use crate::Required;
use formwork_types::{ErrorAccumulator, ErrorMessage, FieldError};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};

/// Property definitions in declaration order.
pub type Definitions = IndexMap<String, PropertyDefinition>;

const CONSTANT_ALLOWED_RULES: [&str; 3] = ["constant", "onDelete", "value"];

/// Outcome of [`DefinitionValidator::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    /// `Invalid Schema` when a property definition is at fault, `Validation
    /// Error` when only the options are.
    pub message: ErrorMessage,
    pub errors_by_field: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    /// Reasons reported for `field`.
    pub fn reasons(&self, field: &str) -> &[String] {
        self.errors_by_field.get(field).map_or(&[], Vec::as_slice)
    }
}

/// Checks a definition map and its options for illegal rule combinations.
pub struct DefinitionValidator<'a> {
    definitions: &'a Definitions,
    options: &'a SchemaOptions,
}

impl<'a> DefinitionValidator<'a> {
    pub fn new(definitions: &'a Definitions, options: &'a SchemaOptions) -> Self {
        Self {
            definitions,
            options,
        }
    }

    /// Runs every check and aggregates the reasons per field.
    pub fn validate(&self) -> ValidationReport {
        let mut property_errors = ErrorAccumulator::new();
        if self.definitions.is_empty() {
            property_errors.add_reason("schema", msg::EMPTY_SCHEMA);
        }
        for (name, definition) in self.definitions {
            record(&mut property_errors, name, self.check_property(name, definition));
        }

        let mut option_errors = ErrorAccumulator::new();
        record(&mut option_errors, "timestamps", self.check_timestamps());
        if let Some(post_validate) = &self.options.post_validate {
            let reasons = post_validate::check(post_validate, self.definitions);
            record(&mut option_errors, "postValidate", reasons);
        }

        let message = if property_errors.is_loaded() {
            ErrorMessage::InvalidSchema
        } else {
            ErrorMessage::ValidationError
        };
        let mut errors_by_field = property_errors.reason_map();
        for (field, reasons) in option_errors.reason_map() {
            errors_by_field.entry(field).or_default().extend(reasons);
        }

        ValidationReport {
            valid: errors_by_field.is_empty(),
            message,
            errors_by_field,
        }
    }

    fn check_property(&self, name: &str, def: &PropertyDefinition) -> Vec<String> {
        if !def.has_base_rule() {
            return vec![msg::EMPTY_DEFINITION.to_string()];
        }

        let mut reasons = Vec::new();
        if def.constant {
            check_constant(def, &mut reasons);
            return reasons;
        }

        if def.is_virtual {
            self.check_virtual(name, def, &mut reasons);
        } else {
            if def.value.is_some() {
                reasons.push(msg::VALUE_WITHOUT_CONSTANT.to_string());
            }
            if def.side_effect {
                check_side_effect(def, &mut reasons);
            } else if def.dependent {
                self.check_dependent(name, def, &mut reasons);
            } else {
                check_real(def, &mut reasons);
            }
            if def.sanitizer.is_some() {
                reasons.push(msg::SANITIZER_NOT_VIRTUAL.to_string());
            }
        }

        self.check_alias(name, def, &mut reasons);
        reasons
    }

    fn check_virtual(&self, name: &str, def: &PropertyDefinition, reasons: &mut Vec<String>) {
        if def
            .rules()
            .iter()
            .any(|rule| !msg::VIRTUAL_ALLOWED_RULES.contains(rule))
        {
            reasons.push(msg::virtual_rules());
        }
        if def.validator.is_none() {
            reasons.push(msg::VIRTUAL_NO_VALIDATOR.to_string());
        }
        if !self.is_depended_upon(name) {
            reasons.push(msg::VIRTUAL_UNUSED.to_string());
        }
        if def.may_be_required() && def.init_blocked() {
            reasons.push(msg::VIRTUAL_REQUIRED_INIT_BLOCKED.to_string());
        }
    }

    fn check_dependent(&self, name: &str, def: &PropertyDefinition, reasons: &mut Vec<String>) {
        if def.default.is_none() {
            reasons.push(msg::DEPENDENT_DEFAULT.to_string());
        }
        if def.depends_on.is_empty() {
            reasons.push(msg::DEPENDENT_NO_DEPENDENCIES.to_string());
        }
        if def.resolver.is_none() {
            reasons.push(msg::DEPENDENT_NO_RESOLVER.to_string());
        }
        if def.required.is_some() {
            reasons.push(msg::DEPENDENT_REQUIRED.to_string());
        }
        if def.validator.is_some() {
            reasons.push(msg::DEPENDENT_VALIDATOR.to_string());
        }
        if def.should_init.is_some() {
            reasons.push(msg::DEPENDENT_SHOULD_INIT.to_string());
        }
        if def.is_lax() {
            reasons.push(msg::DEPENDENT_LAX.to_string());
        }

        for dependency in &def.depends_on {
            if dependency == name {
                reasons.push(msg::SELF_DEPENDENCY.to_string());
                continue;
            }
            match self.definitions.get(dependency) {
                None => reasons.push(msg::unknown_dependency(dependency)),
                Some(target) if target.constant => {
                    reasons.push(msg::constant_dependency(dependency));
                }
                Some(_) => {
                    if self.reaches(dependency, name) {
                        reasons.push(msg::circular_dependency(dependency));
                    }
                }
            }
        }
    }

    fn check_alias(&self, name: &str, def: &PropertyDefinition, reasons: &mut Vec<String>) {
        let Some(alias) = &def.alias else {
            return;
        };
        if !def.is_virtual {
            reasons.push(msg::ALIAS_NOT_VIRTUAL.to_string());
            return;
        }
        if alias.is_empty() {
            reasons.push(msg::ALIAS_EMPTY.to_string());
            return;
        }
        if alias == name {
            reasons.push(msg::ALIAS_SELF.to_string());
            return;
        }

        let earlier_owner = self
            .definitions
            .iter()
            .take_while(|(other, _)| other.as_str() != name)
            .find(|(_, other)| other.is_virtual && other.alias.as_deref() == Some(alias.as_str()))
            .map(|(owner, _)| owner);
        if let Some(owner) = earlier_owner {
            reasons.push(msg::alias_taken(alias, owner));
        }

        if let Some(target) = self.definitions.get(alias) {
            let derived = target.dependent && self.reaches(alias, name);
            if !derived {
                reasons.push(msg::alias_is_property(alias, name));
            }
        }
    }

    fn check_timestamps(&self) -> Vec<String> {
        let Some(keys) = self.options.timestamps.keys() else {
            return Vec::new();
        };
        if keys.created_at.is_empty() || keys.updated_at.is_empty() {
            return vec![msg::TIMESTAMP_NAME_EMPTY.to_string()];
        }

        let mut reasons = Vec::new();
        if keys.created_at == keys.updated_at {
            reasons.push(msg::TIMESTAMP_SAME_NAME.to_string());
        }
        for key in [&keys.created_at, &keys.updated_at] {
            let taken = self.definitions.contains_key(key)
                || self
                    .definitions
                    .values()
                    .any(|d| d.alias.as_deref() == Some(key.as_str()));
            if taken {
                let reason = msg::timestamp_taken(key);
                if !reasons.contains(&reason) {
                    reasons.push(reason);
                }
            }
        }
        reasons
    }

    /// True if some dependent property lists `name` in its `dependsOn`.
    fn is_depended_upon(&self, name: &str) -> bool {
        self.definitions
            .values()
            .any(|d| d.dependent && d.depends_on.iter().any(|dep| dep == name))
    }

    /// True if `from` is `target` or is derived from it through dependents.
    fn reaches(&self, from: &str, target: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(def) = self.definitions.get(current) {
                if def.dependent {
                    stack.extend(def.depends_on.iter().map(String::as_str));
                }
            }
        }
        false
    }
}

fn check_constant(def: &PropertyDefinition, reasons: &mut Vec<String>) {
    if def.value.is_none() {
        reasons.push(msg::CONSTANT_VALUE_MISSING.to_string());
    }
    if def
        .rules()
        .iter()
        .any(|rule| !CONSTANT_ALLOWED_RULES.contains(rule))
    {
        reasons.push(msg::CONSTANT_RULES.to_string());
    }
}

fn check_side_effect(def: &PropertyDefinition, reasons: &mut Vec<String>) {
    if def.validator.is_none() {
        reasons.push(msg::SIDE_EFFECT_NO_VALIDATOR.to_string());
    }
    if def.on_change.is_empty() {
        reasons.push(msg::SIDE_EFFECT_NO_ON_CHANGE.to_string());
    }
    if !def.on_create.is_empty() || !def.on_update.is_empty() || !def.on_delete.is_empty() {
        reasons.push(msg::SIDE_EFFECT_LISTENERS.to_string());
    }
    if def.default.is_some() {
        reasons.push(msg::SIDE_EFFECT_DEFAULT.to_string());
    }
    if def.dependent {
        reasons.push(msg::SIDE_EFFECT_DEPENDENT.to_string());
    } else if !def.depends_on.is_empty() || def.resolver.is_some() {
        reasons.push(msg::DEPENDENCY_RULES_MISPLACED.to_string());
    }
    if def.readonly.is_some() {
        reasons.push(msg::SIDE_EFFECT_READONLY.to_string());
    }
    if def.required.is_some() {
        reasons.push(msg::SIDE_EFFECT_REQUIRED.to_string());
    }
}

fn check_real(def: &PropertyDefinition, reasons: &mut Vec<String>) {
    if !def.depends_on.is_empty() || def.resolver.is_some() {
        reasons.push(msg::DEPENDENCY_RULES_MISPLACED.to_string());
    }

    match &def.required {
        Some(Required::Static(true)) if def.default.is_some() => {
            reasons.push(msg::STRICT_REQUIRED_DEFAULT.to_string());
        }
        Some(Required::When(_)) if def.default.is_none() => {
            reasons.push(msg::CALLABLE_REQUIRED_DEFAULT.to_string());
        }
        _ => {}
    }

    if def.is_lax() {
        if def.default.is_none() {
            reasons.push(msg::LAX_DEFAULT.to_string());
        }
        if def.may_be_required() {
            reasons.push(msg::LAX_REQUIRED.to_string());
        }
        if def.init_blocked() {
            reasons.push(msg::LAX_INIT_BLOCKED.to_string());
        }
    } else if def.may_be_required() && def.init_blocked() {
        reasons.push(msg::REQUIRED_INIT_BLOCKED.to_string());
    }
}

/// Stores every distinct reason of `field` in a single write.
fn record(errors: &mut ErrorAccumulator, field: &str, reasons: Vec<String>) {
    let mut distinct: Vec<String> = Vec::with_capacity(reasons.len());
    for reason in reasons {
        if !distinct.contains(&reason) {
            distinct.push(reason);
        }
    }
    if !distinct.is_empty() {
        errors.set(field, FieldError::with_reasons(distinct));
    }
}
