//! Reason strings reported by the definition validator.
//!
//! These strings are matched verbatim by callers; do not reword them.

pub const EMPTY_SCHEMA: &str = "A schema must have at least one property";
pub const EMPTY_DEFINITION: &str =
    "A property should at least be readonly, required, or have a default value";

pub const CONSTANT_VALUE_MISSING: &str = "Constant properties must have a value";
pub const CONSTANT_RULES: &str =
    "Constant properties can only have ('constant' & 'value') or 'onDelete'";
pub const VALUE_WITHOUT_CONSTANT: &str = "'value' rule can only be used with constant properties";

pub const STRICT_REQUIRED_DEFAULT: &str =
    "Strictly required properties cannot have a default value";
pub const CALLABLE_REQUIRED_DEFAULT: &str =
    "Callable required properties must have a default value";
pub const REQUIRED_INIT_BLOCKED: &str = "Required properties cannot have initialization blocked";

pub const LAX_DEFAULT: &str = "Lax properties must have a default value";
pub const LAX_REQUIRED: &str = "Lax properties cannot be required";
pub const LAX_INIT_BLOCKED: &str = "Lax properties cannot have initialization blocked";

pub const DEPENDENT_DEFAULT: &str = "Dependent properties must have a default value";
pub const DEPENDENT_NO_DEPENDENCIES: &str =
    "Dependent properties must depend on at least one property";
pub const DEPENDENT_NO_RESOLVER: &str = "Dependent properties must have a resolver";
pub const DEPENDENT_REQUIRED: &str = "Dependent properties cannot be required";
pub const DEPENDENT_VALIDATOR: &str = "Dependent properties cannot be validated";
pub const DEPENDENT_SHOULD_INIT: &str = "Dependent properties cannot have shouldInit rule";
pub const DEPENDENT_LAX: &str = "Dependent properties cannot be readonly 'lax'";
pub const DEPENDENCY_RULES_MISPLACED: &str =
    "dependsOn & resolver rules can only belong to dependent properties";
pub const SELF_DEPENDENCY: &str = "A property cannot depend on itself";

pub const VIRTUAL_NO_VALIDATOR: &str = "Virtuals must have a validator";
pub const VIRTUAL_UNUSED: &str =
    "A virtual property must have at least one property that depends on it";
pub const VIRTUAL_REQUIRED_INIT_BLOCKED: &str =
    "Required virtuals cannot have initialization blocked";
/// Rules a virtual may declare, in the order they are listed to the user.
pub const VIRTUAL_ALLOWED_RULES: [&str; 9] = [
    "alias",
    "onFailure",
    "onSuccess",
    "required",
    "sanitizer",
    "shouldInit",
    "shouldUpdate",
    "validator",
    "virtual",
];

pub const ALIAS_NOT_VIRTUAL: &str = "Only virtual properties can have aliases";
pub const ALIAS_EMPTY: &str = "An alias must be a string with at least 1 character";
pub const ALIAS_SELF: &str = "An alias cannot be the same as the virtual property";
pub const SANITIZER_NOT_VIRTUAL: &str = "'sanitizer' is only valid on virtuals";

pub const SIDE_EFFECT_NO_VALIDATOR: &str = "Side effects must have a validator";
pub const SIDE_EFFECT_NO_ON_CHANGE: &str = "Side effects must have at least one onChange listener";
pub const SIDE_EFFECT_LISTENERS: &str =
    "Side effects do not support onCreate, onDelete nor onUpdate listeners";
pub const SIDE_EFFECT_DEFAULT: &str = "Side effects cannot have default values";
pub const SIDE_EFFECT_DEPENDENT: &str = "Side effects cannot be dependent";
pub const SIDE_EFFECT_READONLY: &str = "Side effects cannot be readonly";
pub const SIDE_EFFECT_REQUIRED: &str = "Side effects cannot be required";

pub const TIMESTAMP_NAME_EMPTY: &str = "Timestamp names must be strings with at least 1 character";
pub const TIMESTAMP_SAME_NAME: &str = "createdAt & updatedAt cannot be same";

pub const POST_VALIDATE_PROPERTIES: &str =
    "\"properties\" must be an array of at least 2 input properties of your schema";
pub const POST_VALIDATE_DUPLICATES: &str = "\"properties\" array cannot contain duplicates";
pub const POST_VALIDATE_VALIDATOR: &str =
    "\"validator\" must be a function or an array of functions";
pub const POST_VALIDATE_EMPTY: &str =
    "\"postValidate\" must be a config object or a non-empty array of config objects";

pub fn unknown_dependency(dependency: &str) -> String {
    format!(
        "Cannot establish dependency with '{dependency}' as it is neither a property nor a virtual of your model"
    )
}

pub fn constant_dependency(dependency: &str) -> String {
    format!("A property cannot depend on '{dependency}' because it is a constant property")
}

pub fn circular_dependency(dependency: &str) -> String {
    format!("Circular dependency identified with '{dependency}'")
}

pub fn virtual_rules() -> String {
    format!(
        "Virtual properties can only have ({}) as rules",
        VIRTUAL_ALLOWED_RULES.join(", ")
    )
}

pub fn alias_taken(alias: &str, owner: &str) -> String {
    format!("Sorry, alias provided '{alias}' already belongs to property '{owner}'")
}

pub fn alias_is_property(alias: &str, property: &str) -> String {
    format!(
        "'{alias}' cannot be used as the alias of '{property}' because it is the name of an existing property on your schema. To use an alias that matches another property on your schema, this property must be dependent on the said virtual property"
    )
}

pub fn timestamp_taken(name: &str) -> String {
    format!("'{name}' already belongs to your schema")
}

pub fn cannot_post_validate(property: &str) -> String {
    format!("\"{property}\" cannot be post-validated")
}

pub fn config_reason(index: usize, reason: &str) -> String {
    format!("Config at index {index}: {reason}")
}

pub fn config_validator_reason(index: usize, reason: &str) -> String {
    format!("Config at index {index}:  {reason}")
}

pub fn config_same_properties(index: usize, other: usize) -> String {
    config_reason(index, &format!("has the same properties as config at index {other}"))
}

pub fn config_superset(index: usize, subset: usize) -> String {
    config_reason(
        index,
        &format!("\"properties\" cannot be a superset of config at index {subset}"),
    )
}
