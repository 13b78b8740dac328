use formwork_types::{ErrorAccumulator, ErrorMessage, FieldError, OperationError, Record};
use pretty_assertions::assert_eq;
use serde_json::json;

fn meta(value: serde_json::Value) -> Record {
    formwork_types::into_record(value).unwrap()
}

// ── First write ──────────────────────────────────────────────────

#[test]
fn new_accumulator_is_not_loaded() {
    let acc = ErrorAccumulator::new();
    assert!(!acc.is_loaded());
    assert!(acc.is_empty());
    assert!(acc.fields().is_empty());
}

#[test]
fn first_write_is_stored_verbatim() {
    let mut acc = ErrorAccumulator::new();
    let error = FieldError::with_reasons(["too short", "no digits"])
        .with_metadata(meta(json!({"min": 8})));
    acc.set("password", error.clone());

    assert!(acc.is_loaded());
    assert_eq!(acc.get("password"), Some(&error));
}

// ── Merge on duplicate key ───────────────────────────────────────

#[test]
fn later_write_unions_metadata() {
    let mut acc = ErrorAccumulator::new();
    acc.set("lax", FieldError::new("first").with_metadata(meta(json!({"a": 1, "shared": "old"}))));
    acc.set("lax", FieldError::new("first").with_metadata(meta(json!({"b": 2, "shared": "new"}))));

    let entry = acc.get("lax").unwrap();
    assert_eq!(entry.reasons, vec!["first".to_string()]);
    assert_eq!(
        entry.metadata.as_ref().unwrap(),
        &meta(json!({"a": 1, "shared": "new", "b": 2}))
    );
}

#[test]
fn later_write_keeps_first_reasons() {
    let mut acc = ErrorAccumulator::new();
    acc.set("age", FieldError::with_reasons(["too young", "not a number"]));
    acc.set("age", FieldError::with_reasons(["not a number", "negative"]));

    assert_eq!(acc.get("age").unwrap().reasons, vec!["too young", "not a number"]);
}

#[test]
fn later_write_merges_metadata_but_not_reasons() {
    let mut acc = ErrorAccumulator::new();
    acc.set("f", FieldError::new("first").with_metadata(meta(json!({"a": 1}))));
    acc.set("f", FieldError::new("second").with_metadata(meta(json!({"b": 2}))));

    let entry = acc.get("f").unwrap();
    assert_eq!(entry.reasons, vec!["first"]);
    assert_eq!(entry.metadata, Some(meta(json!({"a": 1, "b": 2}))));
}

#[test]
fn metadata_added_to_entry_without_metadata() {
    let mut acc = ErrorAccumulator::new();
    acc.add_reason("name", "required");
    acc.set("name", FieldError::new("required").with_metadata(meta(json!({"hint": "x"}))));

    assert_eq!(acc.get("name").unwrap().metadata, Some(meta(json!({"hint": "x"}))));
}

#[test]
fn absorb_merges_other_accumulator() {
    let mut a = ErrorAccumulator::new();
    a.add_reason("x", "one");
    let mut b = ErrorAccumulator::new();
    b.add_reason("x", "two");
    b.add_reason("y", "three");

    a.absorb(b);
    assert_eq!(a.len(), 2);
    assert_eq!(a.get("x").unwrap().reasons, vec!["one"]);
    assert_eq!(a.get("y").unwrap().reasons, vec!["three"]);
}

// ── Derived views ────────────────────────────────────────────────

#[test]
fn fields_are_sorted_not_insertion_ordered() {
    let mut acc = ErrorAccumulator::new();
    acc.add_reason("zeta", "z");
    acc.add_reason("alpha", "a");
    acc.add_reason("mid", "m");

    assert_eq!(acc.fields(), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn reason_map_drops_metadata() {
    let mut acc = ErrorAccumulator::new();
    acc.set("f", FieldError::new("bad").with_metadata(meta(json!({"k": 1}))));
    let map = acc.reason_map();
    assert_eq!(map.get("f").unwrap(), &vec!["bad".to_string()]);
}

#[test]
fn into_error_carries_message_and_payload() {
    let mut acc = ErrorAccumulator::new();
    acc.add_reason("price", "must be positive");
    let err = acc.into_error(ErrorMessage::ValidationError);

    assert_eq!(err.message, ErrorMessage::ValidationError);
    assert_eq!(err.reasons("price").unwrap(), ["must be positive".to_string()]);
    assert_eq!(err.to_string(), "Validation Error");
}

// ── OperationError ───────────────────────────────────────────────

#[test]
fn nothing_to_update_has_empty_payload() {
    let err = OperationError::nothing_to_update();
    assert!(err.is_nothing_to_update());
    assert!(err.payload.is_empty());
    assert_eq!(err.to_string(), "Nothing to update");
}

#[test]
fn operation_error_serializes_contract_shape() {
    let mut acc = ErrorAccumulator::new();
    acc.set("b", FieldError::new("bad b"));
    acc.set("a", FieldError::new("bad a").with_metadata(meta(json!({"n": 1}))));
    let err = acc.into_error(ErrorMessage::ValidationError);

    let value = serde_json::to_value(&err).unwrap();
    assert_eq!(
        value,
        json!({
            "message": "Validation Error",
            "payload": {
                "a": {"reasons": ["bad a"], "metadata": {"n": 1}},
                "b": {"reasons": ["bad b"], "metadata": null}
            }
        })
    );
    let keys: Vec<&String> = value["payload"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn error_message_strings() {
    assert_eq!(ErrorMessage::ValidationError.as_str(), "Validation Error");
    assert_eq!(ErrorMessage::InvalidSchema.as_str(), "Invalid Schema");
    assert_eq!(ErrorMessage::NothingToUpdate.as_str(), "Nothing to update");
    assert_eq!(ErrorMessage::CyclicResolution.as_str(), "Cyclic Resolution");
}
