//! Structural merge of partial state into a feature area
//!
//! Fields of the incoming partial are merged into the existing tree with
//! these precedence rules, applied at every level below the root:
//!
//! 1. An incoming array replaces the existing value wholesale.
//! 2. An incoming empty value (`{}`, `[]`, `""`, `null`) replaces the
//!    existing value. This is how a reducer clears a field.
//! 3. An incoming object replaces an existing array.
//! 4. Two non-empty objects merge field by field, incoming winning on
//!    conflicts. Scalars are overwritten.

use serde_json::{Map, Value};

/// Merge `incoming` into `target`
///
/// The root itself is always merged field by field when both sides are
/// objects, so an empty root partial leaves `target` unchanged. A non-object
/// root partial replaces `target`.
///
/// # Example
///
/// ```
/// use reflux_core::merge::merge;
/// use serde_json::json;
///
/// let mut state = json!({ "a": [1, 2], "x": { "foo": 1 }, "keep": true });
/// merge(&mut state, json!({ "a": [3], "x": {} }));
/// assert_eq!(state, json!({ "a": [3], "x": {}, "keep": true }));
/// ```
pub fn merge(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(fields)) => merge_fields(existing, fields),
        (target, incoming) => *target = incoming,
    }
}

fn merge_fields(existing: &mut Map<String, Value>, fields: Map<String, Value>) {
    for (key, incoming) in fields {
        match existing.get_mut(&key) {
            Some(current) => merge_value(current, incoming),
            None => {
                existing.insert(key, incoming);
            },
        }
    }
}

fn merge_value(current: &mut Value, incoming: Value) {
    if is_empty(&incoming) {
        *current = incoming;
        return;
    }

    match (current, incoming) {
        (Value::Object(existing), Value::Object(fields)) => merge_fields(existing, fields),
        // Arrays, objects over arrays and scalars all replace
        (current, incoming) => *current = incoming,
    }
}

/// True for values that carry nothing: `null`, `""`, `[]` and `{}`
#[must_use]
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_arrays_replace_instead_of_concatenating() {
        let mut state = json!({ "a": [1, 2] });
        merge(&mut state, json!({ "a": [3] }));
        assert_eq!(state, json!({ "a": [3] }));
    }

    #[test]
    fn test_empty_object_clears_field() {
        let mut state = json!({ "x": { "foo": 1 } });
        merge(&mut state, json!({ "x": {} }));
        assert_eq!(state, json!({ "x": {} }));
    }

    #[test]
    fn test_empty_array_clears_field() {
        let mut state = json!({ "x": [1, 2, 3] });
        merge(&mut state, json!({ "x": [] }));
        assert_eq!(state, json!({ "x": [] }));
    }

    #[test]
    fn test_object_replaces_existing_array() {
        let mut state = json!({ "x": [1, 2] });
        merge(&mut state, json!({ "x": { "k": "v" } }));
        assert_eq!(state, json!({ "x": { "k": "v" } }));
    }

    #[test]
    fn test_nested_objects_merge_with_incoming_precedence() {
        let mut state = json!({
            "cart": { "data": { "items": [1], "owner": "ann" }, "loading": true, "error": "old" }
        });
        merge(
            &mut state,
            json!({ "cart": { "data": { "items": [2, 3] }, "loading": false } }),
        );
        assert_eq!(
            state,
            json!({
                "cart": { "data": { "items": [2, 3], "owner": "ann" }, "loading": false, "error": "old" }
            })
        );
    }

    #[test]
    fn test_null_overwrites_existing_value() {
        let mut state = json!({ "error": "boom" });
        merge(&mut state, json!({ "error": null }));
        assert_eq!(state, json!({ "error": null }));
    }

    #[test]
    fn test_empty_root_partial_is_a_no_op() {
        let mut state = json!({ "a": 1 });
        merge(&mut state, json!({}));
        assert_eq!(state, json!({ "a": 1 }));
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::from),
            prop::collection::vec(any::<i32>().prop_map(Value::from), 0..4).prop_map(Value::from),
        ]
    }

    // Objects nested two levels deep, empty ones included
    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(2, 24, 4, |inner| {
            prop::collection::btree_map("[a-e]", inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect()))
        })
    }

    fn object() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map("[a-e]", value(), 0..5)
            .prop_map(|fields| fields.into_iter().collect())
    }

    /// Incoming fields win at every level; fields only in `existing` survive
    fn check_merged(
        existing: &Map<String, Value>,
        incoming: &Map<String, Value>,
        merged: &Map<String, Value>,
    ) -> Result<(), TestCaseError> {
        for (key, value) in incoming {
            match (existing.get(key), value) {
                (Some(Value::Object(old)), Value::Object(new)) if !new.is_empty() => {
                    let Some(Value::Object(nested)) = merged.get(key) else {
                        return Err(TestCaseError::fail(format!("{key} should still be an object")));
                    };
                    check_merged(old, new, nested)?;
                },
                _ => {
                    prop_assert_eq!(merged.get(key), Some(value));
                },
            }
        }

        for (key, value) in existing {
            if !incoming.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }

        prop_assert_eq!(
            merged.len(),
            existing
                .keys()
                .chain(incoming.keys())
                .collect::<std::collections::BTreeSet<_>>()
                .len()
        );
        Ok(())
    }

    proptest! {
        #[test]
        fn test_incoming_fields_always_win(existing in object(), incoming in object()) {
            let mut state = Value::Object(existing.clone());
            merge(&mut state, Value::Object(incoming.clone()));

            let Value::Object(merged) = &state else {
                return Err(TestCaseError::fail("root should stay an object"));
            };
            check_merged(&existing, &incoming, merged)?;
        }
    }
}
