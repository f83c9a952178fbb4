//! Schema inference from example payloads.

use super::types::{SchemaNode, SchemaType};
use super::MAX_DEPTH;
use serde_json::{Number, Value};

/// Derive a structural descriptor from an example value.
///
/// `null` maps to `object`, arrays are typed by their first element only and
/// anything unrecognized maps to `string`. Both quirks are relied on by
/// existing exports and are kept as-is.
pub fn infer(value: &Value) -> SchemaNode {
    infer_at(value, 0)
}

fn infer_at(value: &Value, depth: usize) -> SchemaNode {
    if depth >= MAX_DEPTH {
        return SchemaNode::of(SchemaType::Object);
    }

    match value {
        Value::Null => SchemaNode::of(SchemaType::Object),
        Value::Array(items) => match items.first() {
            Some(first) => SchemaNode::array(infer_at(first, depth + 1)),
            None => SchemaNode::array(SchemaNode::of(SchemaType::Object)),
        },
        Value::Object(map) => SchemaNode::object(
            map.iter()
                .map(|(key, v)| (key.clone(), infer_at(v, depth + 1)))
                .collect(),
        ),
        Value::Number(n) if is_integral(n) => SchemaNode::of(SchemaType::Integer),
        Value::Number(_) => SchemaNode::of(SchemaType::Number),
        Value::Bool(_) => SchemaNode::of(SchemaType::Boolean),
        Value::String(_) => SchemaNode::of(SchemaType::String),
    }
}

fn is_integral(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64()
        .map(|f| f.is_finite() && f.fract() == 0.0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_infer_null_is_object() {
        assert_eq!(infer(&Value::Null), SchemaNode::of(SchemaType::Object));
    }

    #[test]
    fn test_infer_scalars() {
        assert_eq!(infer(&json!(42)).schema_type, SchemaType::Integer);
        assert_eq!(infer(&json!(-7)).schema_type, SchemaType::Integer);
        assert_eq!(infer(&json!(3.0)).schema_type, SchemaType::Integer);
        assert_eq!(infer(&json!(1.5)).schema_type, SchemaType::Number);
        assert_eq!(infer(&json!(true)).schema_type, SchemaType::Boolean);
        assert_eq!(infer(&json!("s")).schema_type, SchemaType::String);
    }

    #[test]
    fn test_infer_object() {
        let schema = infer(&json!({"name": "a", "age": 3, "tags": ["x"]}));
        assert_eq!(
            schema.to_json(),
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "age": {"type": "integer"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                }
            })
        );
    }

    #[test]
    fn test_infer_empty_object_has_empty_properties() {
        assert_eq!(
            infer(&json!({})).to_json(),
            json!({"type": "object", "properties": {}})
        );
    }

    #[test]
    fn test_infer_array_uses_first_element_only() {
        let schema = infer(&json!([1, "two", {"three": 3}]));
        assert_eq!(schema.items.unwrap().schema_type, SchemaType::Integer);
    }

    #[test]
    fn test_infer_empty_array_items_object() {
        assert_eq!(
            infer(&json!([])).to_json(),
            json!({"type": "array", "items": {"type": "object"}})
        );
    }

    #[test]
    fn test_infer_caps_depth() {
        let mut value = json!("leaf");
        for _ in 0..(MAX_DEPTH + 10) {
            value = json!([value]);
        }

        let mut node = infer(&value);
        let mut levels = 0;
        while let Some(items) = node.items {
            node = *items;
            levels += 1;
        }
        assert_eq!(levels, MAX_DEPTH);
        assert_eq!(node.schema_type, SchemaType::Object);
    }

    proptest! {
        #[test]
        fn prop_integers_infer_integer(n in any::<i64>()) {
            prop_assert_eq!(infer(&json!(n)).schema_type, SchemaType::Integer);
        }

        #[test]
        fn prop_fractions_infer_number(whole in -1_000_000i64..1_000_000, frac in 0.001f64..0.999) {
            let x = whole as f64 + frac;
            prop_assume!(x.fract() != 0.0);
            prop_assert_eq!(infer(&json!(x)).schema_type, SchemaType::Number);
        }

        #[test]
        fn prop_strings_infer_string(s in ".*") {
            prop_assert_eq!(infer(&json!(s)).schema_type, SchemaType::String);
        }

        #[test]
        fn prop_infer_is_pure(keys in proptest::collection::vec("[a-z]{1,8}", 0..6), n in any::<i32>()) {
            let value: Value = keys.iter().map(|k| (k.clone(), json!(n))).collect::<serde_json::Map<_, _>>().into();
            prop_assert_eq!(infer(&value), infer(&value));
        }
    }
}
