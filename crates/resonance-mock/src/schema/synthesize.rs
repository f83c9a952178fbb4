//! Example synthesis from schema descriptors.

use super::types::{SchemaNode, SchemaType};
use super::MAX_DEPTH;
use serde_json::{json, Map, Value};

/// Body served when an endpoint declares no response schema or example.
pub fn fallback_body() -> Value {
    json!({"message": "Success", "data": {}})
}

/// Produce a concrete payload.
///
/// Precedence: `explicit_example` verbatim, then the schema (each node
/// preferring its own `example`, recursing through properties and items
/// otherwise), then [`fallback_body`] when there is no schema at all.
/// Deterministic for identical input.
pub fn synthesize(schema: Option<&SchemaNode>, explicit_example: Option<&Value>) -> Value {
    if let Some(example) = explicit_example {
        return example.clone();
    }
    match schema {
        Some(node) => synthesize_node(node, 0),
        None => fallback_body(),
    }
}

fn synthesize_node(node: &SchemaNode, depth: usize) -> Value {
    if let Some(example) = &node.example {
        return example.clone();
    }

    match node.schema_type {
        SchemaType::Object => {
            let mut object = Map::new();
            if depth < MAX_DEPTH {
                for (name, property) in node.properties.iter().flatten() {
                    object.insert(name.clone(), synthesize_node(property, depth + 1));
                }
            }
            Value::Object(object)
        }
        SchemaType::Array => match &node.items {
            Some(items) if depth < MAX_DEPTH => Value::Array(vec![synthesize_node(items, depth + 1)]),
            _ => Value::Array(Vec::new()),
        },
        SchemaType::String => Value::String(String::new()),
        SchemaType::Number | SchemaType::Integer => json!(0),
        SchemaType::Boolean => Value::Bool(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::infer;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_explicit_example_wins() {
        let schema = SchemaNode {
            example: Some(json!({"from": "schema"})),
            ..SchemaNode::of(SchemaType::Object)
        };
        let explicit = json!({"from": "explicit"});
        assert_eq!(synthesize(Some(&schema), Some(&explicit)), explicit);
    }

    #[test]
    fn test_explicit_example_without_schema() {
        let explicit = json!([1, 2]);
        assert_eq!(synthesize(None, Some(&explicit)), explicit);
    }

    #[test]
    fn test_schema_example_wins_over_type_default() {
        let schema = SchemaNode {
            example: Some(json!("hello")),
            ..SchemaNode::of(SchemaType::String)
        };
        assert_eq!(synthesize(Some(&schema), None), json!("hello"));
    }

    #[test]
    fn test_type_defaults() {
        let cases = [
            (SchemaType::Object, json!({})),
            (SchemaType::Array, json!([])),
            (SchemaType::String, json!("")),
            (SchemaType::Number, json!(0)),
            (SchemaType::Integer, json!(0)),
            (SchemaType::Boolean, json!(false)),
        ];
        for (schema_type, expected) in cases {
            assert_eq!(synthesize(Some(&SchemaNode::of(schema_type)), None), expected);
        }
    }

    #[test]
    fn test_recurses_through_properties_and_items() {
        let mut properties = BTreeMap::new();
        properties.insert(
            "id".to_string(),
            SchemaNode {
                example: Some(json!(7)),
                ..SchemaNode::of(SchemaType::Integer)
            },
        );
        properties.insert(
            "tags".to_string(),
            SchemaNode::array(SchemaNode::of(SchemaType::String)),
        );
        properties.insert("active".to_string(), SchemaNode::of(SchemaType::Boolean));

        let body = synthesize(Some(&SchemaNode::object(properties)), None);
        assert_eq!(body, json!({"id": 7, "tags": [""], "active": false}));
    }

    #[test]
    fn test_missing_schema_uses_fallback() {
        assert_eq!(synthesize(None, None), json!({"message": "Success", "data": {}}));
    }

    #[test]
    fn test_inferred_schema_synthesizes_same_shape() {
        let schema = infer(&json!({"user": {"name": "x", "scores": [1.5]}}));
        assert_eq!(
            synthesize(Some(&schema), None),
            json!({"user": {"name": "", "scores": [0]}})
        );
    }

    proptest! {
        #[test]
        fn prop_synthesize_is_deterministic(keys in proptest::collection::vec("[a-z]{1,6}", 0..8)) {
            let value: Value = keys
                .iter()
                .enumerate()
                .map(|(i, k)| (k.clone(), if i % 2 == 0 { json!([true]) } else { json!("s") }))
                .collect::<Map<_, _>>()
                .into();
            let schema = infer(&value);
            prop_assert_eq!(synthesize(Some(&schema), None), synthesize(Some(&schema), None));
        }
    }
}
