//! Schema descriptor types.

use super::MAX_DEPTH;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "object" => Some(SchemaType::Object),
            "array" => Some(SchemaType::Array),
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            _ => None,
        }
    }
}

/// Recursive structural description of a JSON value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchemaNode {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl SchemaNode {
    /// A bare node of the given type.
    pub fn of(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            properties: None,
            items: None,
            example: None,
        }
    }

    pub fn object(properties: BTreeMap<String, SchemaNode>) -> Self {
        Self {
            properties: Some(properties),
            ..Self::of(SchemaType::Object)
        }
    }

    pub fn array(items: SchemaNode) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array)
        }
    }

    /// Leniently read a descriptor out of an imported JSON schema.
    ///
    /// Unknown or missing `type` is taken from the shape (`properties` means
    /// object, `items` means array) and otherwise defaults to object.
    /// Keywords this crate does not model (`$ref`, `oneOf`, formats, ...)
    /// are ignored.
    pub fn from_json(value: &Value) -> Self {
        Self::from_json_at(value, 0)
    }

    fn from_json_at(value: &Value, depth: usize) -> Self {
        let declared = value
            .get("type")
            .and_then(Value::as_str)
            .and_then(SchemaType::parse);
        let properties = value.get("properties").and_then(Value::as_object);
        let items = value.get("items").filter(|v| v.is_object());

        let schema_type = declared.unwrap_or(if properties.is_some() {
            SchemaType::Object
        } else if items.is_some() {
            SchemaType::Array
        } else {
            SchemaType::Object
        });

        let mut node = Self::of(schema_type);
        node.example = value.get("example").filter(|v| !v.is_null()).cloned();
        if depth >= MAX_DEPTH {
            return node;
        }

        match schema_type {
            SchemaType::Object => {
                node.properties = properties.map(|props| {
                    props
                        .iter()
                        .map(|(name, prop)| (name.clone(), Self::from_json_at(prop, depth + 1)))
                        .collect()
                });
            }
            SchemaType::Array => {
                node.items = items.map(|item| Box::new(Self::from_json_at(item, depth + 1)));
            }
            _ => {}
        }
        node
    }

    /// Serialize to a JSON value for embedding in a document.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_without_empty_fields() {
        let node = SchemaNode::of(SchemaType::Integer);
        assert_eq!(node.to_json(), json!({"type": "integer"}));
    }

    #[test]
    fn test_from_json_reads_nested_shape() {
        let node = SchemaNode::from_json(&json!({
            "type": "object",
            "properties": {
                "tags": {"type": "array", "items": {"type": "string", "example": "red"}},
                "count": {"type": "integer"}
            }
        }));

        let props = node.properties.as_ref().unwrap();
        assert_eq!(props["count"].schema_type, SchemaType::Integer);
        let items = props["tags"].items.as_ref().unwrap();
        assert_eq!(items.example, Some(json!("red")));
    }

    #[test]
    fn test_from_json_infers_type_from_shape() {
        let node = SchemaNode::from_json(&json!({"items": {"type": "boolean"}}));
        assert_eq!(node.schema_type, SchemaType::Array);

        let node = SchemaNode::from_json(&json!({"$ref": "#/components/schemas/Pet"}));
        assert_eq!(node.schema_type, SchemaType::Object);
        assert!(node.properties.is_none());
    }

    #[test]
    fn test_from_json_unknown_type_is_object() {
        let node = SchemaNode::from_json(&json!({"type": "null"}));
        assert_eq!(node.schema_type, SchemaType::Object);
    }
}
