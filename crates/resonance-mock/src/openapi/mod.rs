//! OpenAPI 3.0 export for collections.
//!
//! The output is a deliberately lossy subset: one fixed `200` response per
//! operation, request bodies with explicit or inferred schemas, parameters
//! and security schemes. `$ref`s are passed through, never resolved.

mod assemble;
mod document;
mod security;

use crate::collection::Collection;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use assemble::{assemble, assemble_with_report, sanitize_operation_id, ExportReport};
pub use document::{
    Components, ImplicitFlow, Info, MediaType, OAuthFlows, OpenApiDocument, Operation, Parameter,
    ParameterSchema, RequestBody, ResponseObject, SecurityScheme, Server, OPENAPI_VERSION,
};
pub use security::{default_scheme_name, OAUTH2_AUTHORIZATION_URL};

/// Output format for exported documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to serialize to JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to serialize to YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Render a document. JSON is pretty-printed with 2-space indentation; YAML
/// is emitted without anchors/aliases and without line folding.
pub fn serialize(document: &OpenApiDocument, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(document)?),
        ExportFormat::Yaml => Ok(serde_yaml::to_string(document)?),
    }
}

/// Assemble and render a collection in one step.
pub fn export_to_openapi(
    collection: &Collection,
    format: ExportFormat,
) -> Result<String, ExportError> {
    serialize(&assemble(collection), format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Endpoint;

    fn sample() -> Collection {
        Collection {
            id: "c1".into(),
            name: Some("Sample".into()),
            endpoints: vec![Endpoint {
                id: Some("e1".into()),
                method: Some("GET".into()),
                path: "/ping".into(),
                description: Some(
                    "A long description that goes well past eighty characters so that any line folding would show up in the output"
                        .into(),
                ),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("yml".parse::<ExportFormat>().unwrap(), ExportFormat::Yaml);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_json_uses_two_space_indent() {
        let out = export_to_openapi(&sample(), ExportFormat::Json).unwrap();
        assert!(out.starts_with("{\n  \"openapi\": \"3.0.3\""));
    }

    #[test]
    fn test_yaml_parses_back_to_same_document() {
        let doc = assemble(&sample());
        let out = serialize(&doc, ExportFormat::Yaml).unwrap();
        assert!(!out.contains('&') && !out.contains('*'));

        let parsed: OpenApiDocument = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_yaml_does_not_fold_long_lines() {
        let out = export_to_openapi(&sample(), ExportFormat::Yaml).unwrap();
        let line = out
            .lines()
            .find(|l| l.contains("description: A long description"))
            .unwrap();
        assert!(line.ends_with("in the output"));
    }
}
