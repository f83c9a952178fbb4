//! Collection model shared by the export and mock paths.
//!
//! Collections are owned by the storage layer. Nothing in this crate mutates
//! them; both the OpenAPI assembler and the mock route table read snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Methods that can be expressed as an OpenAPI operation or served by the mock server.
pub const HTTP_METHODS: [&str; 7] = ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Response codes consulted, in order, when looking for an endpoint's success response.
const PREFERRED_SUCCESS_CODES: [&str; 4] = ["200", "201", "202", "204"];

/// Returns true if `method` is one of [`HTTP_METHODS`] (case-insensitive).
pub fn is_http_method(method: &str) -> bool {
    HTTP_METHODS
        .iter()
        .any(|m| m.eq_ignore_ascii_case(method))
}

/// A named set of endpoint definitions, optionally organized into folders.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub folders: Vec<Folder>,
}

impl Collection {
    /// All endpoints of the collection: top-level endpoints first, then each
    /// folder's endpoints in folder order.
    pub fn all_endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints
            .iter()
            .chain(self.folders.iter().flat_map(|f| f.endpoints.iter()))
    }

    /// Name used in logs and match info; falls back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// One HTTP operation (method + path).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Path template; may contain `{param}` or `:param` segments.
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    pub parameters: Parameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodySpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, ResponseSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecuritySpec>,
}

fn default_path() -> String {
    "/".to_string()
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            id: None,
            method: None,
            path: default_path(),
            name: None,
            description: None,
            parameters: Parameters::default(),
            request_body: None,
            responses: BTreeMap::new(),
            security: None,
        }
    }
}

impl Endpoint {
    /// Upper-cased method, `GET` when none is declared.
    pub fn method_upper(&self) -> String {
        self.method
            .as_deref()
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| "GET".to_string())
    }

    /// Endpoint id, or the empty string when the endpoint has none.
    pub fn id_or_empty(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    /// Locate the endpoint's declared success response body, if any.
    ///
    /// Codes are tried as 200, 201, 202, 204, then any other 2xx ascending.
    /// Within a response, `application/json` wins over other media types.
    pub fn success_media(&self) -> Option<&MediaTypeSpec> {
        let preferred = PREFERRED_SUCCESS_CODES
            .iter()
            .filter_map(|code| self.responses.get(*code));
        let other_2xx = self
            .responses
            .iter()
            .filter(|(code, _)| code.starts_with('2') && !PREFERRED_SUCCESS_CODES.contains(&code.as_str()))
            .map(|(_, response)| response);

        preferred
            .chain(other_2xx)
            .find_map(ResponseSpec::preferred_media)
    }
}

/// Parameters grouped by location.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Parameters {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub path: BTreeMap<String, ParameterSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, ParameterSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub header: BTreeMap<String, ParameterSpec>,
}

impl Parameters {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty() && self.query.is_empty() && self.header.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Raw schema kept by importers; only its `type` is consulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl ParameterSpec {
    /// Declared type, then the schema's type, then `string`.
    pub fn type_name(&self) -> &str {
        self.param_type
            .as_deref()
            .or_else(|| {
                self.schema
                    .as_ref()
                    .and_then(|s| s.get("type"))
                    .and_then(Value::as_str)
            })
            .unwrap_or("string")
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestBodySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    /// Usually a JSON document stored as a string; a structured value is also accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ResponseSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaTypeSpec>,
}

impl ResponseSpec {
    fn preferred_media(&self) -> Option<&MediaTypeSpec> {
        self.content
            .get("application/json")
            .or_else(|| self.content.values().next())
            .filter(|media| media.schema.is_some() || media.example.is_some())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct MediaTypeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// Authentication attached to an endpoint: `{type, schemeName?, config?}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySpec {
    #[serde(rename = "type")]
    pub auth_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl SecuritySpec {
    /// String value from `config`, if present.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config
            .as_ref()
            .and_then(|c| c.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}
