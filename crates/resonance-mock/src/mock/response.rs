//! Status and body selection for matched requests.

use super::request_log::MatchedEndpoint;
use crate::collection::Endpoint;
use crate::schema::{fallback_body, synthesize, SchemaNode};
use serde::Serialize;
use serde_json::{json, Value};

/// Where a response body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    /// Custom response set for the endpoint.
    Override,
    /// Built from the endpoint's declared success response.
    Synthesized,
    /// Endpoint declares no usable success response.
    Fallback,
    /// CORS preflight with no matching route.
    Preflight,
    NotFound,
}

/// Body decision for a matched endpoint. An override short-circuits
/// synthesis entirely.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseDecision {
    Override(Value),
    Synthesized {
        schema: Option<SchemaNode>,
        example: Option<Value>,
    },
    Fallback,
}

impl ResponseDecision {
    pub fn resolve(custom: Option<&Value>, endpoint: &Endpoint) -> Self {
        if let Some(body) = custom {
            return ResponseDecision::Override(body.clone());
        }
        match endpoint.success_media() {
            Some(media) => ResponseDecision::Synthesized {
                schema: media.schema.as_ref().map(SchemaNode::from_json),
                example: media.example.clone(),
            },
            None => ResponseDecision::Fallback,
        }
    }

    pub fn source(&self) -> ResponseSource {
        match self {
            ResponseDecision::Override(_) => ResponseSource::Override,
            ResponseDecision::Synthesized { .. } => ResponseSource::Synthesized,
            ResponseDecision::Fallback => ResponseSource::Fallback,
        }
    }

    pub fn into_body(self) -> Value {
        match self {
            ResponseDecision::Override(body) => body,
            ResponseDecision::Synthesized { schema, example } => {
                synthesize(schema.as_ref(), example.as_ref())
            }
            ResponseDecision::Fallback => fallback_body(),
        }
    }
}

/// Status used when no custom code is set.
pub fn default_status_for(method: &str) -> u16 {
    if method.eq_ignore_ascii_case("POST") {
        201
    } else if method.eq_ignore_ascii_case("DELETE") {
        204
    } else {
        200
    }
}

/// Status actually sent for a decided one. Informational codes cannot be a
/// final response, so they go out as 500.
pub fn wire_status(status: u16) -> u16 {
    if (100..200).contains(&status) {
        500
    } else {
        status
    }
}

/// Statuses whose responses carry no body on the wire.
pub fn is_bodyless(status: u16) -> bool {
    status == 204 || status == 304 || (100..200).contains(&status)
}

/// Fully decided mock response.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: u16,
    pub body: Value,
    pub source: ResponseSource,
    pub matched: Option<MatchedEndpoint>,
}

impl MockResponse {
    pub fn not_found(method: &str, path: &str) -> Self {
        Self {
            status: 404,
            body: json!({
                "error": "Endpoint not found",
                "path": path,
                "method": method,
            }),
            source: ResponseSource::NotFound,
            matched: None,
        }
    }

    pub fn preflight() -> Self {
        Self {
            status: 204,
            body: Value::Null,
            source: ResponseSource::Preflight,
            matched: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{MediaTypeSpec, ResponseSpec};
    use std::collections::BTreeMap;

    fn endpoint_with_success(media: MediaTypeSpec) -> Endpoint {
        Endpoint {
            responses: BTreeMap::from([(
                "200".to_string(),
                ResponseSpec {
                    content: BTreeMap::from([("application/json".to_string(), media)]),
                    ..Default::default()
                },
            )]),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_status() {
        assert_eq!(default_status_for("POST"), 201);
        assert_eq!(default_status_for("delete"), 204);
        assert_eq!(default_status_for("GET"), 200);
        assert_eq!(default_status_for("PATCH"), 200);
    }

    #[test]
    fn test_override_wins_over_schema() {
        let endpoint = endpoint_with_success(MediaTypeSpec {
            schema: Some(json!({"type": "object", "properties": {"a": {"type": "string"}}})),
            example: None,
        });
        let custom = json!({"custom": true});
        let decision = ResponseDecision::resolve(Some(&custom), &endpoint);
        assert_eq!(decision.source(), ResponseSource::Override);
        assert_eq!(decision.into_body(), custom);
    }

    #[test]
    fn test_null_override_is_a_body() {
        let decision = ResponseDecision::resolve(Some(&Value::Null), &Endpoint::default());
        assert_eq!(decision.into_body(), Value::Null);
    }

    #[test]
    fn test_synthesized_from_schema() {
        let endpoint = endpoint_with_success(MediaTypeSpec {
            schema: Some(json!({"type": "object", "properties": {
                "id": {"type": "integer"},
                "tags": {"type": "array", "items": {"type": "string"}}
            }})),
            example: None,
        });
        let decision = ResponseDecision::resolve(None, &endpoint);
        assert_eq!(decision.source(), ResponseSource::Synthesized);
        assert_eq!(decision.into_body(), json!({"id": 0, "tags": [""]}));
    }

    #[test]
    fn test_media_example_is_verbatim() {
        let endpoint = endpoint_with_success(MediaTypeSpec {
            schema: Some(json!({"type": "object"})),
            example: Some(json!({"id": 7})),
        });
        let body = ResponseDecision::resolve(None, &endpoint).into_body();
        assert_eq!(body, json!({"id": 7}));
    }

    #[test]
    fn test_fallback_without_success_response() {
        let decision = ResponseDecision::resolve(None, &Endpoint::default());
        assert_eq!(decision.source(), ResponseSource::Fallback);
        assert_eq!(decision.into_body(), json!({"message": "Success", "data": {}}));
    }

    #[test]
    fn test_not_found_shape() {
        let response = MockResponse::not_found("GET", "/nope");
        assert_eq!(response.status, 404);
        assert_eq!(
            response.body,
            json!({"error": "Endpoint not found", "path": "/nope", "method": "GET"})
        );
    }

    #[test]
    fn test_bodyless_statuses() {
        assert!(is_bodyless(204));
        assert!(is_bodyless(304));
        assert!(is_bodyless(101));
        assert!(!is_bodyless(200));
        assert!(!is_bodyless(404));
    }

    #[test]
    fn test_informational_status_is_not_final() {
        assert_eq!(wire_status(100), 500);
        assert_eq!(wire_status(199), 500);
        assert_eq!(wire_status(200), 200);
        assert_eq!(wire_status(418), 418);
    }
}
