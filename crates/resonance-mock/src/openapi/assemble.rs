//! Collection -> OpenAPI document conversion.

use super::document::{
    Components, Info, MediaType, OpenApiDocument, Operation, Parameter, ParameterSchema,
    RequestBody, ResponseObject, Server, OPENAPI_VERSION,
};
use super::security::{requirement_name, scheme_for};
use crate::collection::{is_http_method, Collection, Endpoint, ParameterSpec, RequestBodySpec};
use crate::schema::{infer, SchemaNode, SchemaType};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

const DEFAULT_TITLE: &str = "API Collection";
const DEFAULT_VERSION: &str = "1.0.0";
const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Assembled document plus the endpoints that could not be expressed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub document: OpenApiDocument,
    /// Names of endpoints left out because their method is not an HTTP verb.
    pub skipped: Vec<String>,
}

/// Build an OpenAPI document for a collection. Never fails.
pub fn assemble(collection: &Collection) -> OpenApiDocument {
    assemble_with_report(collection).document
}

/// Like [`assemble`], also reporting endpoints that were skipped.
pub fn assemble_with_report(collection: &Collection) -> ExportReport {
    let mut paths: BTreeMap<String, BTreeMap<String, Operation>> = BTreeMap::new();
    let mut schemes = BTreeMap::new();
    let mut skipped = Vec::new();

    for endpoint in collection.all_endpoints() {
        let method = endpoint.method_upper();
        if !is_http_method(&method) {
            debug!("Skipping non-HTTP endpoint {} {}", method, endpoint.path);
            skipped.push(
                endpoint
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("{} {}", method, endpoint.path)),
            );
            continue;
        }

        if let Some(security) = &endpoint.security {
            if let (Some(name), Some(scheme)) = (requirement_name(security), scheme_for(security)) {
                // First definition of a scheme name wins.
                schemes.entry(name).or_insert(scheme);
            }
        }

        paths
            .entry(endpoint.path.clone())
            .or_default()
            .insert(method.to_ascii_lowercase(), build_operation(endpoint, &method));
    }

    let servers = collection
        .base_url
        .as_ref()
        .filter(|url| !url.is_empty())
        .map(|url| vec![Server { url: url.clone() }]);

    let components = if schemes.is_empty() {
        None
    } else {
        Some(Components {
            security_schemes: schemes,
        })
    };

    let document = OpenApiDocument {
        openapi: OPENAPI_VERSION.to_string(),
        info: Info {
            title: non_empty(collection.name.as_deref())
                .unwrap_or(DEFAULT_TITLE)
                .to_string(),
            version: non_empty(collection.version.as_deref())
                .unwrap_or(DEFAULT_VERSION)
                .to_string(),
            description: collection.description.clone(),
        },
        servers,
        paths,
        components,
    };

    ExportReport { document, skipped }
}

fn build_operation(endpoint: &Endpoint, method: &str) -> Operation {
    let operation_id = non_empty(endpoint.id.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| {
            sanitize_operation_id(&format!("{}_{}", method.to_ascii_lowercase(), endpoint.path))
        });

    let mut parameters = Vec::new();
    let groups = [
        ("path", &endpoint.parameters.path, true),
        ("query", &endpoint.parameters.query, false),
        ("header", &endpoint.parameters.header, false),
    ];
    for (location, group, required_by_default) in groups {
        for (name, spec) in group {
            parameters.push(build_parameter(name, location, spec, required_by_default));
        }
    }

    let mut responses = BTreeMap::new();
    responses.insert(
        "200".to_string(),
        ResponseObject {
            description: "Successful response".to_string(),
        },
    );

    let security = endpoint
        .security
        .as_ref()
        .and_then(requirement_name)
        .map(|name| vec![BTreeMap::from([(name, Vec::new())])]);

    Operation {
        summary: non_empty(endpoint.name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", method, endpoint.path)),
        description: endpoint.description.clone(),
        operation_id,
        parameters,
        request_body: endpoint.request_body.as_ref().map(build_request_body),
        responses,
        security,
    }
}

fn build_parameter(
    name: &str,
    location: &str,
    spec: &ParameterSpec,
    required_by_default: bool,
) -> Parameter {
    Parameter {
        name: name.to_string(),
        location: location.to_string(),
        required: spec.required.unwrap_or(required_by_default),
        description: spec.description.clone(),
        schema: ParameterSchema {
            schema_type: spec.type_name().to_string(),
        },
        example: spec.example.clone(),
    }
}

fn build_request_body(spec: &RequestBodySpec) -> RequestBody {
    let content_type = non_empty(spec.content_type.as_deref()).unwrap_or(DEFAULT_CONTENT_TYPE);

    let media = match (&spec.schema, parse_example(spec.example.as_ref())) {
        (Some(schema), _) => MediaType {
            schema: schema.clone(),
            example: None,
        },
        (None, Some(example)) => MediaType {
            schema: infer(&example).to_json(),
            example: Some(example),
        },
        (None, None) => MediaType {
            schema: SchemaNode::of(SchemaType::Object).to_json(),
            example: None,
        },
    };

    RequestBody {
        required: spec.required.unwrap_or(false),
        content: BTreeMap::from([(content_type.to_string(), media)]),
    }
}

/// Example bodies are usually stored as JSON text. Text that does not parse
/// is treated as absent.
fn parse_example(example: Option<&Value>) -> Option<Value> {
    match example? {
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => serde_json::from_str(text).ok(),
        Value::Null => None,
        other => Some(other.clone()),
    }
}

/// Replace every non-alphanumeric character with `_`.
pub fn sanitize_operation_id(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Folder, Parameters, SecuritySpec};
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn endpoint(method: &str, path: &str) -> Endpoint {
        Endpoint {
            method: Some(method.to_string()),
            path: path.to_string(),
            ..Default::default()
        }
    }

    fn collection_of(endpoints: Vec<Endpoint>) -> Collection {
        Collection {
            id: "c1".into(),
            endpoints,
            ..Default::default()
        }
    }

    #[test]
    fn test_info_defaults_and_no_servers() {
        let doc = assemble(&collection_of(vec![]));
        assert_eq!(doc.openapi, "3.0.3");
        assert_eq!(doc.info.title, "API Collection");
        assert_eq!(doc.info.version, "1.0.0");

        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("servers").is_none());
        assert!(value.get("components").is_none());
    }

    #[test]
    fn test_info_and_servers_from_collection() {
        let collection = Collection {
            name: Some("Shop".into()),
            version: Some("2.1.0".into()),
            description: Some("Widgets".into()),
            base_url: Some("https://api.shop.test".into()),
            ..collection_of(vec![])
        };
        let value = serde_json::to_value(assemble(&collection)).unwrap();
        assert_json_eq!(
            value["info"],
            json!({"title": "Shop", "version": "2.1.0", "description": "Widgets"})
        );
        assert_json_eq!(value["servers"], json!([{"url": "https://api.shop.test"}]));
    }

    #[test]
    fn test_operation_defaults() {
        let doc = assemble(&collection_of(vec![Endpoint {
            method: None,
            path: "/users/{id}".into(),
            ..Default::default()
        }]));
        let op = &doc.paths["/users/{id}"]["get"];
        assert_eq!(op.summary, "GET /users/{id}");
        assert_eq!(op.operation_id, "get__users__id_");
        assert_eq!(op.responses.len(), 1);
        assert_eq!(op.responses["200"].description, "Successful response");
        assert!(op.request_body.is_none());
        assert!(op.security.is_none());
    }

    #[test]
    fn test_operation_uses_endpoint_identity() {
        let doc = assemble(&collection_of(vec![Endpoint {
            id: Some("list-users".into()),
            name: Some("List users".into()),
            description: Some("All of them".into()),
            ..endpoint("GET", "/users")
        }]));
        let op = &doc.paths["/users"]["get"];
        assert_eq!(op.operation_id, "list-users");
        assert_eq!(op.summary, "List users");
        assert_eq!(op.description.as_deref(), Some("All of them"));
    }

    #[test]
    fn test_parameter_required_defaults() {
        let mut parameters = Parameters::default();
        parameters.path.insert("id".into(), ParameterSpec::default());
        parameters.query.insert(
            "limit".into(),
            ParameterSpec {
                param_type: Some("integer".into()),
                example: Some(json!(10)),
                ..Default::default()
            },
        );
        parameters.header.insert(
            "X-Trace".into(),
            ParameterSpec {
                required: Some(true),
                description: Some("trace id".into()),
                ..Default::default()
            },
        );

        let doc = assemble(&collection_of(vec![Endpoint {
            parameters,
            ..endpoint("GET", "/users/{id}")
        }]));
        let params = serde_json::to_value(&doc.paths["/users/{id}"]["get"].parameters).unwrap();
        assert_json_eq!(
            params,
            json!([
                {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}},
                {"name": "limit", "in": "query", "required": false, "schema": {"type": "integer"}, "example": 10},
                {"name": "X-Trace", "in": "header", "required": true, "description": "trace id", "schema": {"type": "string"}}
            ])
        );
    }

    #[test]
    fn test_request_body_inferred_from_example() {
        let doc = assemble(&collection_of(vec![Endpoint {
            request_body: Some(RequestBodySpec {
                example: Some(json!(r#"{"name":"a","qty":2}"#)),
                ..Default::default()
            }),
            ..endpoint("POST", "/widgets")
        }]));
        let body = doc.paths["/widgets"]["post"].request_body.as_ref().unwrap();
        assert!(!body.required);
        let media = &body.content["application/json"];
        assert_json_eq!(
            media.schema,
            json!({"type": "object", "properties": {"name": {"type": "string"}, "qty": {"type": "integer"}}})
        );
        assert_eq!(media.example, Some(json!({"name": "a", "qty": 2})));
    }

    #[test]
    fn test_request_body_explicit_schema_and_content_type() {
        let schema = json!({"$ref": "#/components/schemas/Widget"});
        let doc = assemble(&collection_of(vec![Endpoint {
            request_body: Some(RequestBodySpec {
                required: Some(true),
                content_type: Some("application/xml".into()),
                schema: Some(schema.clone()),
                example: Some(json!("<widget/>")),
            }),
            ..endpoint("PUT", "/widgets/1")
        }]));
        let body = doc.paths["/widgets/1"]["put"].request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(body.content["application/xml"].schema, schema);
    }

    #[test]
    fn test_request_body_bad_or_missing_example_falls_back_to_object() {
        for example in [Some(json!("{not json")), None, Some(json!(""))] {
            let doc = assemble(&collection_of(vec![Endpoint {
                request_body: Some(RequestBodySpec {
                    example,
                    ..Default::default()
                }),
                ..endpoint("POST", "/x")
            }]));
            let media = &doc.paths["/x"]["post"].request_body.as_ref().unwrap().content
                ["application/json"];
            assert_eq!(media.schema, json!({"type": "object"}));
            assert!(media.example.is_none());
        }
    }

    #[test]
    fn test_security_first_scheme_name_wins() {
        let bearer = SecuritySpec {
            auth_type: "bearer".into(),
            scheme_name: Some("auth".into()),
            config: None,
        };
        let basic_same_name = SecuritySpec {
            auth_type: "basic".into(),
            scheme_name: Some("auth".into()),
            config: None,
        };
        let doc = assemble(&collection_of(vec![
            Endpoint {
                security: Some(bearer),
                ..endpoint("GET", "/a")
            },
            Endpoint {
                security: Some(basic_same_name),
                ..endpoint("GET", "/b")
            },
        ]));

        let value = serde_json::to_value(&doc).unwrap();
        assert_json_eq!(
            value["components"]["securitySchemes"],
            json!({"auth": {"type": "http", "scheme": "bearer", "bearerFormat": "JWT"}})
        );
        assert_json_eq!(value["paths"]["/b"]["get"]["security"], json!([{"auth": []}]));
    }

    #[test]
    fn test_security_none_and_unknown() {
        let doc = assemble(&collection_of(vec![
            Endpoint {
                security: Some(SecuritySpec {
                    auth_type: "none".into(),
                    ..Default::default()
                }),
                ..endpoint("GET", "/open")
            },
            Endpoint {
                security: Some(SecuritySpec {
                    auth_type: "digest".into(),
                    ..Default::default()
                }),
                ..endpoint("GET", "/digest")
            },
        ]));
        assert!(doc.paths["/open"]["get"].security.is_none());
        assert!(doc.components.is_none());
        assert_eq!(
            doc.paths["/digest"]["get"].security,
            Some(vec![BTreeMap::from([("digestAuth".to_string(), Vec::new())])])
        );
    }

    #[test]
    fn test_non_http_endpoints_are_skipped_and_reported() {
        let collection = Collection {
            folders: vec![Folder {
                endpoints: vec![Endpoint {
                    name: Some("Stream prices".into()),
                    ..endpoint("GRPC", "/prices.Stream")
                }],
                ..Default::default()
            }],
            ..collection_of(vec![endpoint("DELETE", "/items/{id}")])
        };

        let report = assemble_with_report(&collection);
        assert_eq!(report.skipped, vec!["Stream prices".to_string()]);
        assert!(report.document.paths.contains_key("/items/{id}"));
        assert!(!report.document.paths.contains_key("/prices.Stream"));
    }

    #[test]
    fn test_same_path_collects_methods() {
        let doc = assemble(&collection_of(vec![
            endpoint("GET", "/items"),
            endpoint("post", "/items"),
        ]));
        let methods: Vec<&String> = doc.paths["/items"].keys().collect();
        assert_eq!(methods, vec!["get", "post"]);
    }

    #[test]
    fn test_sanitize_operation_id() {
        assert_eq!(sanitize_operation_id("post_/a-b/{c}"), "post__a_b__c_");
    }
}
