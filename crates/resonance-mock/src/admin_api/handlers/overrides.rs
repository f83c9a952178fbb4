//! Per-endpoint override handlers: delay, status code and response body.
//!
//! All three share one shape: `GET` returns `{"value": ...}`, `PUT` takes
//! `{"value": ...}` (`null` clears) and `DELETE` clears.

use crate::admin_api::types::*;
use crate::mock::{MockServerEngine, MockServerError};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::{json, Value};

/// Which override an endpoint route addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    Delay,
    Status,
    Response,
}

impl OverrideKind {
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "delay" => Some(OverrideKind::Delay),
            "status" => Some(OverrideKind::Status),
            "response" => Some(OverrideKind::Response),
            _ => None,
        }
    }
}

/// GET /collections/:cid/endpoints/:eid/{delay,status,response}
pub fn handle_get(
    engine: &MockServerEngine,
    collection_id: &str,
    endpoint_id: &str,
    kind: OverrideKind,
) -> Response<Full<Bytes>> {
    let value = match kind {
        OverrideKind::Delay => json!(engine.get_delay(collection_id, endpoint_id)),
        OverrideKind::Status => json!(engine.get_custom_status_code(collection_id, endpoint_id)),
        OverrideKind::Response => engine
            .get_custom_response(collection_id, endpoint_id)
            .unwrap_or(Value::Null),
    };
    json_response(StatusCode::OK, &json!({ "value": value }))
}

/// PUT /collections/:cid/endpoints/:eid/{delay,status,response}
pub async fn handle_set(
    req: Request<Incoming>,
    engine: &MockServerEngine,
    collection_id: &str,
    endpoint_id: &str,
    kind: OverrideKind,
) -> Response<Full<Bytes>> {
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };
    let request: OverrideRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return admin_response::<()>(Err(MockServerError::InvalidJson(e.to_string())), |_| None)
        }
    };
    apply(engine, collection_id, endpoint_id, kind, request.value)
}

/// DELETE /collections/:cid/endpoints/:eid/{delay,status,response}
pub fn handle_clear(
    engine: &MockServerEngine,
    collection_id: &str,
    endpoint_id: &str,
    kind: OverrideKind,
) -> Response<Full<Bytes>> {
    apply(engine, collection_id, endpoint_id, kind, None)
}

fn apply(
    engine: &MockServerEngine,
    collection_id: &str,
    endpoint_id: &str,
    kind: OverrideKind,
    value: Option<Value>,
) -> Response<Full<Bytes>> {
    let value = value.filter(|v| !v.is_null());
    let result = match kind {
        OverrideKind::Delay => integer_value(value, "delay")
            .and_then(|ms| engine.set_delay(collection_id, endpoint_id, ms)),
        OverrideKind::Status => integer_value(value, "status code")
            .and_then(|code| engine.set_custom_status_code(collection_id, endpoint_id, code)),
        OverrideKind::Response => engine.set_custom_response(collection_id, endpoint_id, value),
    };
    admin_response(result, |_| None)
}

fn integer_value(value: Option<Value>, what: &str) -> Result<Option<i64>, MockServerError> {
    match value {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| MockServerError::InvalidJson(format!("{what} must be an integer"))),
    }
}
