//! Request log handlers.

use crate::admin_api::types::*;
use crate::mock::MockServerEngine;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET /logs?limit=N - Most recent entries, newest first
pub fn handle_list(engine: &MockServerEngine, query: Option<&str>) -> Response<Full<Bytes>> {
    let logs = engine.get_request_logs(parse_limit(query));
    json_response(StatusCode::OK, &serde_json::json!({ "logs": logs }))
}

/// DELETE /logs
pub fn handle_clear(engine: &MockServerEngine) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &engine.clear_request_logs())
}
