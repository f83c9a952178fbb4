//! Server lifecycle, status and settings handlers.

use crate::admin_api::types::*;
use crate::mock::{port_message, start_message, stop_message, MockServerEngine, RELOAD_MESSAGE};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;

/// GET / - Resource links
pub fn handle_root(base_url: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "_links": {
            "status": {"href": format!("{}/status", base_url)},
            "settings": {"href": format!("{}/settings", base_url)},
            "collections": {"href": format!("{}/collections", base_url)},
            "logs": {"href": format!("{}/logs", base_url)}
        }
    });
    json_response(StatusCode::OK, &body)
}

/// GET /health - Health check
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// GET /status - Listener state
pub fn handle_status(engine: &MockServerEngine) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &engine.get_status())
}

/// GET /settings - Persisted mock settings
pub fn handle_settings(engine: &MockServerEngine) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &engine.get_settings())
}

/// POST /server/start
pub async fn handle_start(engine: Arc<MockServerEngine>) -> Response<Full<Bytes>> {
    admin_response(engine.start().await, |outcome| Some(start_message(outcome)))
}

/// POST /server/stop
pub async fn handle_stop(engine: Arc<MockServerEngine>) -> Response<Full<Bytes>> {
    admin_response(engine.stop().await, |outcome| Some(stop_message(outcome)))
}

/// PUT /server/port - `{"port": 4010}`
pub async fn handle_update_port(
    req: Request<Incoming>,
    engine: Arc<MockServerEngine>,
) -> Response<Full<Bytes>> {
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };
    let request: PortRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid port JSON: {e}"))
        }
    };
    admin_response(engine.update_port(request.port), |port| Some(port_message(port)))
}

/// POST /settings/reload - Re-read settings from the store
pub fn handle_reload(engine: &MockServerEngine) -> Response<Full<Bytes>> {
    admin_response(engine.reload_settings(), |_| Some(RELOAD_MESSAGE.to_string()))
}
