//! HTTP plumbing for the mock listener.

use super::engine::{EngineState, MockRequest};
use super::response::{is_bodyless, MockResponse};
use crate::admin_api::types::{build_response, build_response_with_headers};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::debug;

const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS";

/// Serve one connection until it closes or shutdown is signalled. On
/// shutdown the in-flight request is completed before the connection closes.
pub(crate) async fn serve_connection(
    stream: TcpStream,
    state: Arc<EngineState>,
    mut shutdown_rx: broadcast::Receiver<()>,
    port: u16,
) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req| {
        let state = Arc::clone(&state);
        async move { handle_mock_request(req, state).await }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!("Connection error on port {}: {}", port, e);
            }
        }
        _ = shutdown_rx.recv() => {
            conn.as_mut().graceful_shutdown();
            if let Err(e) = conn.as_mut().await {
                debug!("Connection error during shutdown on port {}: {}", port, e);
            }
        }
    }
}

async fn handle_mock_request(
    req: Request<Incoming>,
    state: Arc<EngineState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let request = MockRequest {
        method: req.method().as_str().to_string(),
        path: req.uri().path().to_string(),
        query: parse_query(req.uri().query()),
        preflight: req.method() == Method::OPTIONS
            && req.headers().contains_key("access-control-request-method"),
    };
    let requested_headers = req
        .headers()
        .get("access-control-request-headers")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = state.dispatch(request).await;
    Ok(to_http_response(&response, requested_headers.as_deref()))
}

/// Decode a query string into a map; later duplicates win.
pub fn parse_query(query: Option<&str>) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    for pair in query.unwrap_or("").split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(decode_component(key), decode_component(value));
    }
    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// Render a mock response with permissive CORS headers.
pub(crate) fn to_http_response(
    response: &MockResponse,
    requested_headers: Option<&str>,
) -> Response<Full<Bytes>> {
    let status = match StatusCode::from_u16(response.status) {
        Ok(status) => status,
        Err(_) => return build_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid status code"),
    };

    let mut headers = vec![
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", CORS_ALLOW_METHODS),
        ("Access-Control-Allow-Headers", requested_headers.unwrap_or("*")),
    ];

    if is_bodyless(response.status) {
        return build_response_with_headers(status, headers, Bytes::new());
    }

    headers.push(("Content-Type", "application/json"));
    let body = serde_json::to_vec(&response.body).unwrap_or_else(|_| b"null".to_vec());
    build_response_with_headers(status, headers, body)
}
