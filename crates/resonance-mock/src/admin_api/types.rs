//! Request/response types and response helpers for the Admin API.

use crate::mock::{AdminResult, MockServerError};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of log entries returned by `GET /logs`.
pub const DEFAULT_LOG_LIMIT: usize = 20;

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
}

/// Individual error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Body of `PUT /server/port`.
#[derive(Debug, Deserialize)]
pub struct PortRequest {
    pub port: i64,
}

/// Body of the override endpoints: `{"value": ...}`; `null` clears.
#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    #[serde(default)]
    pub value: Option<Value>,
}

/// Summary row for `GET /collections`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub endpoint_count: usize,
}

/// Parse `limit` from a query string, defaulting to [`DEFAULT_LOG_LIMIT`].
pub fn parse_limit(query: Option<&str>) -> usize {
    query_param(query, "limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_LOG_LIMIT)
}

/// First value of a query parameter.
pub fn query_param<'a>(query: Option<&'a str>, name: &str) -> Option<&'a str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Extract base URL from request headers for links
pub fn get_base_url(req: &Request<Incoming>) -> String {
    if let Some(host) = req.headers().get("host") {
        if let Ok(host_str) = host.to_str() {
            return format!("http://{}", host_str);
        }
    }
    "http://localhost:2525".to_string()
}

/// HTTP status for a failed control operation.
pub fn error_status(error: &MockServerError) -> StatusCode {
    match error {
        MockServerError::PortInUse(_) | MockServerError::PortChangeWhileRunning => {
            StatusCode::CONFLICT
        }
        MockServerError::InvalidPort(_)
        | MockServerError::InvalidDelay(_)
        | MockServerError::InvalidStatusCode(_)
        | MockServerError::InvalidJson(_) => StatusCode::BAD_REQUEST,
        MockServerError::BindError(..) | MockServerError::Persistence(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Render a control operation as an `AdminResult` body with a matching status.
pub fn admin_response<T>(
    result: Result<T, MockServerError>,
    on_success: impl FnOnce(T) -> Option<String>,
) -> Response<Full<Bytes>> {
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => error_status(e),
    };
    json_response(status, &AdminResult::from_result(result, on_success))
}

// =============================================================================
// Response helper functions
// =============================================================================

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

/// Build an HTTP response with the given status and body.
///
/// Falls back to a bare 500 if the builder rejects its input.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Build an HTTP response with headers.
///
/// Falls back to a bare 500 if a header is not representable.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Create an error response
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let error = ErrorResponse {
        errors: vec![ErrorDetail {
            code: status.as_str().to_string(),
            message: message.to_string(),
        }],
    };
    json_response(status, &error)
}

/// Create a not found response
pub fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

/// Collect request body into bytes
pub async fn collect_body(req: Request<Incoming>) -> Result<Bytes, String> {
    use http_body_util::BodyExt;
    req.collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None), DEFAULT_LOG_LIMIT);
        assert_eq!(parse_limit(Some("limit=5")), 5);
        assert_eq!(parse_limit(Some("other=1&limit=50")), 50);
        assert_eq!(parse_limit(Some("limit=abc")), DEFAULT_LOG_LIMIT);
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param(Some("format=yaml"), "format"), Some("yaml"));
        assert_eq!(query_param(Some("format"), "format"), None);
        assert_eq!(query_param(None, "format"), None);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&MockServerError::InvalidDelay(-1)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&MockServerError::PortInUse(3001)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_status(&MockServerError::BindError(3001, "denied".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_admin_response_failure() {
        let resp = admin_response::<()>(Err(MockServerError::InvalidPort(80)), |_| None);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_error_response_format() {
        let resp = error_response(StatusCode::BAD_REQUEST, "Test error");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_response() {
        let resp = not_found();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
