//! Route dispatch logic for the Admin API.

use crate::admin_api::handlers::overrides::{self, OverrideKind};
use crate::admin_api::handlers::{collections, logs, server};
use crate::admin_api::types::{get_base_url, not_found};
use crate::mock::MockServerEngine;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// Parsed route for collection-specific endpoints
#[derive(Debug, PartialEq, Eq)]
enum CollectionRoute<'a> {
    /// POST /collections/:id/toggle
    Toggle,
    /// GET /collections/:id/openapi
    OpenApi,
    /// GET/PUT/DELETE /collections/:id/endpoints/:eid/{delay,status,response}
    Override(&'a str, OverrideKind),
}

impl<'a> CollectionRoute<'a> {
    /// Parse route from path segments after `/collections/:id`
    fn parse(segments: &[&'a str]) -> Option<Self> {
        match segments {
            ["toggle"] => Some(CollectionRoute::Toggle),
            ["openapi"] => Some(CollectionRoute::OpenApi),
            ["endpoints", endpoint_id, kind] if !endpoint_id.is_empty() => {
                OverrideKind::parse(kind).map(|k| CollectionRoute::Override(*endpoint_id, k))
            }
            _ => None,
        }
    }
}

/// Main request router
pub async fn route_request(
    req: Request<Incoming>,
    engine: Arc<MockServerEngine>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());
    let base_url = get_base_url(&req);

    debug!("Admin API: {} {}", method, path);

    let response = route_by_path(&method, &path, query.as_deref(), req, &base_url, engine).await;
    Ok(response)
}

/// Route based on path
async fn route_by_path(
    method: &Method,
    path: &str,
    query: Option<&str>,
    req: Request<Incoming>,
    base_url: &str,
    engine: Arc<MockServerEngine>,
) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::GET, "/") => return server::handle_root(base_url),
        (&Method::GET, "/health") => return server::handle_health(),
        (&Method::GET, "/status") => return server::handle_status(&engine),
        (&Method::GET, "/settings") => return server::handle_settings(&engine),
        (&Method::POST, "/settings/reload") => return server::handle_reload(&engine),
        (&Method::POST, "/server/start") => return server::handle_start(engine).await,
        (&Method::POST, "/server/stop") => return server::handle_stop(engine).await,
        (&Method::PUT, "/server/port") => return server::handle_update_port(req, engine).await,
        (&Method::GET, "/collections") => return collections::handle_list(&engine),
        (&Method::GET, "/logs") => return logs::handle_list(&engine, query),
        (&Method::DELETE, "/logs") => return logs::handle_clear(&engine),
        _ => {}
    }

    if let Some(rest) = path.strip_prefix("/collections/") {
        return route_collection(method, rest, query, req, &engine).await;
    }

    not_found()
}

/// Route collection-specific requests
async fn route_collection(
    method: &Method,
    path: &str,
    query: Option<&str>,
    req: Request<Incoming>,
    engine: &MockServerEngine,
) -> Response<Full<Bytes>> {
    let segments: Vec<&str> = path.split('/').collect();
    let Some((raw_id, rest)) = segments.split_first() else {
        return not_found();
    };
    if raw_id.is_empty() {
        return not_found();
    }
    let collection_id = decode(raw_id);

    let route = match CollectionRoute::parse(rest) {
        Some(r) => r,
        None => return not_found(),
    };

    match (method, route) {
        (&Method::POST, CollectionRoute::Toggle) => {
            collections::handle_toggle(engine, &collection_id)
        }
        (&Method::GET, CollectionRoute::OpenApi) => {
            collections::handle_export(engine, &collection_id, query)
        }
        (&Method::GET, CollectionRoute::Override(endpoint_id, kind)) => {
            overrides::handle_get(engine, &collection_id, &decode(endpoint_id), kind)
        }
        (&Method::PUT, CollectionRoute::Override(endpoint_id, kind)) => {
            overrides::handle_set(req, engine, &collection_id, &decode(endpoint_id), kind).await
        }
        (&Method::DELETE, CollectionRoute::Override(endpoint_id, kind)) => {
            overrides::handle_clear(engine, &collection_id, &decode(endpoint_id), kind)
        }
        _ => not_found(),
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_route_parse() {
        assert_eq!(
            CollectionRoute::parse(&["toggle"]),
            Some(CollectionRoute::Toggle)
        );
        assert_eq!(
            CollectionRoute::parse(&["openapi"]),
            Some(CollectionRoute::OpenApi)
        );
        assert_eq!(
            CollectionRoute::parse(&["endpoints", "e1", "delay"]),
            Some(CollectionRoute::Override("e1", OverrideKind::Delay))
        );
        assert_eq!(
            CollectionRoute::parse(&["endpoints", "e1", "response"]),
            Some(CollectionRoute::Override("e1", OverrideKind::Response))
        );

        // Invalid routes
        assert_eq!(CollectionRoute::parse(&[]), None);
        assert_eq!(CollectionRoute::parse(&["unknown"]), None);
        assert_eq!(CollectionRoute::parse(&["endpoints", "e1"]), None);
        assert_eq!(CollectionRoute::parse(&["endpoints", "", "delay"]), None);
        assert_eq!(CollectionRoute::parse(&["endpoints", "e1", "headers"]), None);
    }
}
