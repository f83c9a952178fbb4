//! Collection listing, enablement and OpenAPI export handlers.

use crate::admin_api::types::*;
use crate::mock::{toggle_message, MockServerEngine};
use crate::openapi::{export_to_openapi, ExportFormat};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::{error, info};

/// GET /collections
pub fn handle_list(engine: &MockServerEngine) -> Response<Full<Bytes>> {
    let settings = engine.get_settings();
    let summaries: Vec<CollectionSummary> = engine
        .get_collections()
        .iter()
        .map(|c| CollectionSummary {
            id: c.id.clone(),
            name: c.display_name().to_string(),
            enabled: settings.is_enabled(&c.id),
            endpoint_count: c.all_endpoints().count(),
        })
        .collect();
    json_response(StatusCode::OK, &serde_json::json!({ "collections": summaries }))
}

/// POST /collections/:id/toggle
pub fn handle_toggle(engine: &MockServerEngine, collection_id: &str) -> Response<Full<Bytes>> {
    admin_response(engine.toggle_collection(collection_id), |enabled| {
        Some(toggle_message(collection_id, enabled))
    })
}

/// GET /collections/:id/openapi?format=json|yaml
pub fn handle_export(
    engine: &MockServerEngine,
    collection_id: &str,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let format = match query_param(query, "format")
        .map(str::parse::<ExportFormat>)
        .transpose()
    {
        Ok(format) => format.unwrap_or_default(),
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let collections = engine.get_collections();
    let Some(collection) = collections.iter().find(|c| c.id == collection_id) else {
        return error_response(
            StatusCode::NOT_FOUND,
            &format!("Collection {collection_id} not found"),
        );
    };

    match export_to_openapi(collection, format) {
        Ok(document) => {
            info!("Exported collection {} as {}", collection_id, format);
            let content_type = match format {
                ExportFormat::Json => "application/json",
                ExportFormat::Yaml => "application/yaml",
            };
            build_response_with_headers(StatusCode::OK, [("Content-Type", content_type)], document)
        }
        Err(e) => {
            error!("Failed to export collection {}: {}", collection_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
