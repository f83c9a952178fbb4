//! UI-facing control surface: every operation answers `{success, message?}`
//! instead of an error.

use super::engine::MockServerEngine;
use super::request_log::RequestLogEntry;
use super::settings::MockServerSettings;
use super::types::{AdminResult, ServerStatus, StartOutcome, StopOutcome};
use crate::collection::Collection;
use serde_json::Value;
use std::sync::Arc;

// Messages shared with the admin HTTP API.

pub(crate) fn start_message(outcome: StartOutcome) -> String {
    match outcome {
        StartOutcome::Started(port) => format!("Server started on port {port}"),
        StartOutcome::AlreadyRunning(port) => format!("Server is already running on port {port}"),
    }
}

pub(crate) fn stop_message(outcome: StopOutcome) -> String {
    match outcome {
        StopOutcome::Stopped(_) => "Server stopped successfully".to_string(),
        StopOutcome::NotRunning => "Server is not running".to_string(),
    }
}

pub(crate) fn port_message(port: u16) -> String {
    format!("Port updated to {port}")
}

pub(crate) fn toggle_message(collection_id: &str, enabled: bool) -> String {
    let state = if enabled { "enabled" } else { "disabled" };
    format!("Collection {collection_id} {state}")
}

pub(crate) const RELOAD_MESSAGE: &str = "Settings reloaded";

impl MockServerEngine {
    pub fn get_settings(&self) -> MockServerSettings {
        self.settings()
    }

    pub fn get_collections(&self) -> Arc<Vec<Collection>> {
        self.collections()
    }

    pub fn get_status(&self) -> ServerStatus {
        self.status()
    }

    pub async fn handle_start(&self) -> AdminResult {
        AdminResult::from_result(self.start().await, |outcome| Some(start_message(outcome)))
    }

    pub async fn handle_stop(&self) -> AdminResult {
        AdminResult::from_result(self.stop().await, |outcome| Some(stop_message(outcome)))
    }

    pub fn handle_update_port(&self, port: i64) -> AdminResult {
        AdminResult::from_result(self.update_port(port), |port| Some(port_message(port)))
    }

    pub fn handle_toggle_collection(&self, collection_id: &str) -> AdminResult {
        AdminResult::from_result(self.toggle_collection(collection_id), |enabled| {
            Some(toggle_message(collection_id, enabled))
        })
    }

    pub fn handle_set_delay(
        &self,
        collection_id: &str,
        endpoint_id: &str,
        delay_ms: Option<i64>,
    ) -> AdminResult {
        AdminResult::from_result(self.set_delay(collection_id, endpoint_id, delay_ms), |_| None)
    }

    pub fn handle_set_custom_status_code(
        &self,
        collection_id: &str,
        endpoint_id: &str,
        code: Option<i64>,
    ) -> AdminResult {
        AdminResult::from_result(
            self.set_custom_status_code(collection_id, endpoint_id, code),
            |_| None,
        )
    }

    pub fn handle_set_custom_response(
        &self,
        collection_id: &str,
        endpoint_id: &str,
        body: Option<Value>,
    ) -> AdminResult {
        AdminResult::from_result(
            self.set_custom_response(collection_id, endpoint_id, body),
            |_| None,
        )
    }

    pub fn get_request_logs(&self, limit: usize) -> Vec<RequestLogEntry> {
        self.recent_logs(limit)
    }

    pub fn clear_request_logs(&self) -> AdminResult {
        self.clear_logs();
        AdminResult::ok()
    }

    pub fn handle_reload_settings(&self) -> AdminResult {
        AdminResult::from_result(self.reload_settings(), |_| Some(RELOAD_MESSAGE.to_string()))
    }
}
