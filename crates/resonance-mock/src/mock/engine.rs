//! Mock server engine: lifecycle, routing state and request dispatch.
//!
//! Settings, collections and the compiled route table live behind a single
//! lock so a reader never observes settings that disagree with the routes.
//! Mutations persist first and only then swap in the new state; a failed
//! write leaves the running configuration untouched.

use super::handler::serve_connection;
use super::request_log::{MatchedEndpoint, RequestLog, RequestLogEntry, DEFAULT_LOG_CAPACITY};
use super::response::{default_status_for, wire_status, MockResponse, ResponseDecision};
use super::route_table::{RouteMatch, RouteTable};
use super::settings::{
    endpoint_key, validate_delay, validate_port, validate_status_code, MockServerSettings,
};
use super::store::{load_settings, save_settings, KeyValueStore};
use super::types::{
    MockServerError, ServerPhase, ServerStatus, StartOutcome, StopOutcome,
};
use crate::collection::Collection;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Host and log sizing for an engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub host: String,
    pub log_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

/// An incoming request as seen by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    /// `OPTIONS` carrying `Access-Control-Request-Method`.
    pub preflight: bool,
}

impl MockRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: BTreeMap::new(),
            preflight: false,
        }
    }
}

struct RoutingState {
    settings: MockServerSettings,
    collections: Arc<Vec<Collection>>,
    routes: Arc<RouteTable>,
}

impl RoutingState {
    fn rebuild(&mut self) {
        let table = RouteTable::rebuild(&self.collections, &self.settings.enabled_collections);
        self.routes = Arc::new(table);
    }
}

/// Everything a connection task needs; shared between the engine and its
/// accept loop.
pub(crate) struct EngineState {
    routing: RwLock<RoutingState>,
    store: Arc<dyn KeyValueStore>,
    log: RequestLog,
    request_count: AtomicU64,
}

enum Resolution {
    Matched {
        delay_ms: u64,
        status: u16,
        decision: ResponseDecision,
        matched: MatchedEndpoint,
    },
    Preflight,
    NotFound,
}

impl EngineState {
    /// Route, delay and answer one request, then record it.
    pub(crate) async fn dispatch(&self, request: MockRequest) -> MockResponse {
        let started = Instant::now();
        self.request_count.fetch_add(1, Ordering::Relaxed);

        let response = match self.resolve(&request) {
            Resolution::Matched {
                delay_ms,
                status,
                decision,
                matched,
            } => {
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                let sent = wire_status(status);
                if sent != status {
                    warn!(
                        "Status {} for {} {} is not a final response; sending {}",
                        status, request.method, request.path, sent
                    );
                }
                MockResponse {
                    status: sent,
                    source: decision.source(),
                    body: decision.into_body(),
                    matched: Some(matched),
                }
            }
            Resolution::Preflight => MockResponse::preflight(),
            Resolution::NotFound => {
                debug!("No route for {} {}", request.method, request.path);
                MockResponse::not_found(&request.method, &request.path)
            }
        };

        let elapsed = started.elapsed();
        debug!(
            "{} {} -> {} ({:?}, {}ms)",
            request.method,
            request.path,
            response.status,
            response.source,
            elapsed.as_millis()
        );
        self.log.push(log_entry(request, &response, elapsed));
        response
    }

    /// Snapshot everything the response needs under one read lock; the
    /// delay is served after the lock is released.
    fn resolve(&self, request: &MockRequest) -> Resolution {
        let routing = self.routing.read();
        let Some(RouteMatch { route, path_params }) =
            routing.routes.match_route(&request.method, &request.path)
        else {
            return if request.preflight {
                Resolution::Preflight
            } else {
                Resolution::NotFound
            };
        };

        let key = route.key();
        let settings = &routing.settings;
        Resolution::Matched {
            delay_ms: settings.delay_for(&key),
            status: settings
                .status_for(&key)
                .unwrap_or_else(|| default_status_for(&route.method)),
            decision: ResponseDecision::resolve(settings.response_for(&key), &route.endpoint),
            matched: MatchedEndpoint {
                collection_id: route.collection_id.clone(),
                collection_name: route.collection_name.clone(),
                endpoint_id: route.endpoint.id_or_empty().to_string(),
                endpoint_name: route
                    .endpoint
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("{} {}", route.method, route.template.as_str())),
                path_params,
            },
        }
    }

    fn rebuild_routes(&self) -> usize {
        let mut routing = self.routing.write();
        routing.rebuild();
        routing.routes.len()
    }

    /// Apply a settings mutation: persist the candidate, then swap it in
    /// (rebuilding routes when asked) while holding the write lock.
    fn update_settings<F>(&self, rebuild: bool, mutate: F) -> Result<(), MockServerError>
    where
        F: FnOnce(&mut MockServerSettings) -> Result<(), MockServerError>,
    {
        let mut routing = self.routing.write();
        let mut next = routing.settings.clone();
        mutate(&mut next)?;
        save_settings(self.store.as_ref(), &next)?;
        routing.settings = next;
        if rebuild {
            routing.rebuild();
        }
        Ok(())
    }
}

fn log_entry(request: MockRequest, response: &MockResponse, elapsed: Duration) -> RequestLogEntry {
    RequestLogEntry {
        id: uuid::Uuid::new_v4().to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
        method: request.method,
        path: request.path,
        query: request.query,
        response_status: response.status,
        response_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        matched_endpoint: response.matched.clone(),
    }
}

struct RunningServer {
    port: u16,
    shutdown_tx: broadcast::Sender<()>,
    accept_task: JoinHandle<()>,
}

/// The mock HTTP server and its control operations.
pub struct MockServerEngine {
    state: Arc<EngineState>,
    host: String,
    lifecycle: Mutex<Option<RunningServer>>,
    phase: RwLock<(ServerPhase, Option<u16>)>,
}

impl MockServerEngine {
    /// Create a stopped engine, loading settings from the store. Unreadable
    /// settings fall back to defaults.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        collections: Vec<Collection>,
        options: EngineOptions,
    ) -> Self {
        let settings = load_settings(store.as_ref()).unwrap_or_else(|e| {
            warn!("Using default mock server settings: {}", e);
            MockServerSettings::default()
        });
        let mut routing = RoutingState {
            settings,
            collections: Arc::new(collections),
            routes: Arc::new(RouteTable::empty()),
        };
        routing.rebuild();

        Self {
            state: Arc::new(EngineState {
                routing: RwLock::new(routing),
                store,
                log: RequestLog::new(options.log_capacity),
                request_count: AtomicU64::new(0),
            }),
            host: options.host,
            lifecycle: Mutex::new(None),
            phase: RwLock::new((ServerPhase::Stopped, None)),
        }
    }

    pub fn settings(&self) -> MockServerSettings {
        self.state.routing.read().settings.clone()
    }

    pub fn collections(&self) -> Arc<Vec<Collection>> {
        Arc::clone(&self.state.routing.read().collections)
    }

    pub fn route_table(&self) -> Arc<RouteTable> {
        Arc::clone(&self.state.routing.read().routes)
    }

    pub fn status(&self) -> ServerStatus {
        let (phase, bound) = *self.phase.read();
        ServerStatus {
            running: phase == ServerPhase::Running,
            port: bound.unwrap_or_else(|| self.state.routing.read().settings.port),
            phase,
            request_count: self.state.request_count.load(Ordering::Relaxed),
        }
    }

    fn set_phase(&self, phase: ServerPhase, port: Option<u16>) {
        *self.phase.write() = (phase, port);
    }

    /// Bind the configured port and start serving. Starting a running
    /// server is a no-op.
    pub async fn start(&self) -> Result<StartOutcome, MockServerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Some(running) = lifecycle.as_ref() {
            return Ok(StartOutcome::AlreadyRunning(running.port));
        }

        let port = self.state.routing.read().settings.port;
        self.set_phase(ServerPhase::Starting, None);

        let listener = match TcpListener::bind((self.host.as_str(), port)).await {
            Ok(listener) => listener,
            Err(e) => {
                self.set_phase(ServerPhase::Stopped, None);
                error!("Failed to bind mock server to {}:{}: {}", self.host, port, e);
                return Err(if e.kind() == io::ErrorKind::AddrInUse {
                    MockServerError::PortInUse(port)
                } else {
                    MockServerError::BindError(port, e.to_string())
                });
            }
        };

        let route_count = self.state.rebuild_routes();
        if route_count == 0 {
            warn!("Mock server starting with no enabled endpoints; every request will 404");
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&self.state),
            shutdown_rx,
            port,
        ));

        *lifecycle = Some(RunningServer {
            port,
            shutdown_tx,
            accept_task,
        });
        self.set_phase(ServerPhase::Running, Some(port));
        info!(
            "Mock server listening on {}:{} with {} routes",
            self.host, port, route_count
        );
        Ok(StartOutcome::Started(port))
    }

    /// Stop accepting connections. In-flight requests, including delayed
    /// ones, are allowed to finish. Stopping a stopped server is a no-op.
    pub async fn stop(&self) -> Result<StopOutcome, MockServerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(running) = lifecycle.take() else {
            return Ok(StopOutcome::NotRunning);
        };

        self.set_phase(ServerPhase::Stopping, Some(running.port));
        // No receivers only means the accept loop already exited.
        let _ = running.shutdown_tx.send(());
        if let Err(e) = running.accept_task.await {
            error!("Mock server accept loop ended abnormally: {}", e);
        }
        drop(running.shutdown_tx);

        self.set_phase(ServerPhase::Stopped, None);
        info!("Mock server on port {} stopped", running.port);
        Ok(StopOutcome::Stopped(running.port))
    }

    /// Answer a request without going through a socket.
    pub async fn handle_request(&self, request: MockRequest) -> MockResponse {
        self.state.dispatch(request).await
    }

    /// Flip a collection's enabled flag; returns the new state.
    pub fn toggle_collection(&self, collection_id: &str) -> Result<bool, MockServerError> {
        let mut enabled = false;
        self.state.update_settings(true, |settings| {
            enabled = if settings.enabled_collections.remove(collection_id) {
                false
            } else {
                settings.enabled_collections.insert(collection_id.to_string());
                true
            };
            Ok(())
        })?;
        info!(
            "Collection {} {}",
            collection_id,
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(enabled)
    }

    /// Set or clear (`None`) an endpoint's response delay in milliseconds.
    pub fn set_delay(
        &self,
        collection_id: &str,
        endpoint_id: &str,
        delay_ms: Option<i64>,
    ) -> Result<(), MockServerError> {
        let key = endpoint_key(collection_id, endpoint_id);
        self.state.update_settings(false, |settings| {
            match delay_ms {
                Some(ms) => {
                    settings.endpoint_delays.insert(key, validate_delay(ms)?);
                }
                None => {
                    settings.endpoint_delays.remove(&key);
                }
            }
            Ok(())
        })
    }

    /// Set or clear an endpoint's status code override.
    pub fn set_custom_status_code(
        &self,
        collection_id: &str,
        endpoint_id: &str,
        code: Option<i64>,
    ) -> Result<(), MockServerError> {
        let key = endpoint_key(collection_id, endpoint_id);
        self.state.update_settings(false, |settings| {
            match code {
                Some(code) => {
                    settings
                        .custom_status_codes
                        .insert(key, validate_status_code(code)?);
                }
                None => {
                    settings.custom_status_codes.remove(&key);
                }
            }
            Ok(())
        })
    }

    /// Set or clear an endpoint's response body override. JSON `null`
    /// clears, like `None`.
    pub fn set_custom_response(
        &self,
        collection_id: &str,
        endpoint_id: &str,
        body: Option<Value>,
    ) -> Result<(), MockServerError> {
        let key = endpoint_key(collection_id, endpoint_id);
        self.state.update_settings(false, |settings| {
            match body.filter(|b| !b.is_null()) {
                Some(body) => {
                    settings.custom_responses.insert(key, body);
                }
                None => {
                    settings.custom_responses.remove(&key);
                }
            }
            Ok(())
        })
    }

    /// Parse `text` as JSON and store it as the endpoint's response override.
    pub fn set_custom_response_text(
        &self,
        collection_id: &str,
        endpoint_id: &str,
        text: &str,
    ) -> Result<(), MockServerError> {
        let body = if text.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(text)
                    .map_err(|e| MockServerError::InvalidJson(e.to_string()))?,
            )
        };
        self.set_custom_response(collection_id, endpoint_id, body)
    }

    /// Change the listening port; only allowed while stopped. Holds the
    /// lifecycle lock so a concurrent start or stop cannot interleave.
    pub fn update_port(&self, port: i64) -> Result<u16, MockServerError> {
        let lifecycle = self
            .lifecycle
            .try_lock()
            .map_err(|_| MockServerError::PortChangeWhileRunning)?;
        if lifecycle.is_some() {
            return Err(MockServerError::PortChangeWhileRunning);
        }
        let port = validate_port(port)?;
        self.state.update_settings(false, |settings| {
            settings.port = port;
            Ok(())
        })?;
        drop(lifecycle);
        info!("Mock server port set to {}", port);
        Ok(port)
    }

    /// Re-read settings from the store and rebuild routes.
    pub fn reload_settings(&self) -> Result<(), MockServerError> {
        let settings = load_settings(self.state.store.as_ref())?;
        let mut routing = self.state.routing.write();
        routing.settings = settings;
        routing.rebuild();
        info!("Reloaded mock server settings ({} routes)", routing.routes.len());
        Ok(())
    }

    /// Swap the collection snapshot and rebuild routes.
    pub fn replace_collections(&self, collections: Vec<Collection>) {
        let mut routing = self.state.routing.write();
        routing.collections = Arc::new(collections);
        routing.rebuild();
        debug!(
            "Replaced collections: {} collections, {} routes",
            routing.collections.len(),
            routing.routes.len()
        );
    }

    pub fn get_custom_response(&self, collection_id: &str, endpoint_id: &str) -> Option<Value> {
        let key = endpoint_key(collection_id, endpoint_id);
        self.state.routing.read().settings.response_for(&key).cloned()
    }

    pub fn get_custom_status_code(&self, collection_id: &str, endpoint_id: &str) -> Option<u16> {
        let key = endpoint_key(collection_id, endpoint_id);
        self.state.routing.read().settings.status_for(&key)
    }

    pub fn get_delay(&self, collection_id: &str, endpoint_id: &str) -> Option<u64> {
        let key = endpoint_key(collection_id, endpoint_id);
        self.state
            .routing
            .read()
            .settings
            .endpoint_delays
            .get(&key)
            .copied()
    }

    pub fn recent_logs(&self, limit: usize) -> Vec<RequestLogEntry> {
        self.state.log.recent(limit)
    }

    pub fn clear_logs(&self) {
        self.state.log.clear();
    }
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<EngineState>,
    mut shutdown_rx: broadcast::Receiver<()>,
    port: u16,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!("Accepted connection from {} on port {}", addr, port);
                        tokio::spawn(serve_connection(
                            stream,
                            Arc::clone(&state),
                            shutdown_rx.resubscribe(),
                            port,
                        ));
                    }
                    Err(e) => {
                        error!("Accept error on port {}: {}", port, e);
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Mock server on port {} shutting down", port);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::store::InMemoryStore;

    fn stopped_engine() -> MockServerEngine {
        MockServerEngine::new(
            Arc::new(InMemoryStore::new()),
            Vec::new(),
            EngineOptions::default(),
        )
    }

    #[test]
    fn test_update_port_waits_for_lifecycle() {
        let engine = stopped_engine();
        let before = engine.settings().port;

        let guard = engine.lifecycle.try_lock().unwrap();
        assert!(matches!(
            engine.update_port(5000),
            Err(MockServerError::PortChangeWhileRunning)
        ));
        assert_eq!(engine.settings().port, before);
        drop(guard);

        assert_eq!(engine.update_port(5000).unwrap(), 5000);
        assert_eq!(engine.settings().port, 5000);
    }
}
