//! Local HTTP mock server driven by collection endpoints.
//!
//! Requests are routed against the endpoints of enabled collections and
//! answered with, in order of preference, a custom response override, a body
//! synthesized from the declared success response, or a fixed fallback body.
//! Per-endpoint delays and status codes can be overridden at runtime; all
//! overrides are persisted through a [`KeyValueStore`].

mod admin;
mod engine;
mod handler;
mod request_log;
mod response;
mod route_table;
mod settings;
mod store;
mod types;


pub(crate) use admin::{
    port_message, start_message, stop_message, toggle_message, RELOAD_MESSAGE,
};
pub use engine::{EngineOptions, MockRequest, MockServerEngine};
pub use handler::parse_query;
pub use request_log::{MatchedEndpoint, RequestLog, RequestLogEntry, DEFAULT_LOG_CAPACITY};
pub use response::{default_status_for, MockResponse, ResponseDecision, ResponseSource};
pub use route_table::{PathTemplate, Route, RouteMatch, RouteTable};
pub use settings::{
    endpoint_key, validate_delay, validate_port, validate_status_code, MockServerSettings,
    DEFAULT_PORT, MAX_DELAY_MS,
};
pub use store::{
    load_collections, load_settings, save_collections, save_settings, InMemoryStore,
    JsonFileStore, KeyValueStore, StoreError, COLLECTIONS_KEY, SETTINGS_KEY,
};
pub use types::{
    AdminResult, MockServerError, ServerPhase, ServerStatus, StartOutcome, StopOutcome,
};
