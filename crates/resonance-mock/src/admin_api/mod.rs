//! Admin REST API for the mock server.
//!
//! Exposes the control surface over HTTP:
//! - Listener status, start/stop and port changes
//! - Collection enablement and OpenAPI export
//! - Per-endpoint delay, status code and response overrides
//! - The request log
//!
//! The API listens on a configurable address (default: 127.0.0.1:2525).

mod handlers;
mod router;
mod server;
pub(crate) mod types;

pub use server::AdminApiServer;
pub use types::DEFAULT_LOG_LIMIT;
