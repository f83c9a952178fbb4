//! Admin API request handlers, grouped by resource.

pub mod collections;
pub mod logs;
pub mod overrides;
pub mod server;
