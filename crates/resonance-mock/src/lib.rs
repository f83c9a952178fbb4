//! Resonance mock engine.
//!
//! Serves collection endpoints as a local HTTP mock server with runtime
//! overrides, and exports collections as OpenAPI 3.0 documents.
//!
//! - [`collection`]: the endpoint collection model shared by both features
//! - [`schema`]: example synthesis and schema inference
//! - [`openapi`]: OpenAPI document assembly and serialization
//! - [`mock`]: the mock server engine, its persisted settings and request log
//! - [`admin_api`]: HTTP control surface over the engine

pub mod admin_api;
pub mod collection;
pub mod config;
pub mod mock;
pub mod openapi;
pub mod schema;
