//! Structural schema descriptors.
//!
//! - `infer`: derive a descriptor from an example payload (export path)
//! - `synthesize`: build a payload from a descriptor and/or example (mock path)
//!
//! Both directions are total: malformed input degrades to a conservative
//! default instead of failing. Recursion is capped at [`MAX_DEPTH`] levels.

mod infer;
mod synthesize;
mod types;

pub use infer::infer;
pub use synthesize::{fallback_body, synthesize};
pub use types::{SchemaNode, SchemaType};

/// Nesting limit for inference, synthesis and lenient schema parsing.
pub const MAX_DEPTH: usize = 64;
