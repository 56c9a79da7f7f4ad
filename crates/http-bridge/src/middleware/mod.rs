//! Middleware stack for the bridge's HTTP surface.
//!
//! Layer order: Request → Cors → Tracing → BodyLimit → Handler

pub mod cors;
pub mod tracing;

pub use cors::create_cors_layer;
pub use tracing::TracingLayer;
