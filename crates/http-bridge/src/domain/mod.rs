//! Domain types for the bridge.
//!
//! This module contains the core types, configuration, and error handling.
//! Registries holding live continuations and listeners are in the adapters layer.

pub mod config;
pub mod correlation;
pub mod envelope;
pub mod error;

// Re-exports for convenience
pub use config::{BridgeConfig, ConfigError, CorsConfig, HttpConfig, LimitsConfig, TimeoutConfig};
pub use correlation::{RequestId, RequestIdGenerator};
pub use envelope::{Envelope, InboundCall, Reply, CORRELATION_FIELD, METHOD_FIELD};
pub use error::{BridgeError, BridgeResult, ErrorBody, FaultKind};
