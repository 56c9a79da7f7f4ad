//! HTTP bridge - request/response front end for an asynchronous message engine.
//!
//! Callers speak one-call-one-reply HTTP. The engine behind the bridge speaks
//! broadcast messages with asynchronous replies and no native pairing. The
//! bridge tags every call with a correlation identity and parks the caller
//! until a reply carrying the same identity comes back.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                           HTTP BRIDGE                              │
//! ├───────────────────────────────────────────────────────────────────┤
//! │   GET /  (liveness)     POST /  (call)     GET /pending (stats)    │
//! │                             │                                      │
//! │                  ┌──────────┴───────────┐                          │
//! │                  │   InboundEndpoint    │── mint RequestId         │
//! │                  └──────────┬───────────┘                          │
//! │           register │        │ broadcast                            │
//! │  ┌─────────────────┴──┐  ┌──┴──────────────────┐                   │
//! │  │ CorrelationRegistry│  │  ListenerRegistry   │                   │
//! │  │ (oneshot per call) │  │  (fan-out, ordered) │                   │
//! │  └─────────────────┬──┘  └──┬──────────────────┘                   │
//! │            fulfill │        │ Envelope {.., correlationId}         │
//! │                  ┌─┴────────┴───────────┐                          │
//! │                  │   OutboundRouter     │◄── reply {.., correlationId}
//! │                  └──────────────────────┘                          │
//! └───────────────────────────────────────────────────────────────────┘
//!                               │
//!                         protocol engine
//!                     (via `ServerTransport`)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use http_bridge::{BridgeConfig, HttpBridge, ServerTransport};
//!
//! let bridge = Arc::new(HttpBridge::new(BridgeConfig::default())?);
//! bridge.attach(engine_listener);
//! let addr = bridge.start().await?;
//! // ...
//! bridge.stop().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ipc;
pub mod middleware;
pub mod ports;
pub mod service;

pub use adapters::{
    BroadcastReport, CorrelationRegistry, ListenerKind, ListenerRegistry, RegistryError,
    RegistryStatsSnapshot, SubscriptionId,
};
pub use domain::{
    BridgeConfig, BridgeError, BridgeResult, ConfigError, CorsConfig, Envelope, ErrorBody,
    FaultKind, HttpConfig, InboundCall, LimitsConfig, Reply, RequestId, TimeoutConfig,
    CORRELATION_FIELD,
};
pub use ipc::{InboundEndpoint, OutboundRouter, RouteOutcome};
pub use ports::{EnvelopeListener, ListenerError, ServerTransport};
pub use service::{HttpBridge, LIVENESS_MESSAGE};
