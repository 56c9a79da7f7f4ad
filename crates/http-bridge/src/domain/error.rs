//! Bridge error taxonomy.
//!
//! | Variant            | Caller sees | Registry effect              |
//! |--------------------|-------------|------------------------------|
//! | `MalformedRequest` | client fault| nothing minted or registered |
//! | `Processing`       | server fault| continuation released        |
//! | `Timeout`          | timeout     | continuation released        |
//!
//! Unparseable and unmatched replies are not errors; see `OutboundRouter`.

use crate::domain::config::ConfigError;
use crate::domain::correlation::RequestId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which side of the call is at fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The caller sent something unusable
    Client,
    /// The bridge or its collaborator failed
    Server,
    /// No reply arrived before the deadline
    Timeout,
}

/// Bridge errors
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Call rejected before an identity was minted
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Registration or broadcast failed after the call was accepted
    #[error("processing fault: {0}")]
    Processing(String),

    /// Deadline elapsed with no matching reply
    #[error("request {id} timed out after {}ms", .after.as_millis())]
    Timeout { id: RequestId, after: Duration },

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Listening socket could not be bound
    #[error("server bind error: {0}")]
    Bind(#[source] std::io::Error),

    /// `start` called on a running bridge
    #[error("bridge already started")]
    AlreadyStarted,

    /// `start` called with the HTTP transport disabled
    #[error("http transport is disabled")]
    TransportDisabled,

    /// Serving task ended abnormally
    #[error("server error: {0}")]
    Server(String),
}

impl BridgeError {
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            BridgeError::MalformedRequest(_) => FaultKind::Client,
            BridgeError::Timeout { .. } => FaultKind::Timeout,
            _ => FaultKind::Server,
        }
    }

    /// Message safe to return to an external caller.
    ///
    /// Internal detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self.fault_kind() {
            FaultKind::Client => "Invalid request format",
            FaultKind::Timeout => "Request timed out",
            FaultKind::Server => "Internal server error",
        }
    }

    /// Body returned to the caller for this error
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.public_message().to_string(),
        }
    }
}

/// JSON error body: `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
