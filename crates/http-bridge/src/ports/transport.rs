//! Capability traits at the seam between the bridge and the protocol engine.

use crate::adapters::listeners::SubscriptionId;
use crate::domain::envelope::Envelope;
use crate::ipc::outbound::RouteOutcome;
use async_trait::async_trait;
use std::sync::Arc;

/// Listener errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    /// Listener refused the envelope
    #[error("listener rejected envelope: {0}")]
    Rejected(String),
    /// Listener's downstream is gone
    #[error("listener channel closed")]
    Closed,
}

/// Receives every envelope broadcast by the bridge.
///
/// `deliver` runs synchronously on the caller's task and must not block.
/// Engines that do real work should hand the envelope off (spawn or channel)
/// and return.
pub trait EnvelopeListener: Send + Sync {
    fn deliver(&self, envelope: &Envelope) -> Result<(), ListenerError>;
}

impl<F> EnvelopeListener for F
where
    F: Fn(&Envelope) -> Result<(), ListenerError> + Send + Sync,
{
    fn deliver(&self, envelope: &Envelope) -> Result<(), ListenerError> {
        self(envelope)
    }
}

/// Transport as seen by a protocol engine: subscribe to calls, send replies.
#[async_trait]
pub trait ServerTransport: Send + Sync {
    /// Attach a listener for inbound envelopes
    fn attach(&self, listener: Arc<dyn EnvelopeListener>) -> SubscriptionId;

    /// Detach a listener. Returns whether it was attached.
    fn detach(&self, id: &SubscriptionId) -> bool;

    /// Submit a serialized reply. Never fails; the outcome is informational.
    async fn send(&self, reply: &str) -> RouteOutcome;
}
