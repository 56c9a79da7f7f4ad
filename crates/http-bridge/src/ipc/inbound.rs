//! Inbound endpoint - turns one external call into one reply.

use crate::adapters::listeners::ListenerRegistry;
use crate::adapters::pending::CorrelationRegistry;
use crate::domain::correlation::{RequestId, RequestIdGenerator};
use crate::domain::envelope::{Envelope, InboundCall, Reply};
use crate::domain::error::{BridgeError, BridgeResult};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Releases a continuation when the call is abandoned mid-flight.
///
/// Release is a no-op once the continuation was fulfilled or expired.
struct ReleaseOnDrop<'a> {
    registry: &'a CorrelationRegistry,
    id: RequestId,
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

/// Accepts calls, broadcasts them, and waits for the matching reply.
pub struct InboundEndpoint {
    ids: RequestIdGenerator,
    registry: Arc<CorrelationRegistry>,
    listeners: Arc<ListenerRegistry>,
    /// Deadline for each reply (`None` waits indefinitely)
    request_timeout: Option<Duration>,
}

impl InboundEndpoint {
    pub fn new(
        registry: Arc<CorrelationRegistry>,
        listeners: Arc<ListenerRegistry>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            ids: RequestIdGenerator::new(),
            registry,
            listeners,
            request_timeout,
        }
    }

    /// Handle one call end to end.
    ///
    /// Without a request timeout, a call nobody answers waits forever.
    pub async fn accept(&self, raw: Value) -> BridgeResult<Reply> {
        let call = InboundCall::from_value(raw)?;

        let id = self.ids.next_id();
        let rx = self
            .registry
            .register(id, call.method())
            .map_err(|e| BridgeError::Processing(e.to_string()))?;

        // From here on every exit path, including this future being dropped,
        // removes the continuation.
        let _guard = ReleaseOnDrop {
            registry: &self.registry,
            id,
        };

        let envelope = Envelope::new(call, id);
        let report = self.listeners.broadcast(&envelope);
        if report.reached_nobody() {
            error!(
                correlation_id = %id,
                method = envelope.method(),
                failed = report.failed,
                "Call reached no listener"
            );
            return Err(BridgeError::Processing(format!(
                "request {id} reached no listener ({} failed)",
                report.failed
            )));
        }

        let received = match self.request_timeout {
            Some(after) => match tokio::time::timeout(after, rx).await {
                Ok(received) => received,
                Err(_) => {
                    self.registry.expire(id);
                    return Err(BridgeError::Timeout { id, after });
                }
            },
            None => rx.await,
        };

        match received {
            Ok(reply) => {
                debug!(correlation_id = %id, "Returning reply to caller");
                Ok(reply)
            }
            Err(_) => Err(BridgeError::Processing(format!(
                "continuation for request {id} closed without a reply"
            ))),
        }
    }

    /// Identities minted so far
    pub fn minted_count(&self) -> u64 {
        self.ids.minted()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}
