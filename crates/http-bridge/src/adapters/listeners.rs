//! Listener registry - fan-out of envelopes to attached listeners.
//!
//! Every attached listener receives every envelope, in attachment order.
//! This is broadcast, not a work queue.

use crate::domain::envelope::Envelope;
use crate::ports::transport::EnvelopeListener;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Subscription handle returned by `attach`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Event kinds a listener can subscribe to.
///
/// Only inbound messages exist; the kind is kept for callers that subscribe by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// Delivery of an inbound envelope
    Message,
}

impl ListenerKind {
    /// Parse an event name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "message" => Some(Self::Message),
            _ => None,
        }
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Listeners that accepted the envelope
    pub delivered: usize,
    /// Listeners that returned an error or panicked
    pub failed: usize,
}

impl BroadcastReport {
    /// True when no listener accepted the envelope
    pub fn reached_nobody(&self) -> bool {
        self.delivered == 0
    }
}

/// Registry of attached listeners.
pub struct ListenerRegistry {
    /// Keyed by a monotonically increasing id, so iteration is attachment order
    listeners: RwLock<BTreeMap<SubscriptionId, Arc<dyn EnvelopeListener>>>,
    /// Counter for generating subscription IDs
    id_counter: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(BTreeMap::new()),
            id_counter: AtomicU64::new(1),
        }
    }

    /// Attach a listener
    pub fn attach(&self, listener: Arc<dyn EnvelopeListener>) -> SubscriptionId {
        let id = SubscriptionId(self.id_counter.fetch_add(1, Ordering::Relaxed));

        let attached = {
            let mut listeners = self.listeners.write();
            listeners.insert(id, listener);
            listeners.len()
        };

        if attached > 1 {
            // Every listener processes every call; nothing prevents duplicate replies
            warn!(
                subscription_id = %id,
                attached = attached,
                "Multiple listeners attached, calls will be processed by each"
            );
        } else {
            debug!(subscription_id = %id, "Attached listener");
        }

        id
    }

    /// Attach a listener for a named event kind.
    ///
    /// Returns `None` for any kind other than `"message"`.
    pub fn attach_kind(
        &self,
        kind: &str,
        listener: Arc<dyn EnvelopeListener>,
    ) -> Option<SubscriptionId> {
        match ListenerKind::parse(kind) {
            Some(ListenerKind::Message) => Some(self.attach(listener)),
            None => {
                debug!(kind = kind, "Rejected subscription for unknown event kind");
                None
            }
        }
    }

    /// Detach a listener. Returns whether it was attached.
    pub fn detach(&self, id: &SubscriptionId) -> bool {
        let removed = self.listeners.write().remove(id).is_some();
        if removed {
            debug!(subscription_id = %id, "Detached listener");
        }
        removed
    }

    /// Detach a listener for a named event kind
    pub fn detach_kind(&self, kind: &str, id: &SubscriptionId) -> bool {
        match ListenerKind::parse(kind) {
            Some(ListenerKind::Message) => self.detach(id),
            None => false,
        }
    }

    /// Deliver `envelope` to every attached listener in attachment order.
    ///
    /// Listeners run outside the registry lock. A listener that fails or panics
    /// is logged and skipped; the rest still receive the envelope.
    pub fn broadcast(&self, envelope: &Envelope) -> BroadcastReport {
        let snapshot: Vec<(SubscriptionId, Arc<dyn EnvelopeListener>)> = self
            .listeners
            .read()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        let mut report = BroadcastReport::default();

        for (id, listener) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.deliver(envelope))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        subscription_id = %id,
                        correlation_id = %envelope.correlation_id(),
                        error = %e,
                        "Listener failed to accept envelope"
                    );
                }
                Err(_) => {
                    report.failed += 1;
                    error!(
                        subscription_id = %id,
                        correlation_id = %envelope.correlation_id(),
                        "Listener panicked while accepting envelope"
                    );
                }
            }
        }

        debug!(
            correlation_id = %envelope.correlation_id(),
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast envelope"
        );

        report
    }

    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Whether `id` is currently attached
    pub fn is_attached(&self, id: &SubscriptionId) -> bool {
        self.listeners.read().contains_key(id)
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener that always fails. Used to exercise failure isolation.
#[cfg(test)]
pub(crate) fn failing_listener() -> Arc<dyn EnvelopeListener> {
    use crate::ports::transport::ListenerError;
    Arc::new(|_: &Envelope| -> Result<(), ListenerError> {
        Err(ListenerError::Rejected("boom".into()))
    })
}
