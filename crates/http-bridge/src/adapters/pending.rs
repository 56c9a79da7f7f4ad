//! Correlation registry - pending continuations keyed by request identity.
//!
//! Flow:
//! 1. Inbound endpoint mints a `RequestId`
//! 2. Endpoint calls `register()` to get a oneshot receiver
//! 3. Endpoint broadcasts the envelope carrying the identity
//! 4. Outbound router receives a reply and calls `fulfill()`
//! 5. Endpoint awaits the receiver (optionally against a deadline)
//!
//! Every operation here is synchronous and holds a shard lock only for the
//! duration of one map access.

use crate::domain::correlation::RequestId;
use crate::domain::envelope::Reply;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Identity already has a pending continuation
    #[error("request identity {0} is already registered")]
    DuplicateIdentity(RequestId),
}

/// A caller waiting for its reply
struct PendingContinuation {
    /// Channel resolving the caller
    sender: oneshot::Sender<Reply>,
    /// When the call was registered
    created_at: Instant,
    /// Method name (for logging)
    method: String,
}

/// Cumulative registry counters
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Continuations registered
    pub total_registered: AtomicU64,
    /// Continuations resolved with a reply
    pub total_fulfilled: AtomicU64,
    /// Continuations removed without a reply
    pub total_released: AtomicU64,
    /// Continuations removed because their deadline passed
    pub total_timeouts: AtomicU64,
    /// Replies that matched no pending continuation
    pub total_unmatched: AtomicU64,
}

/// Point-in-time copy of the registry counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStatsSnapshot {
    pub pending: usize,
    pub registered: u64,
    pub fulfilled: u64,
    pub released: u64,
    pub timeouts: u64,
    pub unmatched: u64,
}

/// Maps request identities to waiting callers.
pub struct CorrelationRegistry {
    /// Map of request identity to pending continuation
    pending: DashMap<RequestId, PendingContinuation>,
    /// Statistics
    stats: RegistryStats,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            stats: RegistryStats::default(),
        }
    }

    /// Register a continuation for `id` and get a receiver for its reply.
    ///
    /// Identities are minted fresh per call, so a duplicate is a programming error.
    pub fn register(
        &self,
        id: RequestId,
        method: &str,
    ) -> Result<oneshot::Receiver<Reply>, RegistryError> {
        let (tx, rx) = oneshot::channel();

        match self.pending.entry(id) {
            Entry::Occupied(_) => {
                warn!(correlation_id = %id, method = method, "Duplicate request identity");
                return Err(RegistryError::DuplicateIdentity(id));
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingContinuation {
                    sender: tx,
                    created_at: Instant::now(),
                    method: method.to_string(),
                });
            }
        }
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(correlation_id = %id, method = method, "Registered pending call");

        Ok(rx)
    }

    /// Resolve the continuation for `id` with `reply` and remove it.
    ///
    /// Returns false when nothing is pending for `id`, or when its caller has
    /// already gone away. Neither case is an error.
    pub fn fulfill(&self, id: RequestId, reply: Reply) -> bool {
        let Some((_, pending)) = self.pending.remove(&id) else {
            self.stats.total_unmatched.fetch_add(1, Ordering::Relaxed);
            debug!(correlation_id = %id, "Reply for unknown or completed request identity");
            return false;
        };

        let elapsed = pending.created_at.elapsed();
        match pending.sender.send(reply) {
            Ok(()) => {
                self.stats.total_fulfilled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %id,
                    method = pending.method,
                    response_time_ms = elapsed.as_millis(),
                    "Fulfilled pending call"
                );
                true
            }
            Err(_) => {
                // Receiver dropped between lookup and send
                self.stats.total_released.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %id,
                    method = pending.method,
                    "Caller went away before reply arrived"
                );
                false
            }
        }
    }

    /// Remove the continuation for `id` without resolving it.
    ///
    /// The waiting receiver observes a closed channel.
    pub fn release(&self, id: RequestId) -> bool {
        if self.pending.remove(&id).is_some() {
            self.stats.total_released.fetch_add(1, Ordering::Relaxed);
            debug!(correlation_id = %id, "Released pending call");
            true
        } else {
            false
        }
    }

    /// Remove the continuation for `id` because its deadline passed.
    pub fn expire(&self, id: RequestId) -> bool {
        if let Some((_, pending)) = self.pending.remove(&id) {
            self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
            warn!(
                correlation_id = %id,
                method = pending.method,
                elapsed_ms = pending.created_at.elapsed().as_millis(),
                "Pending call expired without a reply"
            );
            true
        } else {
            false
        }
    }

    /// Release every pending continuation. Returns how many were removed.
    pub fn release_all(&self) -> usize {
        let ids: Vec<RequestId> = self.pending.iter().map(|entry| *entry.key()).collect();
        ids.into_iter().filter(|id| self.release(*id)).count()
    }

    /// Get number of currently pending calls
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if a request identity is pending
    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.pending.contains_key(id)
    }

    /// Get statistics
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Copy the statistics
    pub fn snapshot(&self) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            pending: self.pending_count(),
            registered: self.stats.total_registered.load(Ordering::Relaxed),
            fulfilled: self.stats.total_fulfilled.load(Ordering::Relaxed),
            released: self.stats.total_released.load(Ordering::Relaxed),
            timeouts: self.stats.total_timeouts.load(Ordering::Relaxed),
            unmatched: self.stats.total_unmatched.load(Ordering::Relaxed),
        }
    }
}

impl Default for CorrelationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
