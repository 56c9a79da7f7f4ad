//! Request identity for correlating replies with waiting callers.
//!
//! Identities are minted from a monotonically increasing counter owned by the
//! bridge instance. The first accepted call receives identity 1.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one accepted call.
///
/// Travels inside the broadcast envelope as a JSON number and must be echoed
/// back unchanged by whoever answers the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Create from a raw value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying value
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Read a request identity from a JSON value.
    ///
    /// Only non-negative integers are identities; strings, floats and
    /// negative numbers are not.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        value.as_u64().map(Self)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<RequestId> for u64 {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

impl From<RequestId> for serde_json::Value {
    fn from(id: RequestId) -> Self {
        serde_json::Value::from(id.0)
    }
}

/// Mints request identities. Never yields the same identity twice.
#[derive(Debug)]
pub struct RequestIdGenerator {
    last: AtomicU64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Mint the next identity
    pub fn next_id(&self) -> RequestId {
        RequestId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Number of identities minted so far
    pub fn minted(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
