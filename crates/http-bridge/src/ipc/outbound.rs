//! Outbound router - replies from the engine back to waiting callers.

use crate::adapters::pending::CorrelationRegistry;
use crate::domain::envelope::Reply;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to a submitted reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Handed to the waiting caller
    Delivered,
    /// Tagged, but nothing is pending under that identity
    Unmatched,
    /// No usable correlation identity
    Untagged,
    /// Reply text was not valid JSON
    Unparseable,
}

impl RouteOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, RouteOutcome::Delivered)
    }
}

/// Routes replies to the continuation that issued the matching call.
#[derive(Clone)]
pub struct OutboundRouter {
    registry: Arc<CorrelationRegistry>,
}

impl OutboundRouter {
    pub fn new(registry: Arc<CorrelationRegistry>) -> Self {
        Self { registry }
    }

    /// Route a serialized reply.
    ///
    /// Parse failures are logged and swallowed.
    pub fn route(&self, raw: &str) -> RouteOutcome {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.route_value(value),
            Err(e) => {
                warn!(error = %e, len = raw.len(), "Dropping unparseable reply");
                RouteOutcome::Unparseable
            }
        }
    }

    /// Route an already-parsed reply
    pub fn route_value(&self, value: Value) -> RouteOutcome {
        let (id, reply) = Reply::untag(value);

        let Some(id) = id else {
            debug!("Dropping reply without a correlation identity");
            return RouteOutcome::Untagged;
        };

        if self.registry.fulfill(id, reply) {
            RouteOutcome::Delivered
        } else {
            RouteOutcome::Unmatched
        }
    }
}
