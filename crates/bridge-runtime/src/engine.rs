//! Reference protocol engine.
//!
//! Answers `ping` and reports every other method as not found. Enough to
//! exercise the bridge end to end without a real MCP server behind it.

use http_bridge::{
    Envelope, EnvelopeListener, ListenerError, ServerTransport, SubscriptionId, CORRELATION_FIELD,
};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Weak};
use tracing::debug;

/// JSON-RPC "method not found"
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Minimal JSON-RPC responder attached to a transport.
pub struct PingEngine {
    /// Weak so the transport's listener list does not keep itself alive
    transport: Weak<dyn ServerTransport>,
}

impl PingEngine {
    /// Attach a new engine to `transport`
    pub fn connect(transport: &Arc<dyn ServerTransport>) -> SubscriptionId {
        let engine = Arc::new(Self {
            transport: Arc::downgrade(transport),
        });
        transport.attach(engine)
    }

    /// Build the reply for one call, echoing `jsonrpc`, `id` and the correlation field.
    pub fn answer(call: &Value) -> Value {
        let method = call.get("method").and_then(Value::as_str).unwrap_or_default();

        let mut reply = Map::new();
        reply.insert(
            "jsonrpc".to_string(),
            call.get("jsonrpc").cloned().unwrap_or_else(|| json!("2.0")),
        );
        if let Some(id) = call.get("id") {
            reply.insert("id".to_string(), id.clone());
        }

        match method {
            "ping" => {
                reply.insert("result".to_string(), json!({}));
            }
            other => {
                reply.insert(
                    "error".to_string(),
                    json!({
                        "code": METHOD_NOT_FOUND,
                        "message": format!("Method not found: {other}"),
                    }),
                );
            }
        }

        if let Some(correlation) = call.get(CORRELATION_FIELD) {
            reply.insert(CORRELATION_FIELD.to_string(), correlation.clone());
        }

        Value::Object(reply)
    }
}

impl EnvelopeListener for PingEngine {
    fn deliver(&self, envelope: &Envelope) -> Result<(), ListenerError> {
        let transport = self.transport.upgrade().ok_or(ListenerError::Closed)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ListenerError::Rejected(e.to_string()))?;

        let reply = Self::answer(envelope.payload()).to_string();
        let correlation_id = envelope.correlation_id();

        runtime.spawn(async move {
            let outcome = transport.send(&reply).await;
            debug!(correlation_id = %correlation_id, outcome = ?outcome, "Engine replied");
        });

        Ok(())
    }
}
