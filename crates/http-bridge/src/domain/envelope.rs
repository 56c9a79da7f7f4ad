//! Wire payloads crossing the bridge.
//!
//! ```text
//! caller ──InboundCall──► bridge ──Envelope (+correlationId)──► listeners
//! caller ◄────Reply────── bridge ◄──reply (+correlationId)───── engine
//! ```

use crate::domain::correlation::RequestId;
use crate::domain::error::BridgeError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Field carrying the request identity across the broadcast hop
pub const CORRELATION_FIELD: &str = "correlationId";

/// Field naming the requested operation
pub const METHOD_FIELD: &str = "method";

/// A call that passed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundCall {
    method: String,
    body: Map<String, Value>,
}

impl InboundCall {
    /// Validate a raw call.
    ///
    /// The call must be a JSON object with a non-empty string `method`.
    pub fn from_value(raw: Value) -> Result<Self, BridgeError> {
        let Value::Object(body) = raw else {
            return Err(BridgeError::MalformedRequest("call is not a JSON object".into()));
        };

        let method = match body.get(METHOD_FIELD) {
            Some(Value::String(m)) if !m.is_empty() => m.clone(),
            Some(_) => {
                return Err(BridgeError::MalformedRequest(
                    "method must be a non-empty string".into(),
                ))
            }
            None => return Err(BridgeError::MalformedRequest("missing method".into())),
        };

        Ok(Self { method, body })
    }

    /// Operation name
    pub fn method(&self) -> &str {
        &self.method
    }
}

/// A call tagged with its request identity, as delivered to listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Envelope {
    #[serde(skip)]
    correlation_id: RequestId,
    payload: Value,
}

impl Envelope {
    /// Tag a call with its identity. An existing `correlationId` is overwritten.
    pub fn new(call: InboundCall, correlation_id: RequestId) -> Self {
        let mut body = call.body;
        body.insert(CORRELATION_FIELD.to_string(), correlation_id.into());
        Self {
            correlation_id,
            payload: Value::Object(body),
        }
    }

    pub fn correlation_id(&self) -> RequestId {
        self.correlation_id
    }

    /// Operation name of the wrapped call
    pub fn method(&self) -> &str {
        self.payload
            .get(METHOD_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Full tagged payload
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Serialized form handed to message-oriented listeners
    pub fn to_json_string(&self) -> String {
        self.payload.to_string()
    }
}

/// A reply returned to a caller. Never carries the correlation field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Reply(Value);

impl Reply {
    /// Split a raw reply into its identity (if tagged) and the caller-facing payload.
    ///
    /// The correlation field is removed whether or not it holds a valid identity.
    pub fn untag(raw: Value) -> (Option<RequestId>, Self) {
        match raw {
            Value::Object(mut body) => {
                let id = body
                    .remove(CORRELATION_FIELD)
                    .as_ref()
                    .and_then(RequestId::from_json);
                (id, Self(Value::Object(body)))
            }
            other => (None, Self(other)),
        }
    }

    pub fn payload(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}
