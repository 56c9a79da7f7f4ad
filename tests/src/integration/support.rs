//! Fixtures shared by the integration scenarios.

use http_bridge::{
    BridgeConfig, Envelope, EnvelopeListener, HttpBridge, ListenerError, RequestId,
    ServerTransport,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Upper bound on any single wait in a scenario
pub const WAIT: Duration = Duration::from_secs(5);

/// Config bound to an ephemeral loopback port
pub fn local_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.http.host = [127, 0, 0, 1].into();
    config.http.port = 0;
    config
}

/// A started bridge plus an HTTP client pointed at it
pub struct TestBridge {
    pub bridge: Arc<HttpBridge>,
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestBridge {
    pub async fn start(config: BridgeConfig) -> Self {
        let bridge = Arc::new(HttpBridge::new(config).expect("valid config"));
        let addr = bridge.start().await.expect("bridge starts");
        Self {
            bridge,
            addr,
            client: reqwest::Client::new(),
        }
    }

    pub async fn start_default() -> Self {
        Self::start(local_config()).await
    }

    /// The bridge as the engine sees it
    pub fn transport(&self) -> Arc<dyn ServerTransport> {
        self.bridge.clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a JSON call, returning status and parsed body
    pub async fn call(&self, body: &Value) -> (u16, Value) {
        self.call_raw(&body.to_string()).await
    }

    /// POST an arbitrary body
    pub async fn call_raw(&self, body: &str) -> (u16, Value) {
        let response = self
            .client
            .post(self.url("/"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("request sent");
        let status = response.status().as_u16();
        let value = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, value)
    }

    /// GET a path and parse the JSON body
    pub async fn get(&self, path: &str) -> Value {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request sent")
            .json()
            .await
            .expect("json body")
    }

    pub async fn stop(&self) {
        self.bridge.stop().await.expect("bridge stops");
    }
}

/// Engine that hands every envelope to the test and never answers on its own
pub fn channel_engine() -> (Arc<dyn EnvelopeListener>, mpsc::UnboundedReceiver<Envelope>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener: Arc<dyn EnvelopeListener> = Arc::new(move |env: &Envelope| -> Result<(), ListenerError> {
        tx.send(env.clone()).map_err(|_| ListenerError::Closed)
    });
    (listener, rx)
}

/// Wait for the next envelope an engine received
pub async fn next_envelope(rx: &mut mpsc::UnboundedReceiver<Envelope>) -> Envelope {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("envelope within deadline")
        .expect("engine channel open")
}

/// Listener that records the identities it was handed
#[derive(Default)]
pub struct Recorder {
    seen: Mutex<Vec<RequestId>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<RequestId> {
        self.seen.lock().clone()
    }
}

impl EnvelopeListener for Recorder {
    fn deliver(&self, envelope: &Envelope) -> Result<(), ListenerError> {
        self.seen.lock().push(envelope.correlation_id());
        Ok(())
    }
}

/// Listener that always fails
pub fn failing_listener() -> Arc<dyn EnvelopeListener> {
    Arc::new(|_: &Envelope| -> Result<(), ListenerError> {
        Err(ListenerError::Rejected("engine unavailable".into()))
    })
}
