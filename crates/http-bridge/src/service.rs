//! HTTP bridge service - main entry point.
//!
//! Owns both registries, serves the HTTP surface, and implements
//! `ServerTransport` for the protocol engine.

use crate::adapters::listeners::{ListenerRegistry, SubscriptionId};
use crate::adapters::pending::CorrelationRegistry;
use crate::domain::config::BridgeConfig;
use crate::domain::error::{BridgeError, BridgeResult, FaultKind};
use crate::domain::envelope::Reply;
use crate::ipc::inbound::InboundEndpoint;
use crate::ipc::outbound::{OutboundRouter, RouteOutcome};
use crate::middleware::{create_cors_layer, TracingLayer};
use crate::ports::transport::{EnvelopeListener, ServerTransport};
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

/// Fixed liveness acknowledgment
pub const LIVENESS_MESSAGE: &str = "MCP server is running";

/// A serving task and the means to stop it
struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

/// HTTP bridge service state
pub struct HttpBridge {
    config: BridgeConfig,
    registry: Arc<CorrelationRegistry>,
    listeners: Arc<ListenerRegistry>,
    endpoint: Arc<InboundEndpoint>,
    outbound: OutboundRouter,
    started: AtomicBool,
    server: Mutex<Option<RunningServer>>,
}

impl HttpBridge {
    /// Create a new bridge. Nothing is bound until `start`.
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;

        let registry = Arc::new(CorrelationRegistry::new());
        let listeners = Arc::new(ListenerRegistry::new());
        let endpoint = Arc::new(InboundEndpoint::new(
            Arc::clone(&registry),
            Arc::clone(&listeners),
            config.timeouts.request,
        ));
        let outbound = OutboundRouter::new(Arc::clone(&registry));

        Ok(Self {
            config,
            registry,
            listeners,
            endpoint,
            outbound,
            started: AtomicBool::new(false),
            server: Mutex::new(None),
        })
    }

    /// Bind the listening socket and begin serving.
    ///
    /// Resolves once the socket accepts connections, with the bound address.
    pub async fn start(&self) -> BridgeResult<SocketAddr> {
        if !self.config.http.enabled {
            return Err(BridgeError::TransportDisabled);
        }
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BridgeError::AlreadyStarted);
        }

        let listener = match tokio::net::TcpListener::bind(self.config.http_addr()).await {
            Ok(listener) => listener,
            Err(e) => {
                self.started.store(false, Ordering::Release);
                return Err(BridgeError::Bind(e));
            }
        };
        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.started.store(false, Ordering::Release);
                return Err(BridgeError::Bind(e));
            }
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = self.router();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        *self.server.lock() = Some(RunningServer {
            addr,
            shutdown_tx,
            handle,
        });

        info!(addr = %addr, "HTTP bridge listening");
        Ok(addr)
    }

    /// Stop accepting calls and wait for the server to shut down.
    ///
    /// In-flight calls are drained. With `timeouts.drain` set, calls still
    /// pending when it elapses are released (their callers get a server fault)
    /// and the server is aborted. A bridge that is not running is left alone.
    pub async fn stop(&self) -> BridgeResult<()> {
        let server = self.server.lock().take();
        let Some(server) = server else {
            return Ok(());
        };

        info!(
            addr = %server.addr,
            pending = self.registry.pending_count(),
            "Stopping HTTP bridge"
        );
        let _ = server.shutdown_tx.send(());

        let mut handle = server.handle;
        let joined = match self.config.timeouts.drain {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => Some(joined),
                Err(_) => {
                    // Connections run on their own tasks; releasing the
                    // continuations is what ends their handlers.
                    let released = self.registry.release_all();
                    warn!(
                        drain_timeout_ms = limit.as_millis(),
                        released = released,
                        "Drain timed out, aborting server"
                    );
                    handle.abort();
                    None
                }
            },
            None => Some(handle.await),
        };
        self.started.store(false, Ordering::Release);

        match joined {
            None | Some(Ok(Ok(()))) => {
                info!("HTTP bridge stopped");
                Ok(())
            }
            Some(Ok(Err(e))) => Err(BridgeError::Server(e.to_string())),
            Some(Err(e)) => Err(BridgeError::Server(e.to_string())),
        }
    }

    /// Address the server is bound to, while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.lock().as_ref().map(|s| s.addr)
    }

    pub fn is_running(&self) -> bool {
        self.server.lock().is_some()
    }

    /// Attach a listener for a named event kind. Only `"message"` is accepted.
    pub fn attach_kind(
        &self,
        kind: &str,
        listener: Arc<dyn EnvelopeListener>,
    ) -> Option<SubscriptionId> {
        self.listeners.attach_kind(kind, listener)
    }

    /// Detach a listener for a named event kind
    pub fn detach_kind(&self, kind: &str, id: &SubscriptionId) -> bool {
        self.listeners.detach_kind(kind, id)
    }

    /// Handle for submitting replies without going through the trait
    pub fn outbound(&self) -> OutboundRouter {
        self.outbound.clone()
    }

    pub fn registry(&self) -> Arc<CorrelationRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn listeners(&self) -> Arc<ListenerRegistry> {
        Arc::clone(&self.listeners)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        let state = AppState {
            endpoint: Arc::clone(&self.endpoint),
            registry: Arc::clone(&self.registry),
            listeners: Arc::clone(&self.listeners),
        };

        let router = Router::new()
            .route("/", get(liveness).post(accept_call))
            .route("/pending", get(pending_stats))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.config.limits.max_request_size))
            .layer(TracingLayer::new())
            .with_state(state);

        match create_cors_layer(&self.config.cors) {
            Some(cors) => router.layer(cors),
            None => router,
        }
    }
}

#[async_trait]
impl ServerTransport for HttpBridge {
    fn attach(&self, listener: Arc<dyn EnvelopeListener>) -> SubscriptionId {
        self.listeners.attach(listener)
    }

    fn detach(&self, id: &SubscriptionId) -> bool {
        self.listeners.detach(id)
    }

    async fn send(&self, reply: &str) -> RouteOutcome {
        self.outbound.route(reply)
    }
}

impl Drop for HttpBridge {
    fn drop(&mut self) {
        if let Some(server) = self.server.get_mut().take() {
            let _ = server.shutdown_tx.send(());
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    endpoint: Arc<InboundEndpoint>,
    registry: Arc<CorrelationRegistry>,
    listeners: Arc<ListenerRegistry>,
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = match self.fault_kind() {
            FaultKind::Client => StatusCode::BAD_REQUEST,
            FaultKind::Server => StatusCode::INTERNAL_SERVER_ERROR,
            FaultKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        };
        (status, Json(self.to_body())).into_response()
    }
}

/// Accept one call and answer with its reply
async fn accept_call(State(state): State<AppState>, body: Bytes) -> Result<Json<Reply>, BridgeError> {
    let result = match serde_json::from_slice::<Value>(&body) {
        Ok(raw) => state.endpoint.accept(raw).await,
        Err(e) => Err(BridgeError::MalformedRequest(format!("body is not valid JSON: {e}"))),
    };

    result.map(Json).map_err(|e| {
        match e.fault_kind() {
            FaultKind::Client => warn!(error = %e, "Rejected call"),
            FaultKind::Timeout => warn!(error = %e, "Call timed out"),
            FaultKind::Server => error!(error = %e, "Call failed"),
        }
        e
    })
}

/// Liveness check endpoint
async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({ "status": LIVENESS_MESSAGE }))
}

/// Pending call statistics
async fn pending_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.registry.snapshot();
    Json(serde_json::json!({
        "count": stats.pending,
        "listeners": state.listeners.listener_count(),
        "stats": stats,
    }))
}
