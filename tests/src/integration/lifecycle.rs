//! # Lifecycle
//!
//! Start binds and serves; stop refuses new work, drains in-flight calls, and
//! gives up on them only when a drain timeout is configured.

#[cfg(test)]
mod tests {
    use super::super::support::{channel_engine, local_config, next_envelope, TestBridge, WAIT};
    use http_bridge::{BridgeError, HttpBridge, ServerTransport};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn test_start_serves_and_stop_refuses() {
        let t = TestBridge::start_default().await;
        assert_eq!(t.bridge.local_addr(), Some(t.addr));
        assert_eq!(t.get("/").await["status"], "MCP server is running");

        assert!(matches!(t.bridge.start().await, Err(BridgeError::AlreadyStarted)));

        t.stop().await;
        assert!(!t.bridge.is_running());

        let refused = reqwest::Client::new().get(t.url("/")).send().await;
        assert!(refused.is_err());

        // Second stop is a no-op
        t.stop().await;
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let bridge = HttpBridge::new(local_config()).unwrap();
        bridge.stop().await.unwrap();
        assert!(!bridge.is_running());
    }

    #[tokio::test]
    async fn test_stop_drains_in_flight_call() {
        let t = TestBridge::start_default().await;
        let (engine, mut envelopes) = channel_engine();
        t.bridge.attach(engine);

        let call = tokio::spawn({
            let client = t.client.clone();
            let url = t.url("/");
            async move {
                let response = client
                    .post(url)
                    .json(&json!({"method": "ping"}))
                    .send()
                    .await
                    .unwrap();
                (response.status().as_u16(), response.json::<serde_json::Value>().await.unwrap())
            }
        });
        let envelope = next_envelope(&mut envelopes).await;

        let stopping = tokio::spawn({
            let bridge = Arc::clone(&t.bridge);
            async move { bridge.stop().await }
        });

        sleep(Duration::from_millis(100)).await;
        assert!(!stopping.is_finished());
        assert_eq!(t.bridge.registry().pending_count(), 1);

        let reply = json!({"result": "drained", "correlationId": envelope.correlation_id()});
        t.bridge.send(&reply.to_string()).await;

        let (status, body) = timeout(WAIT, call).await.unwrap().unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, json!({"result": "drained"}));

        timeout(WAIT, stopping).await.unwrap().unwrap().unwrap();
        assert!(!t.bridge.is_running());
    }

    #[tokio::test]
    async fn test_drain_timeout_releases_stuck_calls() {
        let mut config = local_config();
        config.timeouts.drain = Some(Duration::from_millis(150));
        let t = TestBridge::start(config).await;
        let (engine, mut envelopes) = channel_engine();
        t.bridge.attach(engine);

        let call = tokio::spawn({
            let client = t.client.clone();
            let url = t.url("/");
            async move {
                client
                    .post(url)
                    .json(&json!({"method": "never-answered"}))
                    .send()
                    .await
                    .map(|r| r.status().as_u16())
            }
        });
        next_envelope(&mut envelopes).await;

        timeout(WAIT, t.bridge.stop()).await.unwrap().unwrap();
        assert_eq!(t.bridge.registry().pending_count(), 0);
        assert_eq!(t.bridge.registry().snapshot().released, 1);

        // Released callers get a server fault rather than hanging
        let status = timeout(WAIT, call).await.unwrap().unwrap().unwrap();
        assert_eq!(status, 500);
    }
}
