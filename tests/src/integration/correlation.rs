//! # Correlation Flows
//!
//! Calls enter over HTTP, fan out to listeners, and replies come back through
//! `ServerTransport::send`. Every caller must get exactly its own reply.

#[cfg(test)]
mod tests {
    use super::super::support::{
        channel_engine, failing_listener, local_config, next_envelope, Recorder, TestBridge,
        WAIT,
    };
    use bridge_runtime::PingEngine;
    use http_bridge::{RouteOutcome, ServerTransport};
    use serde_json::json;
    use std::collections::HashSet;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_out_of_order_replies_reach_their_callers() {
        let t = TestBridge::start_default().await;
        let (engine, mut envelopes) = channel_engine();
        t.bridge.attach(engine);

        let call_a = tokio::spawn({
            let client = t.client.clone();
            let url = t.url("/");
            async move {
                client
                    .post(url)
                    .json(&json!({"method": "foo"}))
                    .send()
                    .await
                    .unwrap()
                    .json::<serde_json::Value>()
                    .await
                    .unwrap()
            }
        });
        let envelope_a = next_envelope(&mut envelopes).await;

        let call_b = tokio::spawn({
            let client = t.client.clone();
            let url = t.url("/");
            async move {
                client
                    .post(url)
                    .json(&json!({"method": "bar"}))
                    .send()
                    .await
                    .unwrap()
                    .json::<serde_json::Value>()
                    .await
                    .unwrap()
            }
        });
        let envelope_b = next_envelope(&mut envelopes).await;

        assert_eq!(envelope_a.method(), "foo");
        assert_eq!(envelope_b.method(), "bar");
        assert_ne!(envelope_a.correlation_id(), envelope_b.correlation_id());

        // B is answered first
        let reply_b = json!({"result": "for bar", "correlationId": envelope_b.correlation_id()});
        assert_eq!(t.bridge.send(&reply_b.to_string()).await, RouteOutcome::Delivered);
        let body_b = timeout(WAIT, call_b).await.unwrap().unwrap();
        assert_eq!(body_b, json!({"result": "for bar"}));
        assert!(!call_a.is_finished());

        let reply_a = json!({"result": "for foo", "correlationId": envelope_a.correlation_id()});
        assert_eq!(t.bridge.send(&reply_a.to_string()).await, RouteOutcome::Delivered);
        let body_a = timeout(WAIT, call_a).await.unwrap().unwrap();
        assert_eq!(body_a, json!({"result": "for foo"}));

        t.stop().await;
    }

    #[tokio::test]
    async fn test_concurrent_calls_get_unique_identities() {
        let t = TestBridge::start_default().await;
        let recorder = Recorder::new();
        t.bridge.attach(recorder.clone());
        PingEngine::connect(&t.transport());

        let calls: Vec<_> = (0..64)
            .map(|i| {
                let client = t.client.clone();
                let url = t.url("/");
                tokio::spawn(async move {
                    client
                        .post(url)
                        .json(&json!({"jsonrpc": "2.0", "id": i, "method": "ping"}))
                        .send()
                        .await
                        .unwrap()
                        .json::<serde_json::Value>()
                        .await
                        .unwrap()
                })
            })
            .collect();

        for (i, call) in calls.into_iter().enumerate() {
            let body = timeout(WAIT, call).await.unwrap().unwrap();
            assert_eq!(body["id"], i);
            assert_eq!(body["result"], json!({}));
            assert!(body.get("correlationId").is_none());
        }

        let seen = recorder.seen();
        let unique: HashSet<_> = seen.iter().copied().collect();
        assert_eq!(seen.len(), 64);
        assert_eq!(unique.len(), 64);
        assert_eq!(t.bridge.registry().pending_count(), 0);

        t.stop().await;
    }

    #[tokio::test]
    async fn test_fan_out_and_detach() {
        let t = TestBridge::start_default().await;
        let first = Recorder::new();
        let second = Recorder::new();
        let third = Recorder::new();
        t.bridge.attach(first.clone());
        let second_id = t.bridge.attach(second.clone());
        t.bridge.attach(third.clone());
        PingEngine::connect(&t.transport());

        let (status, _) = t.call(&json!({"method": "ping"})).await;
        assert_eq!(status, 200);
        assert_eq!(first.seen().len(), 1);
        assert_eq!(second.seen().len(), 1);
        assert_eq!(third.seen().len(), 1);

        assert!(t.bridge.detach(&second_id));
        assert!(!t.bridge.detach(&second_id));

        let (status, _) = t.call(&json!({"method": "ping"})).await;
        assert_eq!(status, 200);
        assert_eq!(first.seen().len(), 2);
        assert_eq!(second.seen().len(), 1);
        assert_eq!(third.seen().len(), 2);

        t.stop().await;
    }

    #[tokio::test]
    async fn test_stray_replies_are_discarded() {
        let t = TestBridge::start_default().await;
        PingEngine::connect(&t.transport());

        assert_eq!(
            t.bridge.send(r#"{"result":{},"correlationId":999}"#).await,
            RouteOutcome::Unmatched
        );
        assert_eq!(t.bridge.send(r#"{"result":{}}"#).await, RouteOutcome::Untagged);
        assert_eq!(t.bridge.send("not json at all").await, RouteOutcome::Unparseable);

        // Nothing above disturbs a real call
        let (status, body) = t.call(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({"jsonrpc": "2.0", "id": 1, "result": {}}));

        let pending = t.get("/pending").await;
        assert_eq!(pending["stats"]["unmatched"], 1);

        t.stop().await;
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_starve_engine() {
        let t = TestBridge::start_default().await;
        t.bridge.attach(failing_listener());
        PingEngine::connect(&t.transport());

        let (status, body) = t.call(&json!({"id": 5, "method": "tools/list"})).await;
        assert_eq!(status, 200);
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["id"], 5);

        t.stop().await;
    }

    #[tokio::test]
    async fn test_caller_identity_field_is_overwritten() {
        let t = TestBridge::start(local_config()).await;
        let (engine, mut envelopes) = channel_engine();
        t.bridge.attach(engine);

        let call = tokio::spawn({
            let client = t.client.clone();
            let url = t.url("/");
            async move {
                client
                    .post(url)
                    .json(&json!({"method": "ping", "correlationId": 424242}))
                    .send()
                    .await
                    .unwrap()
                    .status()
                    .as_u16()
            }
        });

        let envelope = next_envelope(&mut envelopes).await;
        assert_ne!(envelope.correlation_id().as_u64(), 424242);
        assert_eq!(
            envelope.payload()["correlationId"],
            envelope.correlation_id().as_u64()
        );

        // The caller's own value resolves nothing
        assert_eq!(
            t.bridge.send(r#"{"correlationId":424242}"#).await,
            RouteOutcome::Unmatched
        );
        let reply = json!({"ok": true, "correlationId": envelope.correlation_id()});
        t.bridge.send(&reply.to_string()).await;
        assert_eq!(timeout(WAIT, call).await.unwrap().unwrap(), 200);

        t.stop().await;
    }
}
