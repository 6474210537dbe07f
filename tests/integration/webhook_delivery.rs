use ephemeral_chat::dedup::DedupSet;
use ephemeral_chat::ids::Handle;
use ephemeral_chat::webhook::{WebhookCaller, WebhookConfig};
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scenario 7: webhook delivery. Exercises the consumer-side shape
/// (dedup check → webhook POST → dedup insert on success) directly against
/// a stub HTTP server, since driving the real broker client (C6/C7) end to
/// end requires a live Kafka cluster that this suite does not stand up.
#[tokio::test]
async fn three_chats_each_deliver_exactly_one_webhook_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let caller = WebhookCaller::new(WebhookConfig {
        method: "POST".into(),
        url: format!("{}/hook", server.uri()),
        max_retries: 3,
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    let dedup = DedupSet::new(Duration::from_secs(20));
    let chats: Vec<Handle> = (0..3).map(|_| Handle::new()).collect();

    for &chat in &chats {
        let key = chat.to_string();
        if dedup.is_exist(&key) {
            continue;
        }
        caller.deliver(chat).await.unwrap();
        dedup.add(key);
    }

    // A redelivery burst for the same handles within the dedup window
    // must not cause further POSTs.
    for &chat in &chats {
        let key = chat.to_string();
        assert!(dedup.is_exist(&key));
    }

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);

    let delivered: Vec<String> = received
        .iter()
        .map(|req| {
            let body: Value = serde_json::from_slice(&req.body).unwrap();
            body["chat_uuid"].as_str().unwrap().to_string()
        })
        .collect();
    for chat in &chats {
        assert_eq!(delivered.iter().filter(|d| *d == &chat.to_string()).count(), 1);
    }
}
