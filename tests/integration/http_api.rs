use ephemeral_chat::event_producer::NullEventProducer;
use ephemeral_chat::http_api::{self, AppState};
use ephemeral_chat::messenger::Messenger;
use ephemeral_chat::storage::memory::InMemoryStorage;
use ephemeral_chat::ttl_reaper::TtlReaper;
use rocket::http::Status;
use rocket::local::asynchronous::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn test_client() -> Client {
    let state = AppState {
        messenger: Arc::new(Messenger::new(
            Arc::new(InMemoryStorage::new(5, 3)),
            Arc::new(NullEventProducer),
            Arc::new(TtlReaper::new()),
        )),
        request_timeout: Duration::from_secs(5),
    };
    let rocket = http_api::mount(rocket::build(), state);
    Client::tracked(rocket).await.expect("valid rocket instance")
}

#[tokio::test]
async fn health_reports_ok() {
    let client = test_client().await;
    let response = client.get("/health").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
}

#[tokio::test]
async fn full_http_round_trip() {
    let client = test_client().await;

    let session_resp = client.post("/sessions").dispatch().await;
    assert_eq!(session_resp.status(), Status::Ok);
    let session_body: serde_json::Value = session_resp.into_json().await.unwrap();
    let session = session_body["session"].as_str().unwrap().to_string();

    let chat_resp = client
        .post("/chats")
        .json(&json!({ "session": session, "ttl": 0, "read_only": false }))
        .dispatch()
        .await;
    assert_eq!(chat_resp.status(), Status::Ok);
    let chat_body: serde_json::Value = chat_resp.into_json().await.unwrap();
    let chat = chat_body["chat"].as_str().unwrap().to_string();

    let send_resp = client
        .post(format!("/chats/{chat}/messages"))
        .json(&json!({ "session": session, "text": "hi" }))
        .dispatch()
        .await;
    assert_eq!(send_resp.status(), Status::NoContent);

    let history_resp = client.get(format!("/chats/{chat}/history")).dispatch().await;
    assert_eq!(history_resp.status(), Status::Ok);
    let history: serde_json::Value = history_resp.into_json().await.unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_session_maps_to_bad_request() {
    let client = test_client().await;
    let resp = client
        .post("/chats")
        .json(&json!({ "session": "garbage", "ttl": 0, "read_only": false }))
        .dispatch()
        .await;
    assert_eq!(resp.status(), Status::BadRequest);
}
