use super::common::scenario_messenger;
use ephemeral_chat::error::CoreError;
use std::time::Duration;

/// Scenario 4: TTL expiry. A chat created with ttl=2 is gone from
/// GetActiveChats and SendMessage against it fails with ChatNotFound,
/// after a 3s wait (well past the 1s scheduling slack spec §8 allows).
#[tokio::test(start_paused = true)]
async fn chat_expires_after_its_ttl_elapses() {
    let m = scenario_messenger();
    let session = m.init_session().await;
    let chat = m.create_chat(&session.to_string(), 2, false).await.unwrap();

    tokio::time::advance(Duration::from_secs(3)).await;
    tokio::task::yield_now().await;

    let active = m.get_active_chats().await;
    assert!(active.iter().all(|c| c.chat != chat));

    let err = m
        .send_message(&session.to_string(), &chat.to_string(), b"late".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ChatNotFound));
}
