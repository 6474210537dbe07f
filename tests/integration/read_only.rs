use super::common::scenario_messenger;
use ephemeral_chat::error::CoreError;

/// Scenario 5: read-only enforcement. A second session's SendMessage
/// against a read-only chat fails with Prohibited and the history is
/// unchanged.
#[tokio::test]
async fn read_only_chat_rejects_non_creator_and_leaves_history_unchanged() {
    let m = scenario_messenger();
    let creator = m.init_session().await;
    let chat = m
        .create_chat(&creator.to_string(), 0, true)
        .await
        .unwrap();
    m.send_message(&creator.to_string(), &chat.to_string(), b"owner msg".to_vec())
        .await
        .unwrap();

    let other = m.init_session().await;
    let err = m
        .send_message(&other.to_string(), &chat.to_string(), b"hello".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Prohibited));

    let history = m.get_history(&chat.to_string()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].text, b"owner msg");
}
