use super::common::scenario_messenger;
use ephemeral_chat::error::CoreError;

/// Scenario 6: a malformed session handle is rejected before the backend
/// is touched; the active-chat count is unaffected.
#[tokio::test]
async fn malformed_session_handle_is_rejected() {
    let m = scenario_messenger();
    let before = m.get_active_chats().await.len();

    let err = m
        .create_chat("siwroieqrw-214124-wwrwrr-2222", 0, false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidSession));

    assert_eq!(m.get_active_chats().await.len(), before);
}
