use super::common::scenario_messenger;
use ephemeral_chat::ids::Handle;

/// Scenario 1: InitSession → handle parses.
#[tokio::test]
async fn init_session_yields_a_parseable_handle() {
    let m = scenario_messenger();
    let session = m.init_session().await;
    assert!(Handle::parse(&session.to_string()).is_ok());
}

/// Scenario 2: CreateChat returns a parseable handle and the chat shows up
/// in GetActiveChats exactly once.
#[tokio::test]
async fn create_chat_returns_parseable_handle_and_is_active() {
    let m = scenario_messenger();
    let session = m.init_session().await;

    let chat = m
        .create_chat(&session.to_string(), -1, true)
        .await
        .unwrap();
    assert!(Handle::parse(&chat.to_string()).is_ok());

    let active = m.get_active_chats().await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].chat, chat);
}
