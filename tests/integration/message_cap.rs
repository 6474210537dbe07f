use super::common::scenario_messenger;

/// Scenario 3: message cap. MaxChatSize=5; sending six messages leaves the
/// five newest, oldest-first.
#[tokio::test]
async fn message_cap_keeps_newest_five_oldest_first() {
    let m = scenario_messenger();
    let session = m.init_session().await;
    let chat = m.create_chat(&session.to_string(), 0, false).await.unwrap();

    for text in ["1", "2", "3", "4", "5", "6"] {
        m.send_message(&session.to_string(), &chat.to_string(), text.as_bytes().to_vec())
            .await
            .unwrap();
    }

    let history = m.get_history(&chat.to_string()).await.unwrap();
    let texts: Vec<String> = history
        .iter()
        .map(|msg| String::from_utf8(msg.text.clone()).unwrap())
        .collect();
    assert_eq!(texts, vec!["2", "3", "4", "5", "6"]);
}
