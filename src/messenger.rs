//! Messenger core (C5): the thin coordinator described in spec §4.5.
//!
//! Grounded in `server/internal/service/messenger/messenger.go`: validate
//! handles, delegate to the backend, translate its errors, hand TTL>0 chats
//! to the reaper, and publish a "chat created" event on success. Unlike the
//! original, nothing here is a gRPC service method — this is a plain struct
//! consumed by whatever transport binary is fronting it (spec §1 keeps the
//! transport out of scope).

use crate::error::CoreError;
use crate::event_producer::EventProducer;
use crate::ids::{Handle, InvalidHandle};
use crate::storage::{ActiveChat, Storage, StoredMessage};
use crate::ttl_reaper::TtlReaper;
use std::sync::Arc;
use tracing::instrument;

pub struct Messenger {
    backend: Arc<dyn Storage>,
    producer: Arc<dyn EventProducer>,
    reaper: Arc<TtlReaper>,
}

impl Messenger {
    pub fn new(
        backend: Arc<dyn Storage>,
        producer: Arc<dyn EventProducer>,
        reaper: Arc<TtlReaper>,
    ) -> Self {
        Self {
            backend,
            producer,
            reaper,
        }
    }

    #[instrument(skip(self))]
    pub async fn init_session(&self) -> Handle {
        let session = Handle::new();
        self.backend.add_session(session).await;
        session
    }

    /// Negative TTLs are accepted and treated identically to 0 (spec
    /// GLOSSARY: "TTL"), but observability (C9's histogram) clamps them to 0.
    #[instrument(skip(self, session))]
    pub async fn create_chat(
        &self,
        session: &str,
        ttl_secs: i64,
        read_only: bool,
    ) -> Result<Handle, CoreError> {
        let session = parse_session(session)?;
        let chat = Handle::new();

        self.backend
            .add_chat(session, ttl_secs, read_only, chat)
            .await
            .map_err(CoreError::from_add_chat)?;

        if ttl_secs > 0 {
            self.reaper
                .schedule(session, chat, ttl_secs as u64, Arc::clone(&self.backend));
        }

        self.producer.publish(chat).await;

        Ok(chat)
    }

    #[instrument(skip(self, session, text))]
    pub async fn send_message(
        &self,
        session: &str,
        chat: &str,
        text: Vec<u8>,
    ) -> Result<(), CoreError> {
        let session = parse_session(session)?;
        let chat = parse_chat(chat)?;
        let message = Handle::new();

        self.backend
            .add_message(session, chat, message, text)
            .await
            .map_err(CoreError::from_add_message)
    }

    #[instrument(skip(self))]
    pub async fn get_history(&self, chat: &str) -> Result<Vec<StoredMessage>, CoreError> {
        let chat = parse_chat(chat)?;
        self.backend
            .get_history(chat)
            .await
            .map_err(CoreError::from_chat_lookup)
    }

    #[instrument(skip(self))]
    pub async fn get_active_chats(&self) -> Vec<ActiveChat> {
        self.backend.get_active_chats().await
    }
}

fn parse_session(raw: &str) -> Result<Handle, CoreError> {
    Handle::parse(raw).map_err(|_: InvalidHandle| CoreError::InvalidSession)
}

fn parse_chat(raw: &str) -> Result<Handle, CoreError> {
    Handle::parse(raw).map_err(|_: InvalidHandle| CoreError::InvalidChat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_producer::NullEventProducer;
    use crate::storage::memory::InMemoryStorage;

    fn messenger() -> Messenger {
        Messenger::new(
            Arc::new(InMemoryStorage::new(5, 3)),
            Arc::new(NullEventProducer),
            Arc::new(TtlReaper::new()),
        )
    }

    #[tokio::test]
    async fn invalid_session_is_rejected_before_backend_call() {
        let m = messenger();
        let err = m.create_chat("not-a-handle", 0, false).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidSession));
        assert!(m.get_active_chats().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_session_maps_to_user_does_not_exist() {
        let m = messenger();
        let err = m
            .create_chat(&Handle::new().to_string(), 0, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UserDoesNotExist));
    }

    #[tokio::test]
    async fn full_round_trip() {
        let m = messenger();
        let session = m.init_session().await;
        let chat = m
            .create_chat(&session.to_string(), 0, false)
            .await
            .unwrap();
        m.send_message(&session.to_string(), &chat.to_string(), b"hi".to_vec())
            .await
            .unwrap();
        let history = m.get_history(&chat.to_string()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, b"hi");
    }

    #[tokio::test]
    async fn invalid_chat_handle_on_send_message() {
        let m = messenger();
        let session = m.init_session().await;
        let err = m
            .send_message(&session.to_string(), "garbage", b"hi".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidChat));
    }
}
