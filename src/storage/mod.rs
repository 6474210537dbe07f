//! Storage backend (C3): the capability set every variant must honor
//! identically, per spec §4.3 and §9 ("Backend polymorphism").

pub mod memory;
pub mod postgres;
pub mod redis_kv;

use crate::error::StorageError;
use crate::ids::Handle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A chat as reported by `GetActiveChats` — a snapshot, may race with TTL
/// deletion (spec §4.3 consistency caveats).
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveChat {
    pub chat: Handle,
    pub creator: Handle,
    pub read_only: bool,
    pub ttl_secs: i64,
}

/// A single stored message, oldest-first when read back via `GetHistory`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub message: Handle,
    pub author: Handle,
    pub text: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// The capability set of spec §4.3, common to the in-memory, relational,
/// and key-value variants. All operations must be safe for concurrent
/// invocation; backend I/O must not monopolize a worker thread, hence the
/// async trait.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Makes `session` a known session. Idempotent on re-add.
    async fn add_session(&self, session: Handle);

    /// Insert a new chat created by `creator`. Evicts the oldest chat (and
    /// its messages) if this insert pushes the global count over capacity.
    async fn add_chat(
        &self,
        creator: Handle,
        ttl_secs: i64,
        read_only: bool,
        chat: Handle,
    ) -> Result<(), StorageError>;

    /// Insert a new message authored by `author` into `chat`. Evicts the
    /// oldest message in that chat if this insert pushes its count over
    /// the per-chat cap.
    async fn add_message(
        &self,
        author: Handle,
        chat: Handle,
        message: Handle,
        text: Vec<u8>,
    ) -> Result<(), StorageError>;

    /// Messages in `chat`, oldest first.
    async fn get_history(&self, chat: Handle) -> Result<Vec<StoredMessage>, StorageError>;

    /// Remove `chat` and its messages. Only `requester` being the chat's
    /// creator may do this.
    async fn delete_chat(&self, requester: Handle, chat: Handle) -> Result<(), StorageError>;

    /// Snapshot of all currently-stored chats.
    async fn get_active_chats(&self) -> Vec<ActiveChat>;
}
