//! In-memory storage backend (C3 variant).
//!
//! Grounded in `server/internal/repository/inmemory/inmemory.go`: one
//! global bounded map for chats, one bounded map per chat for messages, a
//! session set guarded by a reader/writer lock. Session existence is
//! checked under the session lock and released before the chat map is
//! touched — the same non-atomic shape as the original, preserved per
//! spec §9's "Open question" (no session-removal API is exposed, so the
//! race is benign).
//!
//! Unlike the original, which reaches for an LRU cache and iterates its
//! `Keys()` for history order, this uses `BoundedRecencyMap` directly so
//! eviction is insertion-order without a read-side recency refresh.

use super::{ActiveChat, Storage, StoredMessage};
use crate::error::StorageError;
use crate::ids::Handle;
use crate::recency_map::BoundedRecencyMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

struct ChatRecord {
    creator: Handle,
    ttl_secs: i64,
    read_only: bool,
    messages: Arc<Mutex<BoundedRecencyMap<Handle, StoredMessage>>>,
}

impl Clone for ChatRecord {
    fn clone(&self) -> Self {
        Self {
            creator: self.creator,
            ttl_secs: self.ttl_secs,
            read_only: self.read_only,
            messages: Arc::clone(&self.messages),
        }
    }
}

pub struct InMemoryStorage {
    max_chat_size: usize,
    sessions: RwLock<HashSet<Handle>>,
    chats: RwLock<BoundedRecencyMap<Handle, ChatRecord>>,
}

impl InMemoryStorage {
    pub fn new(max_chat_size: usize, max_chats: usize) -> Self {
        Self {
            max_chat_size,
            sessions: RwLock::new(HashSet::new()),
            chats: RwLock::new(BoundedRecencyMap::new(max_chats)),
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn add_session(&self, session: Handle) {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session);
    }

    async fn add_chat(
        &self,
        creator: Handle,
        ttl_secs: i64,
        read_only: bool,
        chat: Handle,
    ) -> Result<(), StorageError> {
        {
            let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
            if !sessions.contains(&creator) {
                return Err(StorageError::UserUnknown);
            }
        }

        let record = ChatRecord {
            creator,
            ttl_secs,
            read_only,
            messages: Arc::new(Mutex::new(BoundedRecencyMap::new(self.max_chat_size))),
        };
        self.chats
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(chat, record);
        Ok(())
    }

    async fn add_message(
        &self,
        author: Handle,
        chat: Handle,
        message: Handle,
        text: Vec<u8>,
    ) -> Result<(), StorageError> {
        let record = {
            let chats = self.chats.read().unwrap_or_else(|e| e.into_inner());
            chats
                .get(&chat)
                .cloned()
                .ok_or(StorageError::ChatNotFound)?
        };

        {
            let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
            if !sessions.contains(&author) {
                return Err(StorageError::UserUnknown);
            }
        }

        if record.read_only && record.creator != author {
            return Err(StorageError::Prohibited);
        }

        let stored = StoredMessage {
            message,
            author,
            text,
            created_at: Utc::now(),
        };
        record
            .messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(message, stored);
        Ok(())
    }

    async fn get_history(&self, chat: Handle) -> Result<Vec<StoredMessage>, StorageError> {
        let record = {
            let chats = self.chats.read().unwrap_or_else(|e| e.into_inner());
            chats
                .get(&chat)
                .cloned()
                .ok_or(StorageError::ChatNotFound)?
        };

        let messages = record.messages.lock().unwrap_or_else(|e| e.into_inner());
        Ok(messages
            .keys_in_insertion_order()
            .filter_map(|k| messages.get(k).cloned())
            .collect())
    }

    async fn delete_chat(&self, requester: Handle, chat: Handle) -> Result<(), StorageError> {
        let mut chats = self.chats.write().unwrap_or_else(|e| e.into_inner());
        match chats.get(&chat) {
            None => Err(StorageError::ChatNotFound),
            Some(record) if record.creator != requester => Err(StorageError::Prohibited),
            Some(_) => {
                chats.remove(&chat);
                Ok(())
            }
        }
    }

    async fn get_active_chats(&self) -> Vec<ActiveChat> {
        let chats = self.chats.read().unwrap_or_else(|e| e.into_inner());
        chats
            .keys_in_insertion_order()
            .filter_map(|k| {
                chats.get(k).map(|record| ActiveChat {
                    chat: *k,
                    creator: record.creator,
                    read_only: record.read_only,
                    ttl_secs: record.ttl_secs,
                })
            })
            .collect()
    }
}

// StoredMessage needs Clone for the lock-release pattern above.
impl Clone for StoredMessage {
    fn clone(&self) -> Self {
        Self {
            message: self.message,
            author: self.author,
            text: self.text.clone(),
            created_at: self.created_at,
        }
    }
}
