//! Key-value storage backend (C3 variant), backed by Redis.
//!
//! Grounded in `server/internal/repository/redis/redis.go`'s key layout: a
//! `sessions` set, an `active_chats` list holding chat handles in
//! insertion order, per-chat JSON values under `chat:<handle>`, and
//! per-chat `chat:<handle>:messages` lists. Global over-capacity
//! left-pops `active_chats`; per-chat over-capacity trims the message
//! list to the newest `MaxChatSize` entries. The `redis` crate itself is
//! adopted from the Rust ecosystem's standard client, since no example
//! repo in the pack exercises Redis; message/metadata values are
//! serialized with `serde_json`, already used throughout the rest of the
//! crate, rather than a hand-rolled encoding.

use super::{ActiveChat, Storage, StoredMessage};
use crate::error::StorageError;
use crate::ids::Handle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};

pub struct RedisStorage {
    conn: ConnectionManager,
    max_chats: isize,
    max_chat_size: isize,
}

#[derive(Serialize, Deserialize)]
struct ChatMeta {
    creator: Handle,
    read_only: bool,
    ttl_secs: i64,
}

#[derive(Serialize, Deserialize)]
struct MessageEntry {
    message: Handle,
    author: Handle,
    text: Vec<u8>,
    created_at: DateTime<Utc>,
}

fn chat_key(chat: Handle) -> String {
    format!("chat:{chat}")
}

fn messages_key(chat: Handle) -> String {
    format!("chat:{chat}:messages")
}

fn backend_err_json(err: serde_json::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

impl RedisStorage {
    pub async fn connect(
        addr: &str,
        max_chat_size: isize,
        max_chats: isize,
        flush_all: bool,
    ) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(addr)?;
        let mut conn = ConnectionManager::new(client).await?;
        if flush_all {
            let _: () = redis::cmd("FLUSHALL").query_async(&mut conn).await?;
        }
        Ok(Self {
            conn,
            max_chats,
            max_chat_size,
        })
    }

    fn backend_err(err: redis::RedisError) -> StorageError {
        StorageError::Backend(err.to_string())
    }

    async fn load_chat_meta(
        conn: &mut ConnectionManager,
        chat: Handle,
    ) -> Result<Option<ChatMeta>, StorageError> {
        let raw: Option<String> = conn.get(chat_key(chat)).await.map_err(Self::backend_err)?;
        match raw {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(backend_err_json),
        }
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn add_session(&self, session: Handle) {
        let mut conn = self.conn.clone();
        let _: Result<(), _> = conn.sadd("sessions", session.to_string()).await;
    }

    async fn add_chat(
        &self,
        creator: Handle,
        ttl_secs: i64,
        read_only: bool,
        chat: Handle,
    ) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();

        let known: bool = conn
            .sismember("sessions", creator.to_string())
            .await
            .map_err(Self::backend_err)?;
        if !known {
            return Err(StorageError::UserUnknown);
        }

        let meta = ChatMeta {
            creator,
            read_only,
            ttl_secs,
        };
        let serialized = serde_json::to_string(&meta).map_err(backend_err_json)?;
        let _: () = conn
            .set(chat_key(chat), serialized)
            .await
            .map_err(Self::backend_err)?;
        let _: isize = conn
            .rpush("active_chats", chat.to_string())
            .await
            .map_err(Self::backend_err)?;

        let len: isize = conn.llen("active_chats").await.map_err(Self::backend_err)?;
        if len > self.max_chats {
            for _ in 0..(len - self.max_chats) {
                let oldest: Option<String> =
                    conn.lpop("active_chats", None).await.map_err(Self::backend_err)?;
                if let Some(oldest) = oldest {
                    let _: () = conn.del(format!("chat:{oldest}")).await.map_err(Self::backend_err)?;
                    let _: () = conn
                        .del(format!("chat:{oldest}:messages"))
                        .await
                        .map_err(Self::backend_err)?;
                }
            }
        }

        Ok(())
    }

    async fn add_message(
        &self,
        author: Handle,
        chat: Handle,
        message: Handle,
        text: Vec<u8>,
    ) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();

        let meta = Self::load_chat_meta(&mut conn, chat)
            .await?
            .ok_or(StorageError::ChatNotFound)?;

        let known: bool = conn
            .sismember("sessions", author.to_string())
            .await
            .map_err(Self::backend_err)?;
        if !known {
            return Err(StorageError::UserUnknown);
        }

        if meta.read_only && meta.creator != author {
            return Err(StorageError::Prohibited);
        }

        let entry = MessageEntry {
            message,
            author,
            text,
            created_at: Utc::now(),
        };
        let serialized = serde_json::to_string(&entry).map_err(backend_err_json)?;
        let _: isize = conn
            .rpush(messages_key(chat), serialized)
            .await
            .map_err(Self::backend_err)?;

        let len: isize = conn
            .llen(messages_key(chat))
            .await
            .map_err(Self::backend_err)?;
        if len > self.max_chat_size {
            // Trim to the newest MaxChatSize entries.
            let _: () = conn
                .ltrim(messages_key(chat), len - self.max_chat_size, -1)
                .await
                .map_err(Self::backend_err)?;
        }

        Ok(())
    }

    async fn get_history(&self, chat: Handle) -> Result<Vec<StoredMessage>, StorageError> {
        let mut conn = self.conn.clone();
        if Self::load_chat_meta(&mut conn, chat).await?.is_none() {
            return Err(StorageError::ChatNotFound);
        }

        let raw: Vec<String> = conn
            .lrange(messages_key(chat), 0, -1)
            .await
            .map_err(Self::backend_err)?;

        raw.iter()
            .map(|entry| {
                let entry: MessageEntry = serde_json::from_str(entry).map_err(backend_err_json)?;
                Ok(StoredMessage {
                    message: entry.message,
                    author: entry.author,
                    text: entry.text,
                    created_at: entry.created_at,
                })
            })
            .collect()
    }

    async fn delete_chat(&self, requester: Handle, chat: Handle) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let meta = Self::load_chat_meta(&mut conn, chat)
            .await?
            .ok_or(StorageError::ChatNotFound)?;
        if meta.creator != requester {
            return Err(StorageError::Prohibited);
        }

        let _: () = conn.lrem("active_chats", 1, chat.to_string()).await.map_err(Self::backend_err)?;
        let _: () = conn.del(chat_key(chat)).await.map_err(Self::backend_err)?;
        let _: () = conn.del(messages_key(chat)).await.map_err(Self::backend_err)?;
        Ok(())
    }

    async fn get_active_chats(&self) -> Vec<ActiveChat> {
        let mut conn = self.conn.clone();
        let Ok(handles): Result<Vec<String>, _> = conn.lrange("active_chats", 0, -1).await else {
            return Vec::new();
        };

        let mut out = Vec::with_capacity(handles.len());
        for h in handles {
            let Ok(chat) = Handle::parse(&h) else { continue };
            let Ok(Some(meta)) = Self::load_chat_meta(&mut conn, chat).await else {
                continue;
            };
            out.push(ActiveChat {
                chat,
                creator: meta.creator,
                read_only: meta.read_only,
                ttl_secs: meta.ttl_secs,
            });
        }
        out
    }
}
