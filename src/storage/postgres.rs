//! Relational storage backend (C3 variant), backed by Postgres via `sqlx`.
//!
//! Grounded in `server/internal/repository/postgres/postgres.go`: a
//! `users`/`chats`/`messages` schema, with `AddChat`/`AddMessage` wrapped
//! in one transaction that verifies referenced rows, inserts, counts, and
//! (if over capacity) deletes the oldest rows by `created_at` — translated
//! from GORM transactions to `sqlx::query!` calls against an explicit
//! schema, the way the teacher's `db.rs` issues its own batched SQL
//! instead of reaching for an ORM.

use super::{ActiveChat, Storage, StoredMessage};
use crate::error::StorageError;
use crate::ids::Handle;
use async_trait::async_trait;
use sqlx::{PgPool, Row};

pub struct PostgresStorage {
    pool: PgPool,
    max_chats: i64,
    max_chat_size: i64,
}

impl PostgresStorage {
    /// Connect and run migrations. `fresh_start` drops and recreates the
    /// schema, mirroring the original's `FreshStart` flag.
    pub async fn connect(
        dsn: &str,
        max_chats: i64,
        max_chat_size: i64,
        fresh_start: bool,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(dsn).await?;
        if fresh_start {
            sqlx::query("DROP TABLE IF EXISTS messages, chats, users CASCADE")
                .execute(&pool)
                .await?;
        }
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                session_uuid UUID PRIMARY KEY
            );
            CREATE TABLE IF NOT EXISTS chats (
                chat_uuid UUID PRIMARY KEY,
                session_uuid UUID NOT NULL REFERENCES users(session_uuid),
                read_only BOOLEAN NOT NULL,
                ttl BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            CREATE TABLE IF NOT EXISTS messages (
                message_uuid UUID PRIMARY KEY,
                chat_uuid UUID NOT NULL REFERENCES chats(chat_uuid) ON DELETE CASCADE,
                session_uuid UUID NOT NULL,
                text BYTEA NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            CREATE INDEX IF NOT EXISTS idx_messages_chat_created
                ON messages(chat_uuid, created_at);
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            max_chats,
            max_chat_size,
        })
    }

    fn backend_err(err: sqlx::Error) -> StorageError {
        StorageError::Backend(err.to_string())
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn add_session(&self, session: Handle) {
        let _ = sqlx::query("INSERT INTO users (session_uuid) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(session.to_string())
            .execute(&self.pool)
            .await;
    }

    async fn add_chat(
        &self,
        creator: Handle,
        ttl_secs: i64,
        read_only: bool,
        chat: Handle,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(Self::backend_err)?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE session_uuid = $1)")
            .bind(creator.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(Self::backend_err)?;
        if !exists {
            tx.rollback().await.ok();
            return Err(StorageError::UserUnknown);
        }

        sqlx::query(
            "INSERT INTO chats (chat_uuid, session_uuid, read_only, ttl) VALUES ($1, $2, $3, $4)",
        )
        .bind(chat.to_string())
        .bind(creator.to_string())
        .bind(read_only)
        .bind(ttl_secs)
        .execute(&mut *tx)
        .await
        .map_err(Self::backend_err)?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats")
            .fetch_one(&mut *tx)
            .await
            .map_err(Self::backend_err)?;

        if count > self.max_chats {
            let excess = count - self.max_chats;
            sqlx::query(
                "DELETE FROM chats WHERE chat_uuid IN (
                    SELECT chat_uuid FROM chats ORDER BY created_at ASC LIMIT $1
                )",
            )
            .bind(excess)
            .execute(&mut *tx)
            .await
            .map_err(Self::backend_err)?;
        }

        tx.commit().await.map_err(Self::backend_err)?;
        Ok(())
    }

    async fn add_message(
        &self,
        author: Handle,
        chat: Handle,
        message: Handle,
        text: Vec<u8>,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(Self::backend_err)?;

        let chat_row = sqlx::query("SELECT session_uuid, read_only FROM chats WHERE chat_uuid = $1")
            .bind(chat.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(Self::backend_err)?;
        let Some(chat_row) = chat_row else {
            tx.rollback().await.ok();
            return Err(StorageError::ChatNotFound);
        };
        let chat_creator: String = chat_row.get("session_uuid");
        let read_only: bool = chat_row.get("read_only");

        let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE session_uuid = $1)")
            .bind(author.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(Self::backend_err)?;
        if !user_exists {
            tx.rollback().await.ok();
            return Err(StorageError::UserUnknown);
        }

        if read_only && chat_creator != author.to_string() {
            tx.rollback().await.ok();
            return Err(StorageError::Prohibited);
        }

        sqlx::query(
            "INSERT INTO messages (message_uuid, chat_uuid, session_uuid, text) VALUES ($1, $2, $3, $4)",
        )
        .bind(message.to_string())
        .bind(chat.to_string())
        .bind(author.to_string())
        .bind(&text)
        .execute(&mut *tx)
        .await
        .map_err(Self::backend_err)?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE chat_uuid = $1")
            .bind(chat.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(Self::backend_err)?;

        if count > self.max_chat_size {
            let excess = count - self.max_chat_size;
            sqlx::query(
                "DELETE FROM messages WHERE message_uuid IN (
                    SELECT message_uuid FROM messages WHERE chat_uuid = $1
                    ORDER BY created_at ASC LIMIT $2
                )",
            )
            .bind(chat.to_string())
            .bind(excess)
            .execute(&mut *tx)
            .await
            .map_err(Self::backend_err)?;
        }

        tx.commit().await.map_err(Self::backend_err)?;
        Ok(())
    }

    async fn get_history(&self, chat: Handle) -> Result<Vec<StoredMessage>, StorageError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chats WHERE chat_uuid = $1)")
            .bind(chat.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(Self::backend_err)?;
        if !exists {
            return Err(StorageError::ChatNotFound);
        }

        let rows = sqlx::query(
            "SELECT message_uuid, session_uuid, text, created_at FROM messages
             WHERE chat_uuid = $1 ORDER BY created_at ASC",
        )
        .bind(chat.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(Self::backend_err)?;

        rows.into_iter()
            .map(|row| {
                let message_uuid: String = row.get("message_uuid");
                let session_uuid: String = row.get("session_uuid");
                Ok(StoredMessage {
                    message: Handle::parse(&message_uuid)
                        .map_err(|_| StorageError::Backend("corrupt message uuid".into()))?,
                    author: Handle::parse(&session_uuid)
                        .map_err(|_| StorageError::Backend("corrupt session uuid".into()))?,
                    text: row.get("text"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    async fn delete_chat(&self, requester: Handle, chat: Handle) -> Result<(), StorageError> {
        let row = sqlx::query("SELECT session_uuid FROM chats WHERE chat_uuid = $1")
            .bind(chat.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::backend_err)?;
        let Some(row) = row else {
            return Err(StorageError::ChatNotFound);
        };
        let creator: String = row.get("session_uuid");
        if creator != requester.to_string() {
            return Err(StorageError::Prohibited);
        }

        sqlx::query("DELETE FROM chats WHERE chat_uuid = $1")
            .bind(chat.to_string())
            .execute(&self.pool)
            .await
            .map_err(Self::backend_err)?;
        Ok(())
    }

    async fn get_active_chats(&self) -> Vec<ActiveChat> {
        let rows = sqlx::query(
            "SELECT chat_uuid, session_uuid, read_only, ttl FROM chats ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default();

        rows.into_iter()
            .filter_map(|row| {
                let chat_uuid: String = row.get("chat_uuid");
                let session_uuid: String = row.get("session_uuid");
                Some(ActiveChat {
                    chat: Handle::parse(&chat_uuid).ok()?,
                    creator: Handle::parse(&session_uuid).ok()?,
                    read_only: row.get("read_only"),
                    ttl_secs: row.get("ttl"),
                })
            })
            .collect()
    }
}
