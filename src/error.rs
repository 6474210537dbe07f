//! Error taxonomy (C12 / spec §7), independent of transport mapping.
//!
//! Grounded in `server/internal/service/messenger/errors.go` (the domain
//! taxonomy) and `server/internal/serviceErrors/serviceErrors.go` (the
//! transport-status mapping), translated from Go sentinel errors to a
//! `thiserror` enum the way the rest of the ecosystem expresses error
//! taxonomies.

use thiserror::Error;

/// Backend-layer errors (C3). The Messenger (C5) translates these into
/// `CoreError`; anything not explicitly handled becomes `Internal`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("chat not found")]
    ChatNotFound,
    #[error("user does not exist")]
    UserUnknown,
    #[error("prohibited: only the creator may perform this action")]
    Prohibited,
    #[error("backend error: {0}")]
    Backend(String),
}

/// The core's domain error taxonomy (spec §7).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid session handle")]
    InvalidSession,
    #[error("invalid chat handle")]
    InvalidChat,
    #[error("user does not exist")]
    UserDoesNotExist,
    #[error("chat not found")]
    ChatNotFound,
    #[error("prohibited")]
    Prohibited,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Map a backend-layer `AddChat` failure onto the core taxonomy
    /// (spec §4.5): `NotFound` (of the session) becomes `UserDoesNotExist`.
    pub fn from_add_chat(err: StorageError) -> Self {
        match err {
            StorageError::UserUnknown => CoreError::UserDoesNotExist,
            other => CoreError::Internal(other.to_string()),
        }
    }

    /// Map a backend-layer `AddMessage` failure onto the core taxonomy.
    pub fn from_add_message(err: StorageError) -> Self {
        match err {
            StorageError::ChatNotFound => CoreError::ChatNotFound,
            StorageError::UserUnknown => CoreError::UserDoesNotExist,
            StorageError::Prohibited => CoreError::Prohibited,
            other => CoreError::Internal(other.to_string()),
        }
    }

    /// Map a backend-layer `GetHistory`/`DeleteChat` failure onto the core
    /// taxonomy.
    pub fn from_chat_lookup(err: StorageError) -> Self {
        match err {
            StorageError::ChatNotFound => CoreError::ChatNotFound,
            StorageError::Prohibited => CoreError::Prohibited,
            other => CoreError::Internal(other.to_string()),
        }
    }
}

/// Webhook caller errors (C8, spec §7).
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook delivery retries exceeded")]
    RetriesExceeded,
    #[error("request construction error: {0}")]
    RequestConstruction(String),
}
