//! Identifier service (C1): mints and parses the opaque 128-bit handles used
//! for sessions, chats, and messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An opaque, unguessable 128-bit handle in canonical hyphenated textual form.
///
/// Equality is textual (delegates to `Uuid`'s byte equality). Parsing only
/// accepts the canonical form; anything else is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(Uuid);

impl Handle {
    /// Mint a new handle from a cryptographically strong random source.
    pub fn new() -> Self {
        Handle(Uuid::new_v4())
    }

    /// Parse the canonical textual form. Rejects any other representation
    /// `Uuid::parse_str` would otherwise accept (simple, braced, URN).
    pub fn parse(s: &str) -> Result<Self, InvalidHandle> {
        let uuid = Uuid::parse_str(s).map_err(|_| InvalidHandle)?;
        if uuid.hyphenated().to_string() != s {
            return Err(InvalidHandle);
        }
        Ok(Handle(uuid))
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input text failed to parse as a canonical 128-bit handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid handle")]
pub struct InvalidHandle;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_consecutive_handles_are_distinct() {
        let a = Handle::new();
        let b = Handle::new();
        assert_ne!(a, b);
    }

    #[test]
    fn handle_round_trips_through_text() {
        let h = Handle::new();
        let parsed = Handle::parse(&h.to_string()).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn garbage_text_is_rejected() {
        assert!(Handle::parse("siwroieqrw-214124-wwrwrr-2222").is_err());
        assert!(Handle::parse("").is_err());
    }

    #[test]
    fn non_canonical_uuid_forms_are_rejected() {
        // Simple (no hyphens).
        assert!(Handle::parse("550e8400e29b41d4a716446655440000").is_err());
        // Braced.
        assert!(Handle::parse("{550e8400-e29b-41d4-a716-446655440000}").is_err());
        // URN.
        assert!(Handle::parse("urn:uuid:550e8400-e29b-41d4-a716-446655440000").is_err());
        // Canonical hyphenated form is accepted.
        assert!(Handle::parse("550e8400-e29b-41d4-a716-446655440000").is_ok());
    }
}
