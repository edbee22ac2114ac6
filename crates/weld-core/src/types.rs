//! Identity types shared across the framework.
//!
//! Chat networks address everything by numeric ids. Keeping each id space in
//! its own newtype prevents a group id from being passed where an account id
//! is expected, at zero runtime cost.
//!
//! [`RequestFlag`] is the one deliberately opaque type here: it is the
//! correlation token that identifies a single request-type event, and its
//! equality/hash semantics are the sole basis for at-most-once resolution
//! tracking.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Numeric identity newtypes
// ============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw id.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw id.
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Identifies one account (user) on the chat network.
    AccountId
);

id_type!(
    /// Identifies one group (chat room) on the chat network.
    GroupId
);

id_type!(
    /// Identifies the bot account an event was delivered to.
    ///
    /// Events carry this so handlers can distinguish "someone did something"
    /// from "the bot itself is the subject" (e.g. the bot being invited into
    /// a group rather than a stranger applying to join).
    BotId
);

id_type!(
    /// Identifies a message accepted by the transport for delivery.
    MessageId
);

impl BotId {
    /// Whether the given account is this bot.
    pub fn is_account(self, account: AccountId) -> bool {
        self.0 == account.value()
    }
}

// ============================================================================
// RequestFlag — opaque correlation token
// ============================================================================

/// Opaque correlation token identifying one request-type event.
///
/// The transport mints one flag per request; resolving the request (accept or
/// reject) requires presenting the flag back. Flags compare by their full
/// token value and are the sole key for duplicate-resolution tracking, so two
/// deliveries of the same logical request carry equal flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestFlag(String);

impl RequestFlag {
    /// Wraps a transport-issued token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Actor / GroupRef — identity plus display name
// ============================================================================

/// An account together with its display name, as events carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Account id.
    pub id: AccountId,
    /// Display name (nickname) at the time of the event.
    #[serde(default)]
    pub nickname: String,
}

impl Actor {
    /// Creates an actor.
    pub fn new(id: AccountId, nickname: impl Into<String>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
        }
    }
}

/// A group together with its display name, as events carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    /// Group id.
    pub id: GroupId,
    /// Group name at the time of the event.
    #[serde(default)]
    pub name: String,
}

impl GroupRef {
    /// Creates a group reference.
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_equality_and_display() {
        let a = AccountId::new(10001);
        let b = AccountId::from(10001);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "10001");
        assert_eq!(a.value(), 10001);
    }

    #[test]
    fn test_bot_is_account() {
        let bot = BotId::new(555);
        assert!(bot.is_account(AccountId::new(555)));
        assert!(!bot.is_account(AccountId::new(556)));
    }

    #[test]
    fn test_request_flag_semantics() {
        let a = RequestFlag::new("flag-123");
        let b = RequestFlag::new(String::from("flag-123"));
        let c = RequestFlag::new("flag-124");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "flag-123");

        use std::collections::HashSet;
        let mut seen = HashSet::new();
        assert!(seen.insert(a));
        assert!(!seen.insert(b));
        assert!(seen.insert(c));
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = GroupId::new(20002);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "20002");
        let back: GroupId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
