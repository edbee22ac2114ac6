//! The typed event model.
//!
//! Inbound activity on the chat network arrives as one [`Event`] value per
//! occurrence. `Event` is a closed tagged enum: the dispatcher routes on
//! [`EventKind`], and handlers match the variant they registered for. Events
//! are immutable once constructed and cheap to clone.
//!
//! # Hierarchy
//!
//! ```text
//! Event
//! ├── GroupJoinRequest   { flag, applicant, group, text, bot }   (request)
//! ├── GroupMemberIncrease { member, group, operator, bot }       (notice)
//! └── PrivateMessage     { sender, content, bot }                (message)
//! ```
//!
//! The transport delivers events at-least-once; anything a handler does must
//! therefore tolerate seeing the same logical event twice. Request-type
//! events carry a [`RequestFlag`] so duplicate resolutions can be suppressed
//! downstream.

use serde::{Deserialize, Serialize};

use crate::message::MessageContent;
use crate::types::{AccountId, Actor, BotId, GroupRef, RequestFlag};

// ============================================================================
// Event kinds
// ============================================================================

/// Tag identifying one event kind, used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Someone applied to join a group (or the bot was invited).
    GroupJoinRequest,
    /// A group gained a member.
    GroupMemberIncrease,
    /// A private message arrived.
    PrivateMessage,
}

impl EventKind {
    /// Returns the human-readable name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::GroupJoinRequest => "request.group_join",
            EventKind::GroupMemberIncrease => "notice.member_increase",
            EventKind::PrivateMessage => "message.private",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Event payloads
// ============================================================================

/// A request to join a group.
///
/// Covers both "a stranger applied to join" and "the bot itself was invited":
/// when `applicant.id` equals the bot's account, the bot is the subject of the
/// request rather than its arbiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupJoinRequest {
    /// Correlation token; resolving this request requires presenting it back.
    pub flag: RequestFlag,
    /// Who wants to join.
    pub applicant: Actor,
    /// The group being joined.
    pub group: GroupRef,
    /// Free-text application message, if the applicant wrote one.
    #[serde(default)]
    pub text: Option<String>,
    /// The bot account this event was delivered to.
    pub bot: BotId,
}

impl GroupJoinRequest {
    /// Whether the bot itself is the subject of this request (invited into
    /// the group) rather than a third-party applicant.
    pub fn is_self_request(&self) -> bool {
        self.bot.is_account(self.applicant.id)
    }
}

/// A group gained a member.
///
/// Follows the corresponding [`GroupJoinRequest`] causally, when there was
/// one; members added by direct invite may have no preceding request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMemberIncrease {
    /// The new member.
    pub member: Actor,
    /// The group that grew.
    pub group: GroupRef,
    /// Who approved or invited, when the transport reports it.
    #[serde(default)]
    pub operator: Option<AccountId>,
    /// The bot account this event was delivered to.
    pub bot: BotId,
}

/// A private message to the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateMessage {
    /// Who sent the message.
    pub sender: Actor,
    /// The message content.
    pub content: MessageContent,
    /// The bot account this event was delivered to.
    pub bot: BotId,
}

// ============================================================================
// Event
// ============================================================================

/// An immutable notification of something that happened on the chat network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// See [`GroupJoinRequest`].
    GroupJoinRequest(GroupJoinRequest),
    /// See [`GroupMemberIncrease`].
    GroupMemberIncrease(GroupMemberIncrease),
    /// See [`PrivateMessage`].
    PrivateMessage(PrivateMessage),
}

impl Event {
    /// Returns the dispatch key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::GroupJoinRequest(_) => EventKind::GroupJoinRequest,
            Event::GroupMemberIncrease(_) => EventKind::GroupMemberIncrease,
            Event::PrivateMessage(_) => EventKind::PrivateMessage,
        }
    }

    /// Returns the human-readable event name.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Returns the bot account this event was delivered to.
    pub fn bot(&self) -> BotId {
        match self {
            Event::GroupJoinRequest(e) => e.bot,
            Event::GroupMemberIncrease(e) => e.bot,
            Event::PrivateMessage(e) => e.bot,
        }
    }

    /// Returns the correlation flag for request-type events.
    pub fn request_flag(&self) -> Option<&RequestFlag> {
        match self {
            Event::GroupJoinRequest(e) => Some(&e.flag),
            _ => None,
        }
    }
}

// ============================================================================
// Decision
// ============================================================================

/// The outcome a handler chooses for a request-type event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Grant the request.
    Accept,
    /// Deny the request.
    Reject {
        /// Reason shown to the applicant, if any.
        reason: Option<String>,
        /// Also add the applicant to the blocklist.
        blocklist: bool,
    },
    /// Leave the request open for a later decision.
    Defer,
}

impl Decision {
    /// Creates a plain rejection with no reason.
    pub fn reject() -> Self {
        Decision::Reject {
            reason: None,
            blocklist: false,
        }
    }

    /// Creates a rejection with a reason.
    pub fn reject_with_reason(reason: impl Into<String>) -> Self {
        Decision::Reject {
            reason: Some(reason.into()),
            blocklist: false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GroupId;

    fn join_request(applicant: i64, bot: i64) -> GroupJoinRequest {
        GroupJoinRequest {
            flag: RequestFlag::new("flag-1"),
            applicant: Actor::new(AccountId::new(applicant), "newcomer"),
            group: GroupRef::new(GroupId::new(20002), "rustaceans"),
            text: Some("hello".into()),
            bot: BotId::new(bot),
        }
    }

    #[test]
    fn test_kind_and_name() {
        let event = Event::GroupJoinRequest(join_request(10001, 555));
        assert_eq!(event.kind(), EventKind::GroupJoinRequest);
        assert_eq!(event.name(), "request.group_join");
        assert_eq!(event.bot(), BotId::new(555));
        assert_eq!(event.request_flag().unwrap().as_str(), "flag-1");
    }

    #[test]
    fn test_non_request_has_no_flag() {
        let event = Event::GroupMemberIncrease(GroupMemberIncrease {
            member: Actor::new(AccountId::new(10001), "newcomer"),
            group: GroupRef::new(GroupId::new(20002), "rustaceans"),
            operator: None,
            bot: BotId::new(555),
        });
        assert!(event.request_flag().is_none());
        assert_eq!(event.kind(), EventKind::GroupMemberIncrease);
    }

    #[test]
    fn test_self_request_detection() {
        assert!(!join_request(10001, 555).is_self_request());
        assert!(join_request(555, 555).is_self_request());
    }

    #[test]
    fn test_event_serde_round_trip() {
        let event = Event::GroupJoinRequest(join_request(10001, 555));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""kind":"group_join_request""#));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_join_request_text_defaults_to_none() {
        let json = r#"{
            "flag": "flag-9",
            "applicant": {"id": 1, "nickname": "n"},
            "group": {"id": 2, "name": "g"},
            "bot": 3
        }"#;
        let req: GroupJoinRequest = serde_json::from_str(json).unwrap();
        assert!(req.text.is_none());
    }

    #[test]
    fn test_decision_constructors() {
        assert_eq!(
            Decision::reject(),
            Decision::Reject {
                reason: None,
                blocklist: false
            }
        );
        assert_eq!(
            Decision::reject_with_reason("spam"),
            Decision::Reject {
                reason: Some("spam".into()),
                blocklist: false
            }
        );
    }
}
