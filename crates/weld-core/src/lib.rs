//! # Weld Core
//!
//! Foundation types for the weld event-correlation core.
//!
//! Weld is the event dispatch and correlation kernel of a chat-bot automation
//! framework: it routes typed events to registered handlers, bridges
//! request-type events to their later, causally-related follow-up events, and
//! guarantees that each request is resolved at most once.
//!
//! This crate holds the pieces every other layer builds on:
//!
//! - **Identity types**: [`AccountId`], [`GroupId`], [`BotId`], [`MessageId`],
//!   and the opaque correlation token [`RequestFlag`]
//! - **Event model**: the [`Event`] enum and its per-kind payloads
//!   ([`GroupJoinRequest`], [`GroupMemberIncrease`], [`PrivateMessage`])
//! - **Message content**: immutable segment sequences built via
//!   [`MessageBuilder`]
//! - **Capabilities**: the outbound traits handlers call ([`MessageSender`],
//!   [`RequestResolver`]) and the type-keyed [`CapabilityRegistry`] they are
//!   resolved from
//! - **Errors**: [`TransportError`], [`HandlerError`], [`ResolveError`]
//!
//! ## Data Flow
//!
//! ```text
//! ┌───────────┐     ┌────────────┐     ┌───────────┐
//! │ Transport │────▶│ Dispatcher │────▶│  Handler  │──▶ capabilities
//! │ (inbound) │     │ (framework)│────▶│  Handler  │    (sender, resolver)
//! └───────────┘     └────────────┘────▶│  Handler  │
//!                                      └───────────┘
//! ```
//!
//! The dispatcher itself lives in `weld-framework`; transports and process
//! bootstrap live in `weld-runtime` and the application.

pub mod capability;
pub mod error;
pub mod event;
pub mod message;
pub mod types;

pub use capability::{CapabilityRegistry, MessageSender, RequestResolver};
pub use error::{
    HandlerError, HandlerResult, ResolveError, ResolveResult, TransportError, TransportResult,
};
pub use event::{Decision, Event, EventKind, GroupJoinRequest, GroupMemberIncrease, PrivateMessage};
pub use message::{MessageBuilder, MessageContent, Segment};
pub use types::{AccountId, Actor, BotId, GroupId, GroupRef, MessageId, RequestFlag};

/// Prelude for common imports.
pub mod prelude {
    pub use super::capability::{CapabilityRegistry, MessageSender, RequestResolver};
    pub use super::error::{HandlerError, ResolveError, TransportError};
    pub use super::event::{Decision, Event, EventKind};
    pub use super::message::{MessageBuilder, MessageContent};
    pub use super::types::{AccountId, Actor, BotId, GroupId, GroupRef, RequestFlag};
}
