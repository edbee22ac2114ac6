//! # Weld Framework
//!
//! The dispatch and correlation layer of the weld framework.
//!
//! This crate turns the foundation types from `weld-core` into a working
//! event-processing kernel:
//!
//! - **Handler system** ([`handler`]) — the [`Handler`] trait, the
//!   [`HandlerContext`] handlers receive, and [`handler_fn`] for writing
//!   handlers as async closures
//! - **Dispatcher** ([`dispatcher`]) — an explicit registration table from
//!   event kind to ordered handlers, built once at startup, plus the
//!   [`Dispatcher`] that walks it and aggregates per-handler outcomes
//! - **Pending request store** ([`pending`]) — the key-sharded transient
//!   cache bridging a join request to its later member-increase event
//! - **Response coordinator** ([`coordinator`]) — at-most-once resolution of
//!   request flags against the transport
//! - **Welcome workflow** ([`welcome`]) — the built-in
//!   join-request → member-increase → welcome-message flow
//!
//! ## Dispatch model
//!
//! ```text
//! Event ──▶ Dispatcher ──▶ handlers for Event's kind, in registration order
//!                              │
//!                              ├─ read/write PendingRequestStore
//!                              ├─ resolve via ResponseCoordinator
//!                              └─ send via MessageSender
//! ```
//!
//! A handler failure is captured in the [`DispatchResult`] and logged; it
//! never prevents sibling handlers from running, and nothing here retries
//! delivery.

pub mod coordinator;
pub mod dispatcher;
pub mod handler;
pub mod pending;
pub mod welcome;

pub use coordinator::{Ack, ResponseCoordinator};
pub use dispatcher::{DispatchResult, Dispatcher, HandlerOutcome, HandlerRegistry, RegistryBuilder};
pub use handler::{BoxedHandler, Handler, HandlerContext, handler_fn};
pub use pending::{PendingRequestStore, PendingStoreConfig};
pub use welcome::{ApprovalHandler, FlowStage, NO_APPLICATION_TEXT, WelcomeHandler};

/// Prelude for common imports.
pub mod prelude {
    pub use super::coordinator::{Ack, ResponseCoordinator};
    pub use super::dispatcher::{DispatchResult, Dispatcher, HandlerRegistry, RegistryBuilder};
    pub use super::handler::{Handler, HandlerContext, handler_fn};
    pub use super::pending::{PendingRequestStore, PendingStoreConfig};
    pub use weld_core::prelude::*;
}
