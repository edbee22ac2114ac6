//! Outbound capabilities and the registry handlers resolve them from.
//!
//! Handlers never talk to a socket. Everything they do to the outside world
//! goes through a capability trait object — sending messages through
//! [`MessageSender`], resolving join requests through [`RequestResolver`] —
//! registered once at startup in a [`CapabilityRegistry`] and looked up by
//! type at dispatch time.
//!
//! The registry is a fixed type map: populated during bootstrap, read-only
//! afterwards, shared behind an `Arc` by every handler invocation.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weld_core::{CapabilityRegistry, MessageSender};
//!
//! let mut registry = CapabilityRegistry::new();
//! registry.provide::<Arc<dyn MessageSender>>(Arc::new(MyTransport::connect()?));
//!
//! // later, inside a handler
//! let sender = registry.get::<Arc<dyn MessageSender>>().unwrap();
//! sender.send_group_message(group, &content).await?;
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::message::MessageContent;
use crate::types::{AccountId, GroupId, MessageId, RequestFlag};

// =============================================================================
// Outbound capability traits
// =============================================================================

/// Capability for sending messages to the chat network.
///
/// Wire encoding, authentication, and any retry policy belong to the
/// implementation; the core hands over immutable content and reads back the
/// transport's verdict.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Sends a message to a group.
    async fn send_group_message(
        &self,
        group: GroupId,
        content: &MessageContent,
    ) -> TransportResult<MessageId>;

    /// Sends a message to an account.
    async fn send_private_message(
        &self,
        account: AccountId,
        content: &MessageContent,
    ) -> TransportResult<MessageId>;
}

/// Capability for answering request-type events at the transport.
///
/// Callers must not invoke this directly for de-duplication-sensitive flows;
/// the framework's response coordinator wraps it and guarantees at-most-once
/// resolution per flag.
#[async_trait]
pub trait RequestResolver: Send + Sync {
    /// Accepts the request identified by `flag`.
    async fn accept(&self, flag: &RequestFlag) -> TransportResult<()>;

    /// Rejects the request identified by `flag`.
    ///
    /// `blocklist` additionally bars the applicant from re-applying;
    /// `reason` is shown to the applicant where the network supports it.
    async fn reject(
        &self,
        flag: &RequestFlag,
        blocklist: bool,
        reason: Option<&str>,
    ) -> TransportResult<()>;
}

// =============================================================================
// CapabilityRegistry
// =============================================================================

/// A fixed, type-keyed registry of collaborator objects.
///
/// Entries are stored under their concrete Rust type — by convention
/// `Arc<dyn Trait>` for capability trait objects — and retrieved by asking
/// for that same type. Lookups clone the stored value, so registered types
/// should be cheap to clone (`Arc`s are).
#[derive(Default)]
pub struct CapabilityRegistry {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability under its type, replacing any previous entry.
    pub fn provide<T>(&mut self, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Registers a capability (builder form).
    pub fn with<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.provide(value);
        self
    }

    /// Looks up a capability by type.
    pub fn get<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<T>())
            .cloned()
    }

    /// Whether a capability of type `T` is registered.
    pub fn contains<T>(&self) -> bool
    where
        T: Send + Sync + 'static,
    {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Returns the human-readable name of a capability type, for error messages.
pub fn capability_name<T: 'static>() -> &'static str {
    type_name::<T>()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_registry_stores_and_returns_by_type() {
        #[derive(Clone, PartialEq, Debug)]
        struct Marker(u32);

        let registry = CapabilityRegistry::new().with(Marker(7));
        assert_eq!(registry.get::<Marker>(), Some(Marker(7)));
        assert!(registry.get::<String>().is_none());
        assert!(registry.contains::<Marker>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_holds_trait_objects() {
        struct NullSender;

        #[async_trait]
        impl MessageSender for NullSender {
            async fn send_group_message(
                &self,
                _group: GroupId,
                _content: &MessageContent,
            ) -> TransportResult<MessageId> {
                Ok(MessageId::new(1))
            }

            async fn send_private_message(
                &self,
                _account: AccountId,
                _content: &MessageContent,
            ) -> TransportResult<MessageId> {
                Ok(MessageId::new(2))
            }
        }

        let mut registry = CapabilityRegistry::new();
        registry.provide::<Arc<dyn MessageSender>>(Arc::new(NullSender));

        let sender = registry.get::<Arc<dyn MessageSender>>();
        assert!(sender.is_some());
    }

    #[test]
    fn test_provide_replaces_previous_entry() {
        let mut registry = CapabilityRegistry::new();
        registry.provide(1u32);
        registry.provide(2u32);
        assert_eq!(registry.get::<u32>(), Some(2));
        assert_eq!(registry.len(), 1);
    }
}
