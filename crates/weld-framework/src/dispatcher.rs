//! Event dispatcher and the handler registration table.
//!
//! Dispatch is table-driven: at startup the application assembles a
//! [`HandlerRegistry`] mapping each [`EventKind`] to an ordered list of
//! handlers, freezes it, and hands it to the [`Dispatcher`]. There is no
//! scanning and no dynamic registration during steady-state operation.
//!
//! When an event is dispatched:
//!
//! 1. The registry is consulted with the event's kind
//! 2. Each registered handler runs in registration order
//! 3. A handler failure is recorded and logged; siblings still run
//! 4. The per-handler outcomes are returned as a [`DispatchResult`]
//!
//! The dispatcher is `Send + Sync` and dispatches through `&self`, so the
//! runtime may process distinct events on concurrent tasks; ordering between
//! events is whatever order `dispatch` is called in.
//!
//! ```rust,ignore
//! use weld_framework::{Dispatcher, HandlerRegistry};
//! use weld_core::EventKind;
//!
//! let registry = HandlerRegistry::builder()
//!     .on(EventKind::GroupJoinRequest, approval_handler)
//!     .on(EventKind::GroupMemberIncrease, welcome_handler)
//!     .on(EventKind::PrivateMessage, echo_handler)
//!     .build();
//!
//! let dispatcher = Dispatcher::new(registry, capabilities);
//! let result = dispatcher.dispatch(event).await;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{Level, debug, error, span, trace};

use weld_core::{CapabilityRegistry, Event, EventKind, HandlerResult};

use crate::handler::{BoxedHandler, HandlerContext};

// ============================================================================
// Registry
// ============================================================================

/// Builder for a [`HandlerRegistry`].
///
/// Handlers are invoked in the order they are added for their kind.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<EventKind, Vec<BoxedHandler>>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for an event kind.
    pub fn on(mut self, kind: EventKind, handler: BoxedHandler) -> Self {
        self.handlers.entry(kind).or_default().push(handler);
        self
    }

    /// Freezes the table into an immutable registry.
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: Arc::new(self.handlers),
        }
    }
}

/// Immutable mapping from event kind to its ordered handler list.
///
/// Built once at startup; read-only (and cheaply cloneable) thereafter.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<HashMap<EventKind, Vec<BoxedHandler>>>,
}

impl HandlerRegistry {
    /// Starts building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Returns the handlers registered for a kind, in registration order.
    pub fn handlers_for(&self, kind: EventKind) -> &[BoxedHandler] {
        self.handlers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the total number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.handlers.len())
            .field("handler_count", &self.handler_count())
            .finish()
    }
}

// ============================================================================
// Dispatch outcomes
// ============================================================================

/// The outcome of one handler invocation.
#[derive(Debug)]
pub struct HandlerOutcome {
    /// The handler's name.
    pub handler: String,
    /// What the handler returned.
    pub result: HandlerResult<()>,
}

impl HandlerOutcome {
    /// Whether the handler succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregated per-handler outcomes for one dispatched event.
///
/// Purely observational: nothing re-delivers to a handler that failed.
#[derive(Debug)]
pub struct DispatchResult {
    /// The kind of the dispatched event.
    pub kind: EventKind,
    /// One outcome per invoked handler, in invocation order.
    pub outcomes: Vec<HandlerOutcome>,
}

impl DispatchResult {
    /// Number of handlers invoked.
    pub fn handled(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of handlers that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    /// Whether no handler was registered for the event's kind.
    pub fn is_unhandled(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Whether every invoked handler succeeded.
    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(HandlerOutcome::is_ok)
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes events to the handlers registered for their kind.
///
/// # Thread Safety
///
/// `Dispatcher` is `Send + Sync`; callers may invoke [`dispatch`](Self::dispatch)
/// for distinct events from concurrent tasks. A single event's handlers run
/// sequentially in registration order.
pub struct Dispatcher {
    registry: HandlerRegistry,
    capabilities: Arc<CapabilityRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher over a frozen registry and capability set.
    pub fn new(registry: HandlerRegistry, capabilities: Arc<CapabilityRegistry>) -> Self {
        Self {
            registry,
            capabilities,
        }
    }

    /// Returns the registry this dispatcher routes with.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dispatches one event to all handlers registered for its kind.
    ///
    /// Handlers run in registration order. A failing handler is logged and
    /// recorded in the result; it does not stop sibling handlers and is not
    /// retried.
    pub async fn dispatch(&self, event: Event) -> DispatchResult {
        let kind = event.kind();
        let span = span!(Level::DEBUG, "dispatch", event = %kind);
        let _enter = span.enter();

        let handlers = self.registry.handlers_for(kind);
        if handlers.is_empty() {
            debug!("No handler registered for event kind");
            return DispatchResult {
                kind,
                outcomes: Vec::new(),
            };
        }

        let ctx = HandlerContext::new(event, Arc::clone(&self.capabilities));
        let mut outcomes = Vec::with_capacity(handlers.len());

        for handler in handlers {
            trace!(handler = handler.name(), "Invoking handler");
            let result = handler.handle(&ctx).await;
            if let Err(e) = &result {
                error!(handler = handler.name(), error = %e, "Handler failed");
            }
            outcomes.push(HandlerOutcome {
                handler: handler.name().to_string(),
                result,
            });
        }

        DispatchResult { kind, outcomes }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
