//! Handler trait and execution context.
//!
//! A handler is one unit of logic registered against one event kind. It
//! receives a [`HandlerContext`] holding the event and the process-wide
//! capability registry, does its work through capabilities, and reports
//! success or failure. Handlers must tolerate being invoked more than once
//! per logical event — the inbound transport is at-least-once.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weld_core::{Event, MessageSender};
//! use weld_framework::{HandlerContext, handler_fn};
//!
//! let echo = handler_fn("private-echo", |ctx: HandlerContext| async move {
//!     let Event::PrivateMessage(msg) = ctx.event() else { return Ok(()) };
//!     let sender: Arc<dyn MessageSender> = ctx.capability()?;
//!     sender.send_private_message(msg.sender.id, &msg.content).await?;
//!     Ok(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use weld_core::capability::capability_name;
use weld_core::{CapabilityRegistry, Event, HandlerError, HandlerResult};

// ============================================================================
// HandlerContext
// ============================================================================

/// The context passed to handlers during event processing.
///
/// Wraps the event being processed together with the capability registry the
/// handler resolves its collaborators from. Cloning is cheap: the registry is
/// shared behind an `Arc` and events are plain data.
#[derive(Clone)]
pub struct HandlerContext {
    event: Event,
    capabilities: Arc<CapabilityRegistry>,
}

impl HandlerContext {
    /// Creates a context for one event.
    pub fn new(event: Event, capabilities: Arc<CapabilityRegistry>) -> Self {
        Self {
            event,
            capabilities,
        }
    }

    /// Returns the event being processed.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Resolves a capability by type.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::MissingCapability`] if nothing of type `T` was
    /// registered at startup.
    pub fn capability<T>(&self) -> HandlerResult<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.capabilities
            .get::<T>()
            .ok_or(HandlerError::MissingCapability {
                type_name: capability_name::<T>(),
            })
    }

    /// Returns the underlying capability registry.
    pub fn capabilities(&self) -> &Arc<CapabilityRegistry> {
        &self.capabilities
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("event", &self.event.name())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

// ============================================================================
// Handler trait
// ============================================================================

/// One unit of event-processing logic.
///
/// Implementations are shared across invocations (`&self`) and across tasks,
/// so any internal state must be synchronized.
#[async_trait]
pub trait Handler: Send + Sync {
    /// A stable name for this handler, used in logs and dispatch results.
    fn name(&self) -> &str;

    /// Processes one event.
    ///
    /// # Errors
    ///
    /// An error isolates to this handler: the dispatcher records it and moves
    /// on to the next handler for the same event.
    async fn handle(&self, ctx: &HandlerContext) -> HandlerResult<()>;
}

/// A shareable, type-erased handler reference.
pub type BoxedHandler = Arc<dyn Handler>;

// ============================================================================
// Function handlers
// ============================================================================

/// Adapts an async closure into a [`Handler`].
///
/// The closure receives the context by value (contexts are cheap clones), so
/// it can be moved into the returned future without lifetime gymnastics.
pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> BoxedHandler
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        f,
    })
}

struct FnHandler<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, ctx: &HandlerContext) -> HandlerResult<()> {
        (self.f)(ctx.clone()).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use weld_core::{AccountId, Actor, BotId, Event, MessageContent, PrivateMessage};

    fn private_message() -> Event {
        Event::PrivateMessage(PrivateMessage {
            sender: Actor::new(AccountId::new(10001), "alice"),
            content: MessageContent::from_text("ping"),
            bot: BotId::new(555),
        })
    }

    #[tokio::test]
    async fn test_handler_fn_runs_and_sees_event() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let handler = handler_fn("probe", move |ctx: HandlerContext| {
            let calls = Arc::clone(&calls_clone);
            async move {
                assert!(matches!(ctx.event(), Event::PrivateMessage(_)));
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let ctx = HandlerContext::new(private_message(), Arc::new(CapabilityRegistry::new()));
        assert_eq!(handler.name(), "probe");
        handler.handle(&ctx).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_capability_is_an_error() {
        let ctx = HandlerContext::new(private_message(), Arc::new(CapabilityRegistry::new()));
        let err = ctx.capability::<Arc<String>>().unwrap_err();
        assert!(matches!(err, HandlerError::MissingCapability { .. }));
    }

    #[tokio::test]
    async fn test_capability_resolution() {
        let registry = Arc::new(CapabilityRegistry::new().with(Arc::new(41u32)));
        let ctx = HandlerContext::new(private_message(), registry);
        let value: Arc<u32> = ctx.capability().unwrap();
        assert_eq!(*value, 41);
    }
}
