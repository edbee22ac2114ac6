//! The event loop feeding the dispatcher.
//!
//! Transports deliver events by pushing them into an [`EventSink`]; the
//! [`EventLoop`] receives them and hands each one to the dispatcher on its
//! own task. Dispatch *starts* in arrival order, and distinct events run
//! concurrently — a slow handler only delays its own event's branch. The
//! bounded queue applies backpressure to transports instead of buffering
//! without limit.
//!
//! # Example
//!
//! ```rust,ignore
//! use weld_runtime::EventLoop;
//!
//! let (event_loop, sink) = EventLoop::new(dispatcher, &config.dispatch);
//! let shutdown = event_loop.shutdown_token();
//!
//! tokio::spawn(async move { transport.pump_into(sink).await });
//! event_loop.run().await;   // until `shutdown.cancel()` or all sinks drop
//! ```

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use weld_core::Event;
use weld_framework::Dispatcher;

use crate::config::DispatchConfig;

// =============================================================================
// Errors
// =============================================================================

/// Errors from pushing events into the runtime.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// The event loop has stopped; the event was not enqueued.
    #[error("event loop is not running")]
    Closed,

    /// The inbound queue is full (non-blocking push only).
    #[error("inbound event queue is full")]
    QueueFull,
}

// =============================================================================
// EventSink
// =============================================================================

/// The inbound side of the event loop, handed to transports.
///
/// Cheap to clone; every connection can own one.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Event>,
}

impl EventSink {
    /// Enqueues an event, waiting when the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] once the event loop has stopped.
    pub async fn push(&self, event: Event) -> Result<(), RuntimeError> {
        self.tx.send(event).await.map_err(|_| RuntimeError::Closed)
    }

    /// Enqueues an event without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::QueueFull`] when the queue is at capacity, or
    /// [`RuntimeError::Closed`] once the event loop has stopped.
    pub fn try_push(&self, event: Event) -> Result<(), RuntimeError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RuntimeError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => RuntimeError::Closed,
        })
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

// =============================================================================
// EventLoop
// =============================================================================

/// Receives inbound events and dispatches each on its own task.
pub struct EventLoop {
    dispatcher: Arc<Dispatcher>,
    events: mpsc::Receiver<Event>,
    shutdown: CancellationToken,
}

impl EventLoop {
    /// Creates an event loop and the sink transports push into.
    pub fn new(dispatcher: Dispatcher, config: &DispatchConfig) -> (Self, EventSink) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        (
            Self {
                dispatcher: Arc::new(dispatcher),
                events: rx,
                shutdown: CancellationToken::new(),
            },
            EventSink { tx },
        )
    }

    /// Returns the token that stops this loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs until the shutdown token is cancelled or every sink is dropped.
    ///
    /// In-flight dispatch tasks are awaited before returning, so handlers
    /// never get silently dropped mid-event.
    pub async fn run(mut self) {
        info!("Event loop running");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                maybe_event = self.events.recv() => {
                    match maybe_event {
                        Some(event) => {
                            let dispatcher = Arc::clone(&self.dispatcher);
                            tasks.spawn(async move {
                                let result = dispatcher.dispatch(event).await;
                                if result.failed() > 0 {
                                    warn!(
                                        event = %result.kind,
                                        failed = result.failed(),
                                        handled = result.handled(),
                                        "Event processed with handler failures"
                                    );
                                }
                            });
                            // Reap whatever already finished so the set does
                            // not grow with total event volume.
                            while tasks.try_join_next().is_some() {}
                        }
                        None => {
                            debug!("All event sinks dropped");
                            break;
                        }
                    }
                }
            }
        }

        // Drain in-flight dispatches.
        while tasks.join_next().await.is_some() {}
        info!("Event loop stopped");
    }

    /// Runs until Ctrl+C / SIGTERM, then drains and returns.
    pub async fn run_with_signals(self) {
        let shutdown = self.shutdown_token();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.cancel();
        });
        self.run().await;
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal;

        let Ok(mut sigterm) = signal::unix::signal(signal::unix::SignalKind::terminate()) else {
            let _ = signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down");
            return;
        };

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down");
    }
}

// =============================================================================
// Tests
// =============================================================================
