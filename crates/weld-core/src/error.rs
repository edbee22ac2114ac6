//! Unified error types for the weld core.
//!
//! Every error here is local to the handler or event that produced it; none
//! of them is allowed to take the process down. A missing pending record is
//! deliberately *not* an error — lookups that may legitimately miss return
//! `Option` instead.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors surfaced from the outbound transport boundary.
///
/// The core performs no automatic retry; if the transport wants retries, it
/// does them behind its own capability implementation.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The connection to the chat network is gone.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// The outbound call was attempted but failed.
    #[error("failed to send: {0}")]
    SendFailed(String),

    /// No connection has been established yet.
    #[error("not connected")]
    NotConnected,
}

// =============================================================================
// Resolve Errors
// =============================================================================

/// Errors from resolving a request flag.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The flag was already resolved; no transport call was issued.
    ///
    /// Benign under at-least-once delivery — a redelivered request event
    /// naturally produces a second resolution attempt.
    #[error("request flag already resolved")]
    AlreadyResolved,

    /// The transport call itself failed. The flag still counts as resolved.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

// =============================================================================
// Handler Errors
// =============================================================================

/// An error raised by an individual handler while processing an event.
///
/// Handler errors isolate to the failing handler: sibling handlers for the
/// same event and all future events are unaffected.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler asked for a capability the registry does not hold.
    #[error("missing capability: {type_name}")]
    MissingCapability {
        /// The requested capability type.
        type_name: &'static str,
    },

    /// A transport call made by the handler failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Resolving a request flag failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Any other handler-specific failure.
    #[error("{0}")]
    Other(String),
}

impl HandlerError {
    /// Creates a handler-specific error from a message.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for request resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type for handler execution.
pub type HandlerResult<T> = Result<T, HandlerError>;
