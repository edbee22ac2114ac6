//! At-most-once resolution of request flags.
//!
//! The inbound transport is at-least-once, so the same join request can reach
//! handlers twice — and a handler naively answering each delivery would
//! accept (or reject) the request twice at the transport. The
//! [`ResponseCoordinator`] sits between handlers and the raw
//! [`RequestResolver`] capability and guarantees that for any one
//! [`RequestFlag`], at most one transport call is ever issued.
//!
//! A duplicate resolution attempt returns [`ResolveError::AlreadyResolved`];
//! callers treat it as benign. A transport failure is surfaced unretried —
//! and the flag still counts as resolved, because the transport may well have
//! acted before the failure was reported.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use weld_core::{
    Decision, RequestFlag, RequestResolver, ResolveError, ResolveResult, TransportResult,
};

/// Acknowledgement of a resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The decision was issued to the transport.
    Issued,
    /// The decision was [`Decision::Defer`]; the flag stays open.
    Deferred,
}

/// Issues accept/reject decisions, de-duplicated per request flag.
///
/// # Thread Safety
///
/// `resolve` may be called from concurrent tasks; when two callers race on
/// one flag, exactly one wins and the other observes `AlreadyResolved`.
pub struct ResponseCoordinator {
    resolver: Arc<dyn RequestResolver>,
    /// Flags a decision has been committed for. Grows with distinct flags;
    /// flags are transport-unique per request, so the set is bounded by
    /// request volume, not by redeliveries.
    resolved: Mutex<HashSet<RequestFlag>>,
}

impl ResponseCoordinator {
    /// Creates a coordinator over the given transport resolver.
    pub fn new(resolver: Arc<dyn RequestResolver>) -> Self {
        Self {
            resolver,
            resolved: Mutex::new(HashSet::new()),
        }
    }

    /// Resolves a request flag with a decision.
    ///
    /// [`Decision::Defer`] leaves the flag open (no transport call, flag not
    /// marked) so a later call can still decide it. Any other decision marks
    /// the flag resolved *before* the transport call is issued: duplicate
    /// suppression must hold even when the call fails, since the transport
    /// may have acted before reporting the failure.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::AlreadyResolved`] — a decision was already committed
    ///   for this flag; nothing was issued. Benign under redelivery.
    /// - [`ResolveError::Transport`] — the transport call failed. Not retried
    ///   here; retries, if any, belong to the transport layer.
    pub async fn resolve(&self, flag: &RequestFlag, decision: Decision) -> ResolveResult<Ack> {
        match decision {
            Decision::Defer => {
                if self.resolved.lock().contains(flag) {
                    debug!(flag = %flag, "Defer after resolution, nothing to keep open");
                    return Err(ResolveError::AlreadyResolved);
                }
                debug!(flag = %flag, "Request deferred");
                Ok(Ack::Deferred)
            }
            Decision::Accept => {
                self.commit(flag)?;
                debug!(flag = %flag, "Accepting request");
                self.issue(flag, self.resolver.accept(flag)).await
            }
            Decision::Reject { reason, blocklist } => {
                self.commit(flag)?;
                debug!(flag = %flag, blocklist, reason = ?reason, "Rejecting request");
                self.issue(flag, self.resolver.reject(flag, blocklist, reason.as_deref()))
                    .await
            }
        }
    }

    /// Marks the flag resolved, failing if someone got there first.
    fn commit(&self, flag: &RequestFlag) -> ResolveResult<()> {
        if self.resolved.lock().insert(flag.clone()) {
            Ok(())
        } else {
            debug!(flag = %flag, "Duplicate resolution suppressed");
            Err(ResolveError::AlreadyResolved)
        }
    }

    async fn issue(
        &self,
        flag: &RequestFlag,
        call: impl Future<Output = TransportResult<()>>,
    ) -> ResolveResult<Ack> {
        match call.await {
            Ok(()) => Ok(Ack::Issued),
            Err(e) => {
                warn!(flag = %flag, error = %e, "Transport call for resolution failed");
                Err(ResolveError::Transport(e))
            }
        }
    }

    /// Whether a decision has been committed for this flag.
    pub fn is_resolved(&self, flag: &RequestFlag) -> bool {
        self.resolved.lock().contains(flag)
    }

    /// Number of flags with a committed decision.
    pub fn resolved_count(&self) -> usize {
        self.resolved.lock().len()
    }
}

impl std::fmt::Debug for ResponseCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCoordinator")
            .field("resolved_count", &self.resolved_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use weld_core::{TransportError, TransportResult};

    #[derive(Default)]
    struct CountingResolver {
        accepts: AtomicUsize,
        rejects: AtomicUsize,
        fail_sends: bool,
        last_reject: Mutex<Option<(bool, Option<String>)>>,
    }

    #[async_trait]
    impl RequestResolver for CountingResolver {
        async fn accept(&self, _flag: &RequestFlag) -> TransportResult<()> {
            self.accepts.fetch_add(1, Ordering::SeqCst);
            if self.fail_sends {
                return Err(TransportError::SendFailed("wire down".into()));
            }
            Ok(())
        }

        async fn reject(
            &self,
            _flag: &RequestFlag,
            blocklist: bool,
            reason: Option<&str>,
        ) -> TransportResult<()> {
            self.rejects.fetch_add(1, Ordering::SeqCst);
            *self.last_reject.lock() = Some((blocklist, reason.map(String::from)));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_accept_issued_exactly_once() {
        let resolver = Arc::new(CountingResolver::default());
        let coordinator = ResponseCoordinator::new(Arc::clone(&resolver) as _);
        let flag = RequestFlag::new("flag-1");

        let first = coordinator.resolve(&flag, Decision::Accept).await;
        assert_eq!(first.unwrap(), Ack::Issued);

        let second = coordinator.resolve(&flag, Decision::Accept).await;
        assert!(matches!(second, Err(ResolveError::AlreadyResolved)));

        assert_eq!(resolver.accepts.load(Ordering::SeqCst), 1);
        assert!(coordinator.is_resolved(&flag));
        assert_eq!(coordinator.resolved_count(), 1);
    }

    #[tokio::test]
    async fn test_reject_passes_blocklist_and_reason() {
        let resolver = Arc::new(CountingResolver::default());
        let coordinator = ResponseCoordinator::new(Arc::clone(&resolver) as _);
        let flag = RequestFlag::new("flag-2");

        coordinator
            .resolve(&flag, Decision::Reject {
                reason: Some("spam".into()),
                blocklist: true,
            })
            .await
            .unwrap();

        assert_eq!(resolver.rejects.load(Ordering::SeqCst), 1);
        assert_eq!(
            *resolver.last_reject.lock(),
            Some((true, Some("spam".to_string())))
        );
    }

    #[tokio::test]
    async fn test_defer_leaves_flag_open() {
        let resolver = Arc::new(CountingResolver::default());
        let coordinator = ResponseCoordinator::new(Arc::clone(&resolver) as _);
        let flag = RequestFlag::new("flag-3");

        let ack = coordinator.resolve(&flag, Decision::Defer).await.unwrap();
        assert_eq!(ack, Ack::Deferred);
        assert!(!coordinator.is_resolved(&flag));

        // A later decision still goes through.
        coordinator.resolve(&flag, Decision::Accept).await.unwrap();
        assert_eq!(resolver.accepts.load(Ordering::SeqCst), 1);

        // But deferring a resolved flag is a duplicate.
        let late = coordinator.resolve(&flag, Decision::Defer).await;
        assert!(matches!(late, Err(ResolveError::AlreadyResolved)));
    }

    #[tokio::test]
    async fn test_transport_failure_still_counts_as_resolved() {
        let resolver = Arc::new(CountingResolver {
            fail_sends: true,
            ..Default::default()
        });
        let coordinator = ResponseCoordinator::new(Arc::clone(&resolver) as _);
        let flag = RequestFlag::new("flag-4");

        let first = coordinator.resolve(&flag, Decision::Accept).await;
        assert!(matches!(first, Err(ResolveError::Transport(_))));

        let second = coordinator.resolve(&flag, Decision::Accept).await;
        assert!(matches!(second, Err(ResolveError::AlreadyResolved)));

        assert_eq!(resolver.accepts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_flags_resolve_independently() {
        let resolver = Arc::new(CountingResolver::default());
        let coordinator = ResponseCoordinator::new(Arc::clone(&resolver) as _);

        for i in 0..5 {
            coordinator
                .resolve(&RequestFlag::new(format!("flag-{i}")), Decision::Accept)
                .await
                .unwrap();
        }

        assert_eq!(resolver.accepts.load(Ordering::SeqCst), 5);
        assert_eq!(coordinator.resolved_count(), 5);
    }
}
