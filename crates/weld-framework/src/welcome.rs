//! Built-in join-request → welcome workflow.
//!
//! Two handlers cooperate through the [`PendingRequestStore`] and the
//! [`ResponseCoordinator`]:
//!
//! - [`ApprovalHandler`] answers `GroupJoinRequest` events: third-party
//!   applications are accepted and their application text recorded; requests
//!   where the bot itself is the invitee are left untouched for an operator.
//! - [`WelcomeHandler`] answers `GroupMemberIncrease` events: it consumes the
//!   recorded text (best-effort) and posts a welcome message mentioning the
//!   new member.
//!
//! # Flow states
//!
//! ```text
//! Unseen ──join request (actor ≠ bot, text)──▶ RequestRecorded
//! Unseen | RequestRecorded ──member increase──▶ MemberJoined
//! MemberJoined ──welcome send ok──▶ Welcomed
//! ```
//!
//! `Unseen` is implicit (no store entry). A failed welcome send leaves the
//! flow at `MemberJoined`; that is terminal here — no retry, visible only in
//! logs and the dispatch result. A member-increase with no recorded request
//! welcomes with a placeholder text instead of failing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use weld_core::{
    Decision, Event, HandlerResult, MessageBuilder, MessageSender, ResolveError,
};

use crate::coordinator::ResponseCoordinator;
use crate::handler::{Handler, HandlerContext};
use crate::pending::PendingRequestStore;

/// Shown in the welcome message when no application text was recorded.
pub const NO_APPLICATION_TEXT: &str = "(none)";

/// Progress marker for the join → welcome flow, used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    /// Application text recorded, member not yet joined.
    RequestRecorded,
    /// Member joined; welcome not (yet) delivered.
    MemberJoined,
    /// Welcome message delivered.
    Welcomed,
}

impl std::fmt::Display for FlowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FlowStage::RequestRecorded => "request_recorded",
            FlowStage::MemberJoined => "member_joined",
            FlowStage::Welcomed => "welcomed",
        })
    }
}

// ============================================================================
// ApprovalHandler
// ============================================================================

/// Accepts third-party group join requests and records their application text.
///
/// Requires `Arc<PendingRequestStore>` and `Arc<ResponseCoordinator>` in the
/// capability registry.
#[derive(Debug, Default)]
pub struct ApprovalHandler;

impl ApprovalHandler {
    /// Creates the handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for ApprovalHandler {
    fn name(&self) -> &str {
        "group-approval"
    }

    async fn handle(&self, ctx: &HandlerContext) -> HandlerResult<()> {
        let Event::GroupJoinRequest(request) = ctx.event() else {
            return Ok(());
        };

        // The bot being invited into a group is the same event kind; it is
        // not ours to auto-answer.
        if request.is_self_request() {
            debug!(group = %request.group.id, "Bot was invited, leaving the request to an operator");
            return Ok(());
        }

        let store: Arc<PendingRequestStore> = ctx.capability()?;
        let coordinator: Arc<ResponseCoordinator> = ctx.capability()?;

        if let Some(text) = request.text.as_deref().filter(|t| !t.is_empty()) {
            store.put(request.applicant.id, text);
            debug!(
                stage = %FlowStage::RequestRecorded,
                applicant = %request.applicant.id,
                "Recorded application text"
            );
        }

        info!(
            applicant = %request.applicant.id,
            nickname = %request.applicant.nickname,
            group = %request.group.id,
            group_name = %request.group.name,
            text = ?request.text,
            "Group join application"
        );

        match coordinator.resolve(&request.flag, Decision::Accept).await {
            Ok(_) => Ok(()),
            // Redelivered request; the first delivery already answered it.
            Err(ResolveError::AlreadyResolved) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// WelcomeHandler
// ============================================================================

/// Welcomes new group members, quoting their application text when recorded.
///
/// Requires `Arc<PendingRequestStore>` and `Arc<dyn MessageSender>` in the
/// capability registry.
#[derive(Debug, Default)]
pub struct WelcomeHandler;

impl WelcomeHandler {
    /// Creates the handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for WelcomeHandler {
    fn name(&self) -> &str {
        "member-welcome"
    }

    async fn handle(&self, ctx: &HandlerContext) -> HandlerResult<()> {
        let Event::GroupMemberIncrease(increase) = ctx.event() else {
            return Ok(());
        };

        let store: Arc<PendingRequestStore> = ctx.capability()?;
        let sender: Arc<dyn MessageSender> = ctx.capability()?;

        // Best-effort: members added by direct invite, or whose entry was
        // evicted, simply have no recorded text.
        let text = store.take_and_remove(increase.member.id);
        debug!(
            stage = %FlowStage::MemberJoined,
            member = %increase.member.id,
            recorded = text.is_some(),
            "Member joined"
        );

        let content = MessageBuilder::new()
            .mention(increase.member.id)
            .text(" Welcome aboard!\n")
            .text("Your application message: ")
            .text(text.as_deref().unwrap_or(NO_APPLICATION_TEXT))
            .build();

        match sender.send_group_message(increase.group.id, &content).await {
            Ok(message_id) => {
                info!(
                    stage = %FlowStage::Welcomed,
                    member = %increase.member.id,
                    group = %increase.group.id,
                    message_id = %message_id,
                    "Welcome message sent"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    stage = %FlowStage::MemberJoined,
                    member = %increase.member.id,
                    group = %increase.group.id,
                    error = %e,
                    "Welcome message failed, not retrying"
                );
                Err(e.into())
            }
        }
    }
}

// ============================================================================
// Registration helper
// ============================================================================

/// Adds both workflow handlers to a registry builder.
pub fn install(builder: crate::dispatcher::RegistryBuilder) -> crate::dispatcher::RegistryBuilder {
    use weld_core::EventKind;

    builder
        .on(EventKind::GroupJoinRequest, Arc::new(ApprovalHandler::new()))
        .on(EventKind::GroupMemberIncrease, Arc::new(WelcomeHandler::new()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use weld_core::{
        AccountId, Actor, BotId, CapabilityRegistry, GroupId, GroupJoinRequest,
        GroupMemberIncrease, GroupRef, MessageContent, MessageId, RequestFlag, RequestResolver,
        TransportError, TransportResult,
    };

    use crate::dispatcher::{Dispatcher, HandlerRegistry};

    #[derive(Default)]
    struct RecordingTransport {
        group_messages: Mutex<Vec<(GroupId, MessageContent)>>,
        accepts: AtomicUsize,
        rejects: AtomicUsize,
        fail_sends: bool,
        next_message_id: AtomicI64,
    }

    #[async_trait]
    impl MessageSender for RecordingTransport {
        async fn send_group_message(
            &self,
            group: GroupId,
            content: &MessageContent,
        ) -> TransportResult<MessageId> {
            if self.fail_sends {
                return Err(TransportError::SendFailed("wire down".into()));
            }
            self.group_messages.lock().push((group, content.clone()));
            Ok(MessageId::new(
                self.next_message_id.fetch_add(1, Ordering::SeqCst),
            ))
        }

        async fn send_private_message(
            &self,
            _account: AccountId,
            _content: &MessageContent,
        ) -> TransportResult<MessageId> {
            Err(TransportError::NotConnected)
        }
    }

    #[async_trait]
    impl RequestResolver for RecordingTransport {
        async fn accept(&self, _flag: &RequestFlag) -> TransportResult<()> {
            self.accepts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn reject(
            &self,
            _flag: &RequestFlag,
            _blocklist: bool,
            _reason: Option<&str>,
        ) -> TransportResult<()> {
            self.rejects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        transport: Arc<RecordingTransport>,
        store: Arc<PendingRequestStore>,
        coordinator: Arc<ResponseCoordinator>,
        dispatcher: Dispatcher,
    }

    fn fixture_with(transport: RecordingTransport) -> Fixture {
        let transport = Arc::new(transport);
        let store = Arc::new(PendingRequestStore::new());
        let coordinator = Arc::new(ResponseCoordinator::new(
            Arc::clone(&transport) as Arc<dyn RequestResolver>
        ));

        let mut capabilities = CapabilityRegistry::new();
        capabilities.provide::<Arc<dyn MessageSender>>(Arc::clone(&transport) as _);
        capabilities.provide(Arc::clone(&store));
        capabilities.provide(Arc::clone(&coordinator));

        let registry = install(HandlerRegistry::builder()).build();
        let dispatcher = Dispatcher::new(registry, Arc::new(capabilities));

        Fixture {
            transport,
            store,
            coordinator,
            dispatcher,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingTransport::default())
    }

    fn join_request(applicant: i64, bot: i64, text: Option<&str>) -> Event {
        Event::GroupJoinRequest(GroupJoinRequest {
            flag: RequestFlag::new(format!("flag-{applicant}")),
            applicant: Actor::new(AccountId::new(applicant), "newcomer"),
            group: GroupRef::new(GroupId::new(20002), "rustaceans"),
            text: text.map(String::from),
            bot: BotId::new(bot),
        })
    }

    fn member_increase(member: i64) -> Event {
        Event::GroupMemberIncrease(GroupMemberIncrease {
            member: Actor::new(AccountId::new(member), "newcomer"),
            group: GroupRef::new(GroupId::new(20002), "rustaceans"),
            operator: None,
            bot: BotId::new(555),
        })
    }

    #[tokio::test]
    async fn test_full_flow_quotes_application_text() {
        let f = fixture();

        let result = f.dispatcher.dispatch(join_request(10001, 555, Some("hello"))).await;
        assert!(result.all_ok());
        assert_eq!(f.transport.accepts.load(Ordering::SeqCst), 1);

        let result = f.dispatcher.dispatch(member_increase(10001)).await;
        assert!(result.all_ok());

        let messages = f.transport.group_messages.lock();
        assert_eq!(messages.len(), 1);
        let (group, content) = &messages[0];
        assert_eq!(*group, GroupId::new(20002));
        assert!(content.plain_text().contains("hello"));
        assert_eq!(content.mentions(), vec![AccountId::new(10001)]);

        // Consumed exactly once.
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_self_invite_records_and_issues_nothing() {
        let f = fixture();

        let result = f.dispatcher.dispatch(join_request(555, 555, Some("hello"))).await;
        assert!(result.all_ok());

        assert!(f.store.is_empty());
        assert_eq!(f.transport.accepts.load(Ordering::SeqCst), 0);
        assert_eq!(f.transport.rejects.load(Ordering::SeqCst), 0);
        assert_eq!(f.coordinator.resolved_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_text_not_recorded_but_accepted() {
        let f = fixture();

        f.dispatcher.dispatch(join_request(10001, 555, None)).await;
        assert!(f.store.is_empty());
        assert_eq!(f.transport.accepts.load(Ordering::SeqCst), 1);

        f.dispatcher.dispatch(join_request(10002, 555, Some(""))).await;
        assert!(f.store.is_empty());
        assert_eq!(f.transport.accepts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_welcome_without_request_uses_placeholder() {
        let f = fixture();

        let result = f.dispatcher.dispatch(member_increase(10001)).await;
        assert!(result.all_ok());

        let messages = f.transport.group_messages.lock();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].1.plain_text().contains(NO_APPLICATION_TEXT));
        assert_eq!(messages[0].1.mentions(), vec![AccountId::new(10001)]);
    }

    #[tokio::test]
    async fn test_redelivered_request_accepts_once() {
        let f = fixture();
        let event = join_request(10001, 555, Some("hello"));

        let first = f.dispatcher.dispatch(event.clone()).await;
        let second = f.dispatcher.dispatch(event).await;

        // The duplicate is benign: the handler reports success both times,
        // but the transport only ever saw one accept.
        assert!(first.all_ok());
        assert!(second.all_ok());
        assert_eq!(f.transport.accepts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_welcome_send_is_surfaced_not_retried() {
        let f = fixture_with(RecordingTransport {
            fail_sends: true,
            ..Default::default()
        });

        f.dispatcher.dispatch(join_request(10001, 555, Some("hello"))).await;
        let result = f.dispatcher.dispatch(member_increase(10001)).await;

        assert_eq!(result.failed(), 1);
        assert!(f.transport.group_messages.lock().is_empty());
        // The pending text was consumed even though the send failed; the
        // flow parks at MemberJoined and is not re-entered.
        assert!(f.store.is_empty());
    }
}
