//! Auto-approve and welcome demo.
//!
//! Wires the weld stack end to end with a console transport standing in for
//! a real chat-network connection:
//!
//! - group join requests are auto-accepted and their application text cached
//! - the matching member-increase triggers a welcome message quoting it
//! - private messages are echoed back, followed by an icon message
//!
//! A scripted event sequence plays the role of the inbound connection. Run
//! with `--dev` for the debug-logging overlay (`weld.dev.toml`).

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tracing::info;

use weld_core::{
    AccountId, Actor, BotId, CapabilityRegistry, Event, EventKind, GroupId, GroupJoinRequest,
    GroupMemberIncrease, GroupRef, MessageBuilder, MessageContent, MessageId, MessageSender,
    PrivateMessage, RequestFlag, RequestResolver, TransportResult,
};
use weld_framework::{
    Dispatcher, HandlerContext, HandlerRegistry, PendingRequestStore, ResponseCoordinator,
    handler_fn, welcome,
};
use weld_runtime::{ConfigLoader, EventLoop, EventSink, logging};

/// The bot's own account on the demo network.
const BOT: BotId = BotId::new(90009);

#[derive(Parser)]
#[command(name = "welcome-bot", about = "Auto-approve and welcome demo")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the dev profile overlay (weld.dev.toml).
    #[arg(long)]
    dev: bool,
}

// ============================================================================
// Console transport
// ============================================================================

/// Outbound capability implementation that prints instead of sending.
struct ConsoleTransport {
    next_message_id: AtomicI64,
}

impl ConsoleTransport {
    fn new() -> Self {
        Self {
            next_message_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl MessageSender for ConsoleTransport {
    async fn send_group_message(
        &self,
        group: GroupId,
        content: &MessageContent,
    ) -> TransportResult<MessageId> {
        info!(group = %group, content = %content, "-> group message");
        Ok(MessageId::new(
            self.next_message_id.fetch_add(1, Ordering::SeqCst),
        ))
    }

    async fn send_private_message(
        &self,
        account: AccountId,
        content: &MessageContent,
    ) -> TransportResult<MessageId> {
        info!(account = %account, content = %content, "-> private message");
        Ok(MessageId::new(
            self.next_message_id.fetch_add(1, Ordering::SeqCst),
        ))
    }
}

#[async_trait]
impl RequestResolver for ConsoleTransport {
    async fn accept(&self, flag: &RequestFlag) -> TransportResult<()> {
        info!(flag = %flag, "-> accept join request");
        Ok(())
    }

    async fn reject(
        &self,
        flag: &RequestFlag,
        blocklist: bool,
        reason: Option<&str>,
    ) -> TransportResult<()> {
        info!(flag = %flag, blocklist, reason = ?reason, "-> reject join request");
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Echoes a private message back, then sends an icon message.
fn echo_handler() -> weld_framework::BoxedHandler {
    handler_fn("private-echo", |ctx: HandlerContext| async move {
        let Event::PrivateMessage(msg) = ctx.event() else {
            return Ok(());
        };
        let sender: Arc<dyn MessageSender> = ctx.capability()?;

        sender
            .send_private_message(msg.sender.id, &msg.content)
            .await?;

        let face = MessageBuilder::new().text("Face: ").icon(9).build();
        sender.send_private_message(msg.sender.id, &face).await?;
        Ok(())
    })
}

// ============================================================================
// Scripted inbound events
// ============================================================================

async fn feed_demo_events(sink: EventSink) -> anyhow::Result<()> {
    let group = GroupRef::new(GroupId::new(20002), "rustaceans");
    let alice = Actor::new(AccountId::new(10001), "alice");

    sink.push(Event::GroupJoinRequest(GroupJoinRequest {
        flag: RequestFlag::new("req-0001"),
        applicant: alice.clone(),
        group: group.clone(),
        text: Some("hello, I came from the forum".into()),
        bot: BOT,
    }))
    .await?;

    tokio::time::sleep(Duration::from_millis(100)).await;

    sink.push(Event::GroupMemberIncrease(GroupMemberIncrease {
        member: alice.clone(),
        group,
        operator: Some(AccountId::new(BOT.value())),
        bot: BOT,
    }))
    .await?;

    tokio::time::sleep(Duration::from_millis(100)).await;

    sink.push(Event::PrivateMessage(PrivateMessage {
        sender: alice,
        content: MessageContent::from_text("ping"),
        bot: BOT,
    }))
    .await?;

    // Dropping the last sink lets the event loop drain and stop.
    Ok(())
}

// ============================================================================
// Entry point
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    if cli.dev {
        loader = loader.profile("dev");
    }
    let config = loader.load()?;
    logging::init_from_config(&config.logging);

    let transport = Arc::new(ConsoleTransport::new());
    let store = Arc::new(PendingRequestStore::with_config(
        config.pending.to_store_config(),
    ));
    let coordinator = Arc::new(ResponseCoordinator::new(
        Arc::clone(&transport) as Arc<dyn RequestResolver>
    ));

    let mut capabilities = CapabilityRegistry::new();
    capabilities.provide::<Arc<dyn MessageSender>>(Arc::clone(&transport) as _);
    capabilities.provide(Arc::clone(&store));
    capabilities.provide(coordinator);

    let registry = welcome::install(HandlerRegistry::builder())
        .on(EventKind::PrivateMessage, echo_handler())
        .build();
    let dispatcher = Dispatcher::new(registry, Arc::new(capabilities));

    let (event_loop, sink) = EventLoop::new(dispatcher, &config.dispatch);
    info!("welcome-bot starting");

    let feeder = tokio::spawn(feed_demo_events(sink));
    event_loop.run().await;
    feeder.await??;

    info!("welcome-bot finished");
    Ok(())
}
