//! cb2bot-server/src/context.rs
//!
//! Builds every long-lived component from `BotConfig` and supervises the running tasks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum_server::Handle;
use tracing::{error, info};

use cb2bot_common::traits::{ChatSink, CommandRepository, TwitchApi};
use cb2bot_core::auth::AuthState;
use cb2bot_core::cache::DedupCache;
use cb2bot_core::platforms::twitch::TwitchHelixClient;
use cb2bot_core::platforms::twitch_eventsub::{serve_webhook, WebhookState};
use cb2bot_core::platforms::twitch_irc::ChatLink;
use cb2bot_core::repositories::SqliteCommandRepository;
use cb2bot_core::services::{
    graceful_shutdown, CommandEngine, CooldownRegistry, EngineSettings, GreetingTracker,
};
use cb2bot_core::tasks::spawn_daily_reset_task;
use cb2bot_core::{BotConfig, Database};

const WEBHOOK_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct ServerContext {
    pub config: BotConfig,
    pub db: Database,
    pub twitch: Arc<dyn TwitchApi>,
    pub auth: Arc<AuthState>,
    pub dedup: Arc<DedupCache>,
    pub greeter: Arc<GreetingTracker>,
    pub chat: Arc<dyn ChatSink>,
    pub engine: Arc<CommandEngine>,
    pub link: ChatLink,
}

impl ServerContext {
    pub async fn new(config: BotConfig) -> anyhow::Result<Self> {
        let db = Database::new(&config.db_path)
            .await
            .with_context(|| format!("opening database {}", config.db_path))?;
        db.migrate().await.context("running migrations")?;

        let repo = Arc::new(SqliteCommandRepository::new(db.pool().clone()));
        match repo.list().await {
            Ok(cmds) => info!("Loaded {} custom command(s)", cmds.len()),
            Err(e) => error!("Could not list custom commands: {}", e),
        }

        let twitch: Arc<dyn TwitchApi> = Arc::new(TwitchHelixClient::new(&config));
        let auth = Arc::new(AuthState::new());
        let dedup = Arc::new(DedupCache::new(config.dedup_retention_secs));
        let greeter = Arc::new(GreetingTracker::new());

        let client = ChatLink::connect_client(&config)
            .await
            .context("connecting to Twitch chat")?;
        let channel = config.channel_target();
        let chat: Arc<dyn ChatSink> = Arc::new(client.sender(&channel));

        let engine = Arc::new(CommandEngine::new(
            repo,
            Arc::new(CooldownRegistry::new()),
            twitch.clone(),
            chat.clone(),
            auth.clone(),
            EngineSettings::from_config(&config),
        ));

        let link = ChatLink::new(client, &channel, engine.clone(), greeter.clone());

        Ok(Self { config, db, twitch, auth, dedup, greeter, chat, engine, link })
    }

    /// Runs until chat closes, `!disconnect`, the webhook server dies, or Ctrl-C;
    /// then performs the shutdown sequence.
    pub async fn run(self) -> anyhow::Result<()> {
        let ServerContext { config, db, twitch, auth, dedup, greeter, chat, engine, mut link } = self;

        link.join().await.context("joining channel")?;

        let handle = Handle::new();
        let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
        let state = WebhookState {
            secret: config.eventsub_secret.clone(),
            dedup,
            chat: chat.clone(),
            auth,
            twitch: twitch.clone(),
        };
        let mut webhook = tokio::spawn(serve_webhook(addr, state, handle.clone()));
        let reset = spawn_daily_reset_task(greeter, chat.clone(), config.reset_timezone);

        tokio::select! {
            exit = link.run() => info!("Chat loop ended: {:?}", exit),
            res = &mut webhook => match res {
                Ok(Ok(())) => info!("Webhook server stopped"),
                Ok(Err(e)) => error!("Webhook server failed: {}", e),
                Err(e) => error!("Webhook task panicked: {}", e),
            },
            _ = tokio::signal::ctrl_c() => info!("Ctrl-C received"),
        }

        graceful_shutdown(twitch.as_ref(), chat.as_ref()).await;
        info!("Command stats: {:?}", engine.stats());

        reset.abort();
        handle.graceful_shutdown(Some(WEBHOOK_SHUTDOWN_GRACE));
        link.close().await;
        db.pool().close().await;
        Ok(())
    }
}
