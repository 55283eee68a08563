//! src/platforms/twitch_irc/runtime.rs
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use cb2bot_common::traits::ChatSink;

use crate::config::BotConfig;
use crate::services::command_engine::{CommandEngine, CommandOutcome, COMMAND_MARKER};
use crate::services::greeter::GreetingTracker;
use crate::Error;

use super::client::{IrcChatSender, IrcIncomingEvent, TwitchIrcClient};

pub const JOIN_ANNOUNCEMENT: &str = "/me has joined the chat.";

/// How long `close` waits for queued lines (the farewell) to be written.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Why [`ChatLink::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatLinkExit {
    ShutdownRequested,
    ConnectionClosed,
}

/// The bot's presence in one channel: routes `!commands` to the engine and greets
/// chatters once per day.
pub struct ChatLink {
    client: TwitchIrcClient,
    chat: IrcChatSender,
    engine: Arc<CommandEngine>,
    greeter: Arc<GreetingTracker>,
}

impl ChatLink {
    /// Opens the IRC connection described by `config`. The returned client is passed to
    /// [`ChatLink::new`] once the engine (which needs the client's sender) exists.
    pub async fn connect_client(config: &BotConfig) -> Result<TwitchIrcClient, Error> {
        let client = TwitchIrcClient::connect(
            &config.irc_host,
            config.irc_port,
            config.irc_tls,
            &config.bot_username,
            &config.oauth_token,
        )
        .await
        .map_err(|e| {
            error!("Error connecting to Twitch IRC => {}", e);
            Error::Platform(format!("Twitch IRC connect failed: {e}"))
        })?;
        Ok(client)
    }

    pub fn new(
        client: TwitchIrcClient,
        channel_target: &str,
        engine: Arc<CommandEngine>,
        greeter: Arc<GreetingTracker>,
    ) -> Self {
        let chat = client.sender(channel_target);
        Self { client, chat, engine, greeter }
    }

    pub fn sender(&self) -> IrcChatSender {
        self.chat.clone()
    }

    /// Joins the channel and announces the bot.
    pub async fn join(&self) -> Result<(), Error> {
        self.client.join_channel(self.chat.channel())?;
        info!("(ChatLink) joined {}", self.chat.channel());
        self.chat.send_message(JOIN_ANNOUNCEMENT).await
    }

    /// Reads until the connection drops or someone runs `!disconnect`.
    pub async fn run(&mut self) -> ChatLinkExit {
        let Some(mut incoming) = self.client.incoming.take() else {
            error!("(ChatLink) incoming channel already taken");
            return ChatLinkExit::ConnectionClosed;
        };

        while let Some(evt) = incoming.recv().await {
            if let Some(exit) = self.handle_event(evt).await {
                return exit;
            }
        }

        info!("(ChatLink) connection closed");
        ChatLinkExit::ConnectionClosed
    }

    /// Handles one inbound event; `Some` means the read loop should stop.
    pub async fn handle_event(&self, evt: IrcIncomingEvent) -> Option<ChatLinkExit> {
        if !evt.command.eq_ignore_ascii_case("PRIVMSG") {
            debug!("(ChatLink) ignoring {}", evt.command);
            return None;
        }
        let (Some(login), Some(text)) = (evt.user_name, evt.text) else {
            return None;
        };
        let shown = evt.display_name.as_deref().unwrap_or(&login);
        match self.handle_message(&login, shown, &text).await {
            CommandOutcome::Shutdown => Some(ChatLinkExit::ShutdownRequested),
            CommandOutcome::Handled | CommandOutcome::Ignored => None,
        }
    }

    /// Commands go to the engine; anything else may earn a greeting.
    ///
    /// `login` is the identity used for elevation and the seen-user set; `shown` is
    /// only used in the greeting text.
    pub async fn handle_message(&self, login: &str, shown: &str, text: &str) -> CommandOutcome {
        if text.trim_start().starts_with(COMMAND_MARKER) {
            return self.engine.handle_message(login, text).await;
        }

        if self.greeter.should_greet(login, text) {
            debug!("(ChatLink) greeting {}", login);
            if let Err(e) = self.chat.send_message(&GreetingTracker::greeting_for(shown)).await {
                error!("(ChatLink) failed to greet {}: {}", login, e);
            }
            return CommandOutcome::Handled;
        }
        CommandOutcome::Ignored
    }

    /// Gives the writer a moment to flush, then stops the connection tasks.
    pub async fn close(self) {
        if !self.client.is_closed() {
            tokio::time::sleep(DRAIN_GRACE).await;
        }
        self.client.shutdown();
    }
}
