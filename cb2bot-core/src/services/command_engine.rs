// File: cb2bot-core/src/services/command_engine.rs

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info};

use cb2bot_common::traits::{ChatSink, CommandRepository, TwitchApi};

use crate::auth::AuthState;
use crate::config::BotConfig;
use crate::services::builtin_commands::BuiltinCommand;
use crate::services::cooldown::CooldownRegistry;

pub const COMMAND_MARKER: char = '!';

/// A `!name rest...` chat line split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Case-folded command name, without the marker.
    pub name: String,
    /// Everything after the name, leading whitespace removed.
    pub rest: String,
}

impl ParsedCommand {
    /// `None` when the text does not start with the marker or has no name.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix(COMMAND_MARKER)?;
        let (name, rest) = split_first_word(body);
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_lowercase(),
            rest: rest.to_string(),
        })
    }

    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.rest.split_whitespace()
    }
}

/// Splits off the first whitespace-delimited word; the remainder keeps its inner spacing.
pub(crate) fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim_start()),
        None => (s, ""),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Stored command marked elevated-only, caller is not elevated.
    Unauthorized,
    /// Stored command still inside its cooldown window.
    OnCooldown,
    /// Built-in invoked by a non-elevated caller.
    BuiltinUnauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Reply(String),
    Builtin(BuiltinCommand),
    Denied(DenyReason),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Handled,
    Ignored,
    /// `!disconnect`: the caller should run the shutdown sequence.
    Shutdown,
}

#[derive(Debug, Default)]
pub struct CommandStats {
    replied: AtomicU64,
    builtins_run: AtomicU64,
    unknown: AtomicU64,
    unauthorized: AtomicU64,
    on_cooldown: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandStatsSnapshot {
    pub replied: u64,
    pub builtins_run: u64,
    pub unknown: u64,
    pub unauthorized: u64,
    pub on_cooldown: u64,
}

impl CommandStats {
    pub fn snapshot(&self) -> CommandStatsSnapshot {
        CommandStatsSnapshot {
            replied: self.replied.load(Ordering::Relaxed),
            builtins_run: self.builtins_run.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            unauthorized: self.unauthorized.load(Ordering::Relaxed),
            on_cooldown: self.on_cooldown.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// The parts of [`BotConfig`] the engine needs.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub elevated_users: HashSet<String>,
    pub cooldown_seconds: i64,
    /// Login of the channel the bot sits in; EventSub subscriptions target this user.
    pub channel_login: String,
}

impl EngineSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            elevated_users: config.mods.clone(),
            cooldown_seconds: config.cooldown_seconds,
            channel_login: config.channel.clone(),
        }
    }
}

/// Resolves `!commands` against the stored table first and the built-in table second.
pub struct CommandEngine {
    pub(crate) repo: Arc<dyn CommandRepository>,
    pub(crate) cooldowns: Arc<CooldownRegistry>,
    pub(crate) twitch: Arc<dyn TwitchApi>,
    pub(crate) chat: Arc<dyn ChatSink>,
    pub(crate) auth: Arc<AuthState>,
    pub(crate) settings: EngineSettings,
    stats: CommandStats,
}

impl CommandEngine {
    pub fn new(
        repo: Arc<dyn CommandRepository>,
        cooldowns: Arc<CooldownRegistry>,
        twitch: Arc<dyn TwitchApi>,
        chat: Arc<dyn ChatSink>,
        auth: Arc<AuthState>,
        settings: EngineSettings,
    ) -> Self {
        debug!(
            "Initializing CommandEngine: {} elevated user(s), cooldown={}s",
            settings.elevated_users.len(),
            settings.cooldown_seconds
        );
        Self {
            repo,
            cooldowns,
            twitch,
            chat,
            auth,
            settings,
            stats: CommandStats::default(),
        }
    }

    pub fn is_elevated(&self, user: &str) -> bool {
        self.settings.elevated_users.contains(&user.to_lowercase())
    }

    pub fn stats(&self) -> CommandStatsSnapshot {
        self.stats.snapshot()
    }

    /// Decides what `sender` gets for `cmd`. The only side effect is the cooldown check.
    pub async fn resolve(&self, sender: &str, cmd: &ParsedCommand) -> Resolution {
        let elevated = self.is_elevated(sender);

        let stored = match self.repo.find(&cmd.name).await {
            Ok(found) => found,
            Err(e) => {
                error!("Command lookup for '{}' failed: {}", cmd.name, e);
                None
            }
        };

        if let Some(stored) = stored {
            if elevated {
                return Resolution::Reply(stored.template);
            }
            if stored.requires_elevated {
                return Resolution::Denied(DenyReason::Unauthorized);
            }
            if !self.cooldowns.try_fire(&stored.name, self.settings.cooldown_seconds) {
                return Resolution::Denied(DenyReason::OnCooldown);
            }
            return Resolution::Reply(stored.template);
        }

        match BuiltinCommand::from_name(&cmd.name) {
            Some(builtin) if builtin.requires_elevation() && !elevated => {
                Resolution::Denied(DenyReason::BuiltinUnauthorized)
            }
            Some(builtin) => Resolution::Builtin(builtin),
            None => Resolution::NotFound,
        }
    }

    /// Handles one chat message. Text without the marker is ignored.
    pub async fn handle_message(&self, sender: &str, text: &str) -> CommandOutcome {
        let Some(cmd) = ParsedCommand::parse(text) else {
            return CommandOutcome::Ignored;
        };

        match self.resolve(sender, &cmd).await {
            Resolution::Reply(template) => {
                CommandStats::bump(&self.stats.replied);
                debug!("'{}' from {} => reply", cmd.name, sender);
                self.say(&template).await;
                CommandOutcome::Handled
            }
            Resolution::Builtin(builtin) => {
                CommandStats::bump(&self.stats.builtins_run);
                info!("{} ran built-in '{}'", sender, builtin.name());
                self.run_builtin(builtin, &cmd).await
            }
            Resolution::Denied(reason) => {
                match reason {
                    DenyReason::OnCooldown => {
                        CommandStats::bump(&self.stats.on_cooldown);
                        debug!("'{}' from {} denied: on cooldown", cmd.name, sender);
                    }
                    DenyReason::Unauthorized | DenyReason::BuiltinUnauthorized => {
                        CommandStats::bump(&self.stats.unauthorized);
                        info!("'{}' from {} denied: not elevated ({:?})", cmd.name, sender, reason);
                    }
                }
                CommandOutcome::Ignored
            }
            Resolution::NotFound => {
                CommandStats::bump(&self.stats.unknown);
                debug!("Unknown command '{}' from {}", cmd.name, sender);
                CommandOutcome::Ignored
            }
        }
    }

    pub(crate) async fn say(&self, text: &str) {
        if let Err(e) = self.chat.send_message(text).await {
            error!("Failed to send chat message: {}", e);
        }
    }
}
