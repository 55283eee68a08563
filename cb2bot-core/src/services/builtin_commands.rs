// File: cb2bot-core/src/services/builtin_commands.rs
//! Moderator commands compiled into the bot.

use tracing::{error, info, warn};

use cb2bot_common::models::{EventSubTopic, StoredCommand};

use crate::services::command_engine::{
    split_first_word, CommandEngine, CommandOutcome, ParsedCommand, COMMAND_MARKER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinCommand {
    Shoutout,
    AddCommand,
    DeleteCommand,
    EventSubFollow,
    EventSubSubscribe,
    NukeEventSubs,
    Disconnect,
    Auth,
}

impl BuiltinCommand {
    pub const ALL: [BuiltinCommand; 8] = [
        BuiltinCommand::Shoutout,
        BuiltinCommand::AddCommand,
        BuiltinCommand::DeleteCommand,
        BuiltinCommand::EventSubFollow,
        BuiltinCommand::EventSubSubscribe,
        BuiltinCommand::NukeEventSubs,
        BuiltinCommand::Disconnect,
        BuiltinCommand::Auth,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        Self::ALL.into_iter().find(|b| b.name() == lower)
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinCommand::Shoutout => "so",
            BuiltinCommand::AddCommand => "addcom",
            BuiltinCommand::DeleteCommand => "delcom",
            BuiltinCommand::EventSubFollow => "esfollow",
            BuiltinCommand::EventSubSubscribe => "essub",
            BuiltinCommand::NukeEventSubs => "nukeeventsubs",
            BuiltinCommand::Disconnect => "disconnect",
            BuiltinCommand::Auth => "auth",
        }
    }

    pub fn requires_elevation(self) -> bool {
        true
    }
}

pub fn shoutout_text(user: &str) -> String {
    format!("Check out {0} at https://twitch.tv/{0} !", user)
}

/// `[mod] <name> <template...>` => (name, template, mod flag). `None` if name or template is missing.
pub fn parse_addcom_args(rest: &str) -> Option<(String, String, bool)> {
    let (first, after_first) = split_first_word(rest);
    let (requires_elevated, name, template) = if first.eq_ignore_ascii_case("mod") {
        let (name, template) = split_first_word(after_first);
        (true, name, template)
    } else {
        (false, first, after_first)
    };

    let name = name.trim_start_matches(COMMAND_MARKER);
    if name.is_empty() || template.trim().is_empty() {
        return None;
    }
    Some((name.to_lowercase(), template.trim_end().to_string(), requires_elevated))
}

impl CommandEngine {
    pub(crate) async fn run_builtin(&self, builtin: BuiltinCommand, cmd: &ParsedCommand) -> CommandOutcome {
        match builtin {
            BuiltinCommand::Shoutout => {
                let Some(target) = cmd.args().next() else {
                    warn!("!so without a user name");
                    return CommandOutcome::Ignored;
                };
                let target = target.trim_start_matches('@');
                self.say(&shoutout_text(target)).await;
            }
            BuiltinCommand::AddCommand => {
                let Some((name, template, requires_elevated)) = parse_addcom_args(&cmd.rest) else {
                    warn!("!addcom needs a name and a response");
                    return CommandOutcome::Ignored;
                };
                let stored = StoredCommand::new(&name, &template, requires_elevated);
                match self.repo.insert(&stored).await {
                    Ok(true) => info!("Added command '{}' (mod_only={})", stored.name, requires_elevated),
                    Ok(false) => info!("Command '{}' already exists; left unchanged", stored.name),
                    Err(e) => error!("Failed to add command '{}': {}", stored.name, e),
                }
            }
            BuiltinCommand::DeleteCommand => {
                let Some(name) = cmd.args().next() else {
                    warn!("!delcom without a command name");
                    return CommandOutcome::Ignored;
                };
                let name = name.trim_start_matches(COMMAND_MARKER).to_lowercase();
                match self.repo.remove(&name).await {
                    Ok(()) => info!("Removed command '{}'", name),
                    Err(e) => error!("Failed to remove command '{}': {}", name, e),
                }
            }
            BuiltinCommand::EventSubFollow => {
                self.subscribe_channel(&[EventSubTopic::Follow]).await;
            }
            BuiltinCommand::EventSubSubscribe => {
                self.subscribe_channel(&[EventSubTopic::Subscribe, EventSubTopic::Cheer]).await;
            }
            BuiltinCommand::NukeEventSubs => match self.twitch.delete_all_subscriptions().await {
                Ok(n) => info!("Deleted {} EventSub subscription(s)", n),
                Err(e) => error!("Failed to delete EventSub subscriptions: {}", e),
            },
            BuiltinCommand::Auth => {
                let state = self.auth.begin();
                let url = self.twitch.authorization_url(&state);
                info!("Open this URL to authorize the bot: {}", url);
            }
            BuiltinCommand::Disconnect => {
                info!("Disconnect requested");
                return CommandOutcome::Shutdown;
            }
        }
        CommandOutcome::Handled
    }

    async fn subscribe_channel(&self, topics: &[EventSubTopic]) {
        let login = &self.settings.channel_login;
        let broadcaster_id = match self.twitch.get_user_id(login).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!("No Twitch user named '{}'; cannot subscribe", login);
                return;
            }
            Err(e) => {
                error!("User lookup for '{}' failed: {}", login, e);
                return;
            }
        };

        for topic in topics {
            match self.twitch.create_subscription(*topic, &broadcaster_id).await {
                Ok(()) => info!("Requested {} subscription for {}", topic, login),
                Err(e) => error!("Creating {} subscription failed: {}", topic, e),
            }
        }
    }
}
