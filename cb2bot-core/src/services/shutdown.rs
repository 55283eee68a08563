// File: cb2bot-core/src/services/shutdown.rs

use tracing::{error, info};

use cb2bot_common::traits::{ChatSink, TwitchApi};

pub const FAREWELL_MESSAGE: &str = "/me goes to sleep ResidentSleeper";

/// Drops every EventSub subscription, then says goodbye in chat.
///
/// A failing step is logged and the next one still runs.
pub async fn graceful_shutdown(twitch: &dyn TwitchApi, chat: &dyn ChatSink) {
    info!("Shutting down: removing EventSub subscriptions");
    match twitch.delete_all_subscriptions().await {
        Ok(n) => info!("Deleted {} EventSub subscription(s)", n),
        Err(e) => error!("Could not delete EventSub subscriptions: {}", e),
    }

    if let Err(e) = chat.send_message(FAREWELL_MESSAGE).await {
        error!("Could not send farewell message: {}", e);
    }
}
