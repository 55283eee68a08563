// File: cb2bot-core/src/platforms/twitch_eventsub/mod.rs

pub mod events;
pub mod webhook;

pub use events::{parse_twitch_notification, EventSubNotification};
pub use webhook::{serve_webhook, webhook_router, WebhookState};
