// File: cb2bot-common/src/models/mod.rs
pub mod command;
pub mod eventsub;

pub use command::StoredCommand;
pub use eventsub::{EventSubTopic, SubscriptionInfo};
