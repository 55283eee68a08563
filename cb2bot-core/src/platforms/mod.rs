// File: cb2bot-core/src/platforms/mod.rs

pub mod twitch;
pub mod twitch_eventsub;
pub mod twitch_irc;
