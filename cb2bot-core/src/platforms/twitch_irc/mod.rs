pub mod client;
pub mod runtime;

pub use client::{IrcChatSender, IrcIncomingEvent, TwitchIrcClient};
pub use runtime::{ChatLink, ChatLinkExit, JOIN_ANNOUNCEMENT};
