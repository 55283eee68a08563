use std::fmt;

use serde::{Deserialize, Serialize};

/// EventSub topics the bot knows how to subscribe to and announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSubTopic {
    Follow,
    Subscribe,
    Cheer,
}

impl EventSubTopic {
    /// The `type` string Twitch uses for this topic.
    pub fn as_type(&self) -> &'static str {
        match self {
            EventSubTopic::Follow => "channel.follow",
            EventSubTopic::Subscribe => "channel.subscribe",
            EventSubTopic::Cheer => "channel.cheer",
        }
    }

    pub fn from_type(s: &str) -> Option<Self> {
        match s {
            "channel.follow" => Some(EventSubTopic::Follow),
            "channel.subscribe" => Some(EventSubTopic::Subscribe),
            "channel.cheer" => Some(EventSubTopic::Cheer),
            _ => None,
        }
    }
}

impl fmt::Display for EventSubTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_type())
    }
}

/// One row of `GET /helix/eventsub/subscriptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub sub_type: String,
    pub status: String,
}
