// File: cb2bot-core/src/platforms/twitch_eventsub/events.rs

use serde::Deserialize;

use cb2bot_common::models::EventSubTopic;

/// Top-level JSON body of an EventSub webhook delivery. Every field is optional:
/// a bare `{"challenge": ...}` or `{"event": {...}}` is accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventSubEnvelope {
    #[serde(default)]
    pub subscription: Option<EnvelopeSubscription>,
    #[serde(default)]
    pub event: Option<serde_json::Value>,
    /// Present only on `webhook_callback_verification`.
    #[serde(default)]
    pub challenge: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvelopeSubscription {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub sub_type: String,
    #[serde(default)]
    pub status: String,
}

/// "channel.follow"
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelFollow {
    pub user_id: Option<String>,
    pub user_login: Option<String>,
    pub user_name: String,
    pub broadcaster_user_name: Option<String>,
}

/// "channel.subscribe"
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSubscribe {
    pub user_name: String,
    pub broadcaster_user_name: Option<String>,
    /// "1000", "2000" or "3000".
    pub tier: String,
    #[serde(default)]
    pub is_gift: bool,
}

/// "channel.cheer"
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelCheer {
    pub is_anonymous: bool,
    pub user_name: Option<String>,
    pub broadcaster_user_name: Option<String>,
    pub bits: u64,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub enum EventSubNotification {
    Follow(ChannelFollow),
    Subscribe(ChannelSubscribe),
    Cheer(ChannelCheer),
}

impl EventSubNotification {
    /// The chat line announcing this event.
    pub fn announcement(&self) -> String {
        match self {
            EventSubNotification::Follow(f) => format!("Thank you for following {}!", f.user_name),
            EventSubNotification::Subscribe(s) => format!(
                "{} subscribed at tier {}! Thank you for the support!",
                s.user_name,
                display_tier(&s.tier)
            ),
            EventSubNotification::Cheer(c) => {
                let who = match (&c.user_name, c.is_anonymous) {
                    (Some(name), false) => name.as_str(),
                    _ => "Anonymous",
                };
                format!("{} cheered {} bits! Thank you for the support!", who, c.bits)
            }
        }
    }
}

/// "1000" => "1". Anything non-numeric is shown as-is.
fn display_tier(tier: &str) -> String {
    match tier.parse::<u32>() {
        Ok(n) => (n / 1000).to_string(),
        Err(_) => tier.to_string(),
    }
}

/// Parses the `event` object for the topics the bot announces. `None` for other
/// subscription types or a payload that does not match.
pub fn parse_twitch_notification(
    sub_type: &str,
    event_json: &serde_json::Value,
) -> Option<EventSubNotification> {
    match EventSubTopic::from_type(sub_type)? {
        EventSubTopic::Follow => serde_json::from_value::<ChannelFollow>(event_json.clone())
            .ok()
            .map(EventSubNotification::Follow),
        EventSubTopic::Subscribe => serde_json::from_value::<ChannelSubscribe>(event_json.clone())
            .ok()
            .map(EventSubNotification::Subscribe),
        EventSubTopic::Cheer => serde_json::from_value::<ChannelCheer>(event_json.clone())
            .ok()
            .map(EventSubNotification::Cheer),
    }
}
