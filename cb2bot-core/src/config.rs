//! src/config.rs
//!
//! Runtime configuration, read from environment variables (usually loaded from
//! `config.env` by the server binary before this runs).

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;

use crate::Error;

pub const DEFAULT_IRC_HOST: &str = "irc.chat.twitch.tv";
pub const DEFAULT_IRC_TLS_PORT: u16 = 6697;
pub const DEFAULT_DEDUP_RETENTION_SECS: i64 = 600;
/// Upper bound for `COOLDOWN` and `DEDUP_RETENTION_SECS`: one year.
pub const MAX_WINDOW_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Clone)]
pub struct BotConfig {
    pub bot_username: String,
    /// Channel login without the leading `#`.
    pub channel: String,
    pub client_id: String,
    pub client_secret: String,
    /// Shared secret for EventSub webhook signatures.
    pub eventsub_secret: String,
    /// Public URL Twitch posts notifications and OAuth redirects to.
    pub callback_url: String,
    pub cooldown_seconds: i64,
    pub db_path: String,
    pub http_port: u16,
    /// Chat password, always carrying the `oauth:` prefix.
    pub oauth_token: String,
    /// Case-folded logins allowed to run restricted commands.
    pub mods: HashSet<String>,
    pub irc_host: String,
    pub irc_port: u16,
    pub irc_tls: bool,
    pub dedup_retention_secs: i64,
    pub reset_timezone: Tz,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, Error> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("missing required variable {}", key)))
        };

        let client_secret = required("SECRET")?;
        let eventsub_secret = lookup("EVENTSUB_SECRET")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| client_secret.clone());

        let oauth_raw = required("OAUTH")?;
        let oauth_token = if oauth_raw.starts_with("oauth:") {
            oauth_raw
        } else {
            format!("oauth:{}", oauth_raw)
        };

        let irc_tls = match lookup("IRC_TLS") {
            Some(v) => parse_bool("IRC_TLS", &v)?,
            None => true,
        };
        let irc_port = match lookup("IRC_PORT") {
            Some(v) => parse_number("IRC_PORT", &v)?,
            None if irc_tls => DEFAULT_IRC_TLS_PORT,
            None => 6667,
        };

        let reset_timezone = match lookup("RESET_TIMEZONE") {
            Some(raw) if !raw.trim().is_empty() => Tz::from_str(raw.trim()).map_err(|e| {
                Error::Config(format!("RESET_TIMEZONE '{}' is not a known time zone: {}", raw, e))
            })?,
            _ => Tz::UTC,
        };

        Ok(Self {
            bot_username: required("BOT_USERNAME")?,
            channel: required("CHANNEL")?.trim_start_matches('#').to_lowercase(),
            client_id: required("CLIENT_ID")?,
            client_secret,
            eventsub_secret,
            callback_url: required("CALLBACK")?,
            cooldown_seconds: parse_window("COOLDOWN", &required("COOLDOWN")?, 0)?,
            db_path: required("DB")?,
            http_port: parse_number("HTTP_PORT", &required("HTTP_PORT")?)?,
            oauth_token,
            mods: parse_mods(&lookup("MODS").unwrap_or_default()),
            irc_host: lookup("IRC_HOST").unwrap_or_else(|| DEFAULT_IRC_HOST.to_string()),
            irc_port,
            irc_tls,
            dedup_retention_secs: match lookup("DEDUP_RETENTION_SECS") {
                Some(v) => parse_window("DEDUP_RETENTION_SECS", &v, 1)?,
                None => DEFAULT_DEDUP_RETENTION_SECS,
            },
            reset_timezone,
        })
    }

    /// IRC target for the configured channel, e.g. `#somechannel`.
    pub fn channel_target(&self) -> String {
        format!("#{}", self.channel)
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_username", &self.bot_username)
            .field("channel", &self.channel)
            .field("client_id", &self.client_id)
            .field("callback_url", &self.callback_url)
            .field("cooldown_seconds", &self.cooldown_seconds)
            .field("db_path", &self.db_path)
            .field("http_port", &self.http_port)
            .field("mods", &self.mods)
            .field("irc_host", &self.irc_host)
            .field("irc_port", &self.irc_port)
            .field("irc_tls", &self.irc_tls)
            .field("dedup_retention_secs", &self.dedup_retention_secs)
            .field("reset_timezone", &self.reset_timezone)
            .finish_non_exhaustive()
    }
}

/// `MODS` may be separated by commas, whitespace, or both.
pub fn parse_mods(raw: &str) -> HashSet<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(|s| s.trim().trim_start_matches('@').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, Error> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, raw)))
}

/// A duration in seconds within `min..=MAX_WINDOW_SECS`.
fn parse_window(key: &str, raw: &str, min: i64) -> Result<i64, Error> {
    let secs: i64 = parse_number(key, raw)?;
    if !(min..=MAX_WINDOW_SECS).contains(&secs) {
        return Err(Error::Config(format!(
            "{} must be between {} and {} seconds, got {}",
            key, min, MAX_WINDOW_SECS, secs
        )));
    }
    Ok(secs)
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, Error> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{} must be true/false, got '{}'", key, other))),
    }
}
