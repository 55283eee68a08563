// File: cb2bot-core/src/platforms/twitch/client.rs

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, StatusCode};
use tokio::sync::Mutex;
use tracing::warn;

use cb2bot_common::models::{EventSubTopic, SubscriptionInfo};
use cb2bot_common::traits::TwitchApi;

use crate::config::BotConfig;
use crate::Error;

pub const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";
pub const OAUTH_BASE_URL: &str = "https://id.twitch.tv/oauth2";

/// Scopes requested from the streamer so `channel.subscribe` and `channel.cheer`
/// subscriptions are allowed.
pub const AUTH_SCOPES: &[&str] = &["channel:read:subscriptions", "bits:read"];

/// Small wrapper client for the Helix and OAuth endpoints the bot uses.
///
/// The endpoint calls themselves live in `requests::*` as further `impl` blocks.
pub struct TwitchHelixClient {
    pub(crate) http: ReqwestClient,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) eventsub_secret: String,
    pub(crate) callback_url: String,
    pub(crate) helix_base: String,
    pub(crate) oauth_base: String,
    /// Cached app access token; cleared when Helix answers 401.
    pub(crate) app_token: Mutex<Option<String>>,
    /// User token obtained from the last successful code exchange.
    pub(crate) user_token: Mutex<Option<String>>,
}

impl TwitchHelixClient {
    pub fn new(config: &BotConfig) -> Self {
        Self::with_base_urls(config, HELIX_BASE_URL, OAUTH_BASE_URL)
    }

    pub fn with_base_urls(config: &BotConfig, helix_base: &str, oauth_base: &str) -> Self {
        Self {
            http: ReqwestClient::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            eventsub_secret: config.eventsub_secret.clone(),
            callback_url: config.callback_url.clone(),
            helix_base: helix_base.trim_end_matches('/').to_string(),
            oauth_base: oauth_base.trim_end_matches('/').to_string(),
            app_token: Mutex::new(None),
            user_token: Mutex::new(None),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub async fn has_user_token(&self) -> bool {
        self.user_token.lock().await.is_some()
    }

    /// Adds `Client-Id` and the app bearer token to a Helix request.
    pub(crate) async fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, Error> {
        let token = self.app_access_token().await?;
        Ok(req
            .header("Client-Id", &self.client_id)
            .header("Authorization", format!("Bearer {}", token)))
    }

    /// Turns a non-2xx response into `Error::Platform`, dropping the cached app token on 401.
    pub(crate) async fn check_status(&self, what: &str, resp: Response) -> Result<Response, Error> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            *self.app_token.lock().await = None;
        }
        let body_text = resp.text().await.unwrap_or_default();
        warn!("{} => status={} body={}", what, status, body_text);
        Err(Error::Platform(format!(
            "Twitch API error: HTTP {} => {}",
            status, body_text
        )))
    }
}

#[async_trait]
impl TwitchApi for TwitchHelixClient {
    async fn get_user_id(&self, login: &str) -> Result<Option<String>, Error> {
        self.fetch_user_id(login).await
    }

    async fn create_subscription(&self, topic: EventSubTopic, broadcaster_id: &str) -> Result<(), Error> {
        self.create_eventsub_subscription(topic, broadcaster_id).await
    }

    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionInfo>, Error> {
        self.fetch_eventsub_subscriptions().await
    }

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), Error> {
        self.delete_eventsub_subscription(subscription_id).await
    }

    fn authorization_url(&self, state: &str) -> String {
        self.build_auth_url(state)
    }

    async fn exchange_code(&self, code: &str) -> Result<(), Error> {
        self.exchange_authorization_code(code).await
    }
}
