// File: cb2bot-core/src/platforms/twitch/requests/token.rs
//! App access tokens (client-credentials grant) and the authorization-code exchange.

use serde::Deserialize;
use tracing::{debug, info};

use crate::Error;
use crate::platforms::twitch::client::{TwitchHelixClient, AUTH_SCOPES};

/// Matches Twitch's JSON from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Vec<String>,
    pub token_type: Option<String>,
}

impl TwitchHelixClient {
    /// Returns the cached app access token, fetching a new one when none is cached.
    pub async fn app_access_token(&self) -> Result<String, Error> {
        let mut cached = self.app_token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let url = format!("{}/token", self.oauth_base);
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];
        let resp = self.http.post(&url).form(&params).send().await?;
        let resp = if resp.status().is_success() {
            resp
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "app access token request failed: HTTP {} => {}",
                status, body
            )));
        };

        let parsed: TokenResponse = resp.json().await?;
        debug!("Fetched app access token (expires_in={:?})", parsed.expires_in);
        *cached = Some(parsed.access_token.clone());
        Ok(parsed.access_token)
    }

    pub fn build_auth_url(&self, state: &str) -> String {
        let scope_str = AUTH_SCOPES.join(" ");
        format!(
            "{base}/authorize?response_type=code&client_id={cid}\
             &redirect_uri={redir}&scope={scope}&state={st}",
            base  = self.oauth_base,
            cid   = urlencoding::encode(&self.client_id),
            redir = urlencoding::encode(&self.callback_url),
            scope = urlencoding::encode(&scope_str),
            st    = urlencoding::encode(state),
        )
    }

    /// Trades the `code` from the redirect for a user token and keeps it in memory.
    pub async fn exchange_authorization_code(&self, code: &str) -> Result<(), Error> {
        let url = format!("{}/token", self.oauth_base);
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.callback_url.as_str()),
        ];
        let resp = self.http.post(&url).form(&params).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "authorization code exchange failed: HTTP {} => {}",
                status, body
            )));
        }

        let parsed: TokenResponse = resp.json().await?;
        info!("Streamer authorized scopes: {:?}", parsed.scope);
        *self.user_token.lock().await = Some(parsed.access_token);
        Ok(())
    }
}
