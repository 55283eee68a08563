// File: cb2bot-core/src/platforms/twitch/requests/users.rs

use serde::Deserialize;
use tracing::warn;

use crate::Error;
use crate::platforms::twitch::client::TwitchHelixClient;

/// Response from `GET /helix/users`.
#[derive(Debug, Deserialize)]
pub struct UsersResponse {
    pub data: Vec<UserData>,
}

#[derive(Debug, Deserialize)]
pub struct UserData {
    pub id: String,
    pub login: String,
    pub display_name: String,
}

impl TwitchHelixClient {
    /// Looks up the numeric id for a login name. Returns `Ok(None)` for unknown users.
    pub async fn fetch_user_id(&self, login: &str) -> Result<Option<String>, Error> {
        let login = login.trim().trim_start_matches('#');
        if login.is_empty() {
            warn!("fetch_user_id called with an empty login");
            return Ok(None);
        }

        let url = format!("{}/users", self.helix_base);
        let req = self.http.get(&url).query(&[("login", login)]);
        let resp = self.authorized(req).await?.send().await?;
        let resp = self.check_status("fetch_user_id", resp).await?;

        let users: UsersResponse = resp.json().await?;
        Ok(users.data.into_iter().next().map(|u| u.id))
    }
}
