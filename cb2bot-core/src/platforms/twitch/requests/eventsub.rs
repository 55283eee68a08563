// File: cb2bot-core/src/platforms/twitch/requests/eventsub.rs
//! Create / list / delete EventSub subscriptions that deliver to our webhook.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use cb2bot_common::models::{EventSubTopic, SubscriptionInfo};

use crate::Error;
use crate::platforms::twitch::client::TwitchHelixClient;

/// Response from `GET /helix/eventsub/subscriptions`.
#[derive(Debug, Deserialize)]
pub struct SubscriptionsResponse {
    pub data: Vec<SubscriptionInfo>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, Default)]
pub struct Pagination {
    pub cursor: Option<String>,
}

impl TwitchHelixClient {
    pub async fn create_eventsub_subscription(
        &self,
        topic: EventSubTopic,
        broadcaster_id: &str,
    ) -> Result<(), Error> {
        let body = json!({
            "type": topic.as_type(),
            "version": "1",
            "condition": {
                "broadcaster_user_id": broadcaster_id
            },
            "transport": {
                "method": "webhook",
                "callback": self.callback_url,
                "secret": self.eventsub_secret
            }
        });

        let url = format!("{}/eventsub/subscriptions", self.helix_base);
        let req = self.http.post(&url).json(&body);
        let resp = self.authorized(req).await?.send().await?;
        let resp = self.check_status("create_eventsub_subscription", resp).await?;

        let text = resp.text().await.unwrap_or_default();
        debug!("Sub request response: {}", text);
        info!("Requested EventSub subscription {} for broadcaster {}", topic, broadcaster_id);
        Ok(())
    }

    /// Fetches every page of subscriptions owned by this app.
    pub async fn fetch_eventsub_subscriptions(&self) -> Result<Vec<SubscriptionInfo>, Error> {
        let url = format!("{}/eventsub/subscriptions", self.helix_base);
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut req = self.http.get(&url);
            if let Some(c) = cursor.as_deref() {
                req = req.query(&[("after", c)]);
            }
            let resp = self.authorized(req).await?.send().await?;
            let resp = self.check_status("fetch_eventsub_subscriptions", resp).await?;
            let page: SubscriptionsResponse = resp.json().await?;

            all.extend(page.data);
            match page.pagination.cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => break,
            }
        }

        debug!("Found {} EventSub subscriptions", all.len());
        Ok(all)
    }

    pub async fn delete_eventsub_subscription(&self, subscription_id: &str) -> Result<(), Error> {
        let url = format!("{}/eventsub/subscriptions", self.helix_base);
        let req = self.http.delete(&url).query(&[("id", subscription_id)]);
        let resp = self.authorized(req).await?.send().await?;
        self.check_status("delete_eventsub_subscription", resp).await?;
        info!("Unsubbed EventSub id {}", subscription_id);
        Ok(())
    }
}
