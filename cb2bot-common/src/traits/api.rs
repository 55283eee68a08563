use async_trait::async_trait;

use crate::error::Error;
use crate::models::{EventSubTopic, SubscriptionInfo};

/// The Helix / OAuth calls the bot makes. Each is a single request/response round trip.
#[async_trait]
pub trait TwitchApi: Send + Sync {
    /// Resolves a login name to its numeric user id, `None` if the user does not exist.
    async fn get_user_id(&self, login: &str) -> Result<Option<String>, Error>;

    async fn create_subscription(&self, topic: EventSubTopic, broadcaster_id: &str) -> Result<(), Error>;

    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionInfo>, Error>;

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), Error>;

    /// Deletes every subscription owned by the app and returns how many were removed.
    /// Individual delete failures are skipped and not counted.
    async fn delete_all_subscriptions(&self) -> Result<usize, Error> {
        let subs = self.list_subscriptions().await?;
        let mut deleted = 0;
        for sub in subs {
            if self.delete_subscription(&sub.id).await.is_ok() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// URL the streamer opens to grant the bot its scopes.
    fn authorization_url(&self, state: &str) -> String;

    async fn exchange_code(&self, code: &str) -> Result<(), Error>;
}
