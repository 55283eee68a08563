use async_trait::async_trait;

use crate::error::Error;

/// Anything that can post a line of text into the bot's chat channel.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<(), Error>;
}
