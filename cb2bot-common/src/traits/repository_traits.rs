use async_trait::async_trait;

use crate::error::Error;
use crate::models::StoredCommand;

/// Durable store of custom commands, keyed by case-folded name.
///
/// Every call commits or rolls back on its own; callers never see a half-written row.
#[async_trait]
pub trait CommandRepository: Send + Sync {
    async fn find(&self, name: &str) -> Result<Option<StoredCommand>, Error>;

    /// Returns `Ok(false)` when a command with that name already exists. The existing
    /// row is left untouched.
    async fn insert(&self, cmd: &StoredCommand) -> Result<bool, Error>;

    /// Removing a name that does not exist is not an error.
    async fn remove(&self, name: &str) -> Result<(), Error>;

    async fn list(&self) -> Result<Vec<StoredCommand>, Error>;
}
