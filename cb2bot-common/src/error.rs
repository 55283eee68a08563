// File: cb2bot-common/src/error.rs
//! The one error type shared by every cb2bot crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Twitch (Helix or IRC) refused or could not be reached.
    #[error("platform: {0}")]
    Platform(String),

    /// OAuth state or token exchange failed.
    #[error("auth: {0}")]
    Auth(String),

    /// A required setting is missing or out of range.
    #[error("config: {0}")]
    Config(String),
}
