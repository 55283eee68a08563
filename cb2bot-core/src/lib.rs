// src/lib.rs

pub mod config;
pub mod db;
pub mod repositories;
pub mod platforms;
pub mod crypto;
pub mod auth;
pub mod tasks;
pub mod cache;
pub mod services;

pub use config::BotConfig;
pub use db::Database;
pub use cb2bot_common::error::Error;
