// src/repositories/mod.rs

pub mod sqlite;

pub use cb2bot_common::traits::repository_traits::CommandRepository;
pub use sqlite::commands::SqliteCommandRepository;
