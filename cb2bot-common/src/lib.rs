// cb2bot-common/src/lib.rs
//! Shared error type, models and trait seams used by the core and server crates.

pub mod error;
pub mod models;
pub mod traits;

pub use error::Error;
