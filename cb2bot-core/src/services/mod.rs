// File: src/services/mod.rs

pub mod builtin_commands;
pub mod command_engine;
pub mod cooldown;
pub mod greeter;
pub mod shutdown;

pub use builtin_commands::BuiltinCommand;
pub use command_engine::{
    CommandEngine, CommandOutcome, CommandStatsSnapshot, DenyReason, EngineSettings, ParsedCommand,
    Resolution,
};
pub use cooldown::CooldownRegistry;
pub use greeter::GreetingTracker;
pub use shutdown::graceful_shutdown;
