pub mod daily_reset;

pub use daily_reset::{run_daily_reset, spawn_daily_reset_task};
