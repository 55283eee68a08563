// File: cb2bot-core/src/services/cooldown.rs

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::debug;

/// Last allowed use of one command by a non-elevated chatter.
#[derive(Debug, Clone)]
pub struct CooldownState {
    pub command_name: String,
    pub interval_seconds: i64,
    pub last_fired_at: DateTime<Utc>,
}

/// Per-command fixed window measured from the last *allowed* use.
///
/// A denied attempt never moves the window, and idle time does not bank extra uses.
#[derive(Debug, Default)]
pub struct CooldownRegistry {
    states: Mutex<HashMap<String, CooldownState>>,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_fire(&self, command_name: &str, interval_seconds: i64) -> bool {
        self.try_fire_at(command_name, interval_seconds, Utc::now())
    }

    pub fn try_fire_at(&self, command_name: &str, interval_seconds: i64, now: DateTime<Utc>) -> bool {
        let key = command_name.to_lowercase();
        let mut states = self.states.lock();

        match states.get_mut(&key) {
            None => {
                states.insert(
                    key.clone(),
                    CooldownState {
                        command_name: key,
                        interval_seconds,
                        last_fired_at: now,
                    },
                );
                true
            }
            Some(state) => {
                state.interval_seconds = interval_seconds;
                if now > state.last_fired_at + Duration::seconds(interval_seconds) {
                    state.last_fired_at = now;
                    true
                } else {
                    debug!(
                        "'{}' on cooldown, {}s left",
                        state.command_name,
                        (state.last_fired_at + Duration::seconds(interval_seconds) - now).num_seconds()
                    );
                    false
                }
            }
        }
    }

    pub fn state_for(&self, command_name: &str) -> Option<CooldownState> {
        self.states.lock().get(&command_name.to_lowercase()).cloned()
    }
}
