// File: cb2bot-core/src/services/greeter.rs
//! Says hi once per chatter per day.

use std::collections::HashSet;

use parking_lot::Mutex;

/// Words that count as someone saying hello.
pub const GREETINGS: &[&str] = &["hi", "hello", "heyo", "yo", "hey", "salut", "suh"];

#[derive(Debug, Default)]
pub struct GreetingTracker {
    seen_users: Mutex<HashSet<String>>,
}

impl GreetingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `text`, lowercased, contains any of [`GREETINGS`] anywhere.
    pub fn is_greeting(text: &str) -> bool {
        let lower = text.to_lowercase();
        GREETINGS.iter().any(|g| lower.contains(g))
    }

    /// Decides whether `user` should be greeted for `text`, recording them if so.
    ///
    /// The check and the insert happen under one lock, so the daily reset can never
    /// interleave between them.
    pub fn should_greet(&self, user: &str, text: &str) -> bool {
        if !Self::is_greeting(text) {
            return false;
        }
        self.seen_users.lock().insert(user.to_lowercase())
    }

    pub fn has_seen(&self, user: &str) -> bool {
        self.seen_users.lock().contains(&user.to_lowercase())
    }

    /// Forgets everyone; returns how many users had been greeted.
    pub fn reset(&self) -> usize {
        let mut seen = self.seen_users.lock();
        let count = seen.len();
        seen.clear();
        count
    }

    pub fn greeting_for(user: &str) -> String {
        format!("Hi {} :)", user)
    }
}
