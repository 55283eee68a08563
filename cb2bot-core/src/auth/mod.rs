// src/auth/mod.rs
//! OAuth authorization-code flow: the pending `state` token and the redirect handler.

pub mod callback;

use parking_lot::Mutex;
use rand::RngCore;

pub use callback::{handle_auth_callback, AuthQuery};

/// Holds the `state` value of the authorization flow currently in progress, if any.
#[derive(Debug, Default)]
pub struct AuthState {
    pending: Mutex<Option<String>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new flow, replacing any earlier one, and returns its 30-char hex state.
    pub fn begin(&self) -> String {
        let mut bytes = [0u8; 15];
        rand::rng().fill_bytes(&mut bytes);
        let state = hex::encode(bytes);
        *self.pending.lock() = Some(state.clone());
        state
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    pub fn matches(&self, presented: &str) -> bool {
        match self.pending.lock().as_deref() {
            Some(expected) => constant_time_eq(expected.as_bytes(), presented.as_bytes()),
            None => false,
        }
    }

    /// Consumes the pending state if `presented` matches it.
    pub fn complete(&self, presented: &str) -> bool {
        let mut pending = self.pending.lock();
        let ok = match pending.as_deref() {
            Some(expected) => constant_time_eq(expected.as_bytes(), presented.as_bytes()),
            None => false,
        };
        if ok {
            *pending = None;
        }
        ok
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_generates_fresh_hex_state() {
        let auth = AuthState::new();
        assert!(!auth.is_pending());
        let a = auth.begin();
        assert_eq!(a.len(), 30);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        let b = auth.begin();
        assert_ne!(a, b);
        assert!(!auth.matches(&a));
        assert!(auth.matches(&b));
    }

    #[test]
    fn complete_consumes_matching_state_only() {
        let auth = AuthState::new();
        assert!(!auth.complete("anything"));
        let state = auth.begin();
        assert!(!auth.complete("wrong"));
        assert!(auth.is_pending());
        assert!(auth.complete(&state));
        assert!(!auth.is_pending());
        assert!(!auth.complete(&state));
    }
}
