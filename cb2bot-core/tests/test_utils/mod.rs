// tests/test_utils/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use cb2bot_common::models::{EventSubTopic, SubscriptionInfo};
use cb2bot_common::traits::{ChatSink, TwitchApi};
use cb2bot_core::auth::AuthState;
use cb2bot_core::repositories::SqliteCommandRepository;
use cb2bot_core::services::{CommandEngine, CooldownRegistry, EngineSettings};
use cb2bot_core::{Database, Error};

/// Collects every chat line instead of sending it anywhere.
#[derive(Default)]
pub struct RecordingChat {
    lines: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingChat {
    pub fn failing() -> Self {
        Self { lines: Mutex::new(Vec::new()), fail: true }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

#[async_trait]
impl ChatSink for RecordingChat {
    async fn send_message(&self, text: &str) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Platform("chat is down".into()));
        }
        self.lines.lock().push(text.to_string());
        Ok(())
    }
}

/// In-memory stand-in for Helix.
#[derive(Default)]
pub struct MockTwitchApi {
    pub user_ids: DashMap<String, String>,
    pub subscriptions: DashMap<String, SubscriptionInfo>,
    pub created: Mutex<Vec<(EventSubTopic, String)>>,
    pub exchanged_codes: Mutex<Vec<String>>,
    pub fail_list: bool,
    pub fail_exchange: bool,
}

impl MockTwitchApi {
    pub fn with_user(login: &str, id: &str) -> Self {
        let api = Self::default();
        api.user_ids.insert(login.to_string(), id.to_string());
        api
    }

    pub fn add_subscription(&self, id: &str, sub_type: &str) {
        self.subscriptions.insert(
            id.to_string(),
            SubscriptionInfo {
                id: id.to_string(),
                sub_type: sub_type.to_string(),
                status: "enabled".to_string(),
            },
        );
    }

    pub fn created(&self) -> Vec<(EventSubTopic, String)> {
        self.created.lock().clone()
    }
}

#[async_trait]
impl TwitchApi for MockTwitchApi {
    async fn get_user_id(&self, login: &str) -> Result<Option<String>, Error> {
        Ok(self.user_ids.get(login).map(|v| v.value().clone()))
    }

    async fn create_subscription(&self, topic: EventSubTopic, broadcaster_id: &str) -> Result<(), Error> {
        self.created.lock().push((topic, broadcaster_id.to_string()));
        let id = format!("sub-{}", self.subscriptions.len() + 1);
        self.add_subscription(&id, topic.as_type());
        Ok(())
    }

    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionInfo>, Error> {
        if self.fail_list {
            return Err(Error::Platform("Twitch API error: HTTP 500".into()));
        }
        Ok(self.subscriptions.iter().map(|e| e.value().clone()).collect())
    }

    async fn delete_subscription(&self, subscription_id: &str) -> Result<(), Error> {
        match self.subscriptions.remove(subscription_id) {
            Some(_) => Ok(()),
            None => Err(Error::Platform(format!("unknown subscription {}", subscription_id))),
        }
    }

    fn authorization_url(&self, state: &str) -> String {
        format!("https://id.example/authorize?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<(), Error> {
        if self.fail_exchange {
            return Err(Error::Auth("exchange refused".into()));
        }
        self.exchanged_codes.lock().push(code.to_string());
        Ok(())
    }
}

pub async fn memory_repo() -> Arc<SqliteCommandRepository> {
    let db = Database::in_memory().await.expect("in-memory sqlite");
    db.migrate().await.expect("migrations");
    Arc::new(SqliteCommandRepository::new(db.pool().clone()))
}

pub struct EngineHarness {
    pub engine: CommandEngine,
    pub chat: Arc<RecordingChat>,
    pub twitch: Arc<MockTwitchApi>,
    pub auth: Arc<AuthState>,
    pub repo: Arc<SqliteCommandRepository>,
}

/// Engine over an in-memory store, with `mods` elevated and the given cooldown.
pub async fn engine_harness(mods: &[&str], cooldown_seconds: i64, twitch: MockTwitchApi) -> EngineHarness {
    let repo = memory_repo().await;
    let chat = Arc::new(RecordingChat::default());
    let twitch = Arc::new(twitch);
    let auth = Arc::new(AuthState::new());
    let settings = EngineSettings {
        elevated_users: mods.iter().map(|m| m.to_lowercase()).collect(),
        cooldown_seconds,
        channel_login: "cb2chan".to_string(),
    };
    let engine = CommandEngine::new(
        repo.clone(),
        Arc::new(CooldownRegistry::new()),
        twitch.clone(),
        chat.clone(),
        auth.clone(),
        settings,
    );
    EngineHarness { engine, chat, twitch, auth, repo }
}
