// tests/helix_client_tests.rs
//! Drives `TwitchHelixClient` against a local stand-in for the Helix and OAuth endpoints.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use cb2bot_common::models::EventSubTopic;
use cb2bot_common::traits::TwitchApi;
use cb2bot_core::platforms::twitch::TwitchHelixClient;
use cb2bot_core::{BotConfig, Error};

#[derive(Default)]
struct Stub {
    token_requests: AtomicUsize,
    created: Mutex<Vec<Value>>,
    deleted: Mutex<Vec<String>>,
    reject_next_helix_call: Mutex<bool>,
}

type Shared = Arc<Stub>;

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers.get("Client-Id").map(|v| v == "cid").unwrap_or(false)
        && headers.get("Authorization").map(|v| v == "Bearer app-tok").unwrap_or(false)
}

async fn token(State(stub): State<Shared>, Form(form): Form<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    match form.get("grant_type").map(String::as_str) {
        Some("client_credentials") => {
            stub.token_requests.fetch_add(1, Ordering::SeqCst);
            (StatusCode::OK, Json(json!({"access_token": "app-tok", "expires_in": 3600, "token_type": "bearer"})))
        }
        Some("authorization_code") if form.get("code").map(String::as_str) == Some("good-code") => (
            StatusCode::OK,
            Json(json!({"access_token": "user-tok", "refresh_token": "r", "scope": ["bits:read"]})),
        ),
        _ => (StatusCode::BAD_REQUEST, Json(json!({"message": "Invalid authorization code"}))),
    }
}

async fn users(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad token"})));
    }
    let data = match q.get("login").map(String::as_str) {
        Some("cb2chan") => json!([{"id": "4242", "login": "cb2chan", "display_name": "CB2Chan"}]),
        _ => json!([]),
    };
    (StatusCode::OK, Json(json!({ "data": data })))
}

async fn list_subs(
    State(stub): State<Shared>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    {
        let mut reject = stub.reject_next_helix_call.lock();
        if *reject {
            *reject = false;
            return (StatusCode::UNAUTHORIZED, Json(json!({"message": "expired"})));
        }
    }
    if !bearer_ok(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad token"})));
    }
    let page = match q.get("after").map(String::as_str) {
        None => json!({
            "data": [{"id": "a", "type": "channel.follow", "status": "enabled", "version": "1"}],
            "pagination": {"cursor": "page2"}
        }),
        Some("page2") => json!({
            "data": [
                {"id": "b", "type": "channel.cheer", "status": "enabled", "version": "1"},
                {"id": "broken", "type": "channel.subscribe", "status": "enabled", "version": "1"}
            ],
            "pagination": {}
        }),
        Some(_) => json!({"data": [], "pagination": {}}),
    };
    (StatusCode::OK, Json(page))
}

async fn create_sub(State(stub): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> StatusCode {
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    stub.created.lock().push(body);
    StatusCode::ACCEPTED
}

async fn delete_sub(State(stub): State<Shared>, Query(q): Query<HashMap<String, String>>) -> StatusCode {
    match q.get("id").map(String::as_str) {
        Some("broken") => StatusCode::INTERNAL_SERVER_ERROR,
        Some(id) => {
            stub.deleted.lock().push(id.to_string());
            StatusCode::NO_CONTENT
        }
        None => StatusCode::BAD_REQUEST,
    }
}

async fn start_stub() -> (String, Shared) {
    let stub: Shared = Arc::new(Stub::default());
    let app = Router::new()
        .route("/oauth2/token", post(token))
        .route("/helix/users", get(users))
        .route(
            "/helix/eventsub/subscriptions",
            get(list_subs).post(create_sub).delete(delete_sub),
        )
        .with_state(stub.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), stub)
}

fn config() -> BotConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("BOT_USERNAME", "cb2bot"),
        ("CHANNEL", "cb2chan"),
        ("CLIENT_ID", "cid"),
        ("SECRET", "client-secret"),
        ("EVENTSUB_SECRET", "hook-secret"),
        ("CALLBACK", "https://bot.example/eventsub"),
        ("COOLDOWN", "30"),
        ("DB", "unused.db"),
        ("HTTP_PORT", "8080"),
        ("OAUTH", "oauth:x"),
    ]);
    BotConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap()
}

async fn client() -> (TwitchHelixClient, Shared) {
    let (base, stub) = start_stub().await;
    let client = TwitchHelixClient::with_base_urls(
        &config(),
        &format!("{}/helix", base),
        &format!("{}/oauth2", base),
    );
    (client, stub)
}

#[tokio::test]
async fn user_lookup_caches_the_app_token() {
    let (client, stub) = client().await;

    assert_eq!(client.get_user_id("cb2chan").await.unwrap().as_deref(), Some("4242"));
    assert_eq!(client.get_user_id("#cb2chan").await.unwrap().as_deref(), Some("4242"));
    assert_eq!(client.get_user_id("nobody").await.unwrap(), None);

    assert_eq!(stub.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn create_subscription_uses_webhook_transport() {
    let (client, stub) = client().await;

    client.create_subscription(EventSubTopic::Cheer, "4242").await.unwrap();

    let created = stub.created.lock().clone();
    assert_eq!(created.len(), 1);
    let body = &created[0];
    assert_eq!(body["type"], "channel.cheer");
    assert_eq!(body["condition"]["broadcaster_user_id"], "4242");
    assert_eq!(body["transport"]["method"], "webhook");
    assert_eq!(body["transport"]["callback"], "https://bot.example/eventsub");
    assert_eq!(body["transport"]["secret"], "hook-secret");
}

#[tokio::test]
async fn listing_follows_pagination() {
    let (client, _stub) = client().await;
    let ids: Vec<String> = client.list_subscriptions().await.unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["a", "b", "broken"]);
}

#[tokio::test]
async fn delete_all_skips_failures() {
    let (client, stub) = client().await;

    let deleted = client.delete_all_subscriptions().await.unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(stub.deleted.lock().clone(), vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn unauthorized_drops_the_cached_token() {
    let (client, stub) = client().await;
    client.get_user_id("cb2chan").await.unwrap();
    *stub.reject_next_helix_call.lock() = true;

    let err = client.list_subscriptions().await.unwrap_err();
    assert!(matches!(err, Error::Platform(ref msg) if msg.contains("401")));

    assert_eq!(client.list_subscriptions().await.unwrap().len(), 3);
    assert_eq!(stub.token_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn code_exchange() {
    let (client, _stub) = client().await;

    assert!(client.exchange_code("bad-code").await.is_err());
    assert!(!client.has_user_token().await);

    client.exchange_code("good-code").await.unwrap();
    assert!(client.has_user_token().await);
}

#[test]
fn authorization_url_carries_scopes_and_state() {
    let client = TwitchHelixClient::new(&config());
    let url = client.authorization_url("abc123");

    assert!(url.starts_with("https://id.twitch.tv/oauth2/authorize?response_type=code"));
    assert!(url.contains("client_id=cid"));
    assert!(url.contains("redirect_uri=https%3A%2F%2Fbot.example%2Feventsub"));
    assert!(url.contains("scope=channel%3Aread%3Asubscriptions%20bits%3Aread"));
    assert!(url.ends_with("state=abc123"));
}
