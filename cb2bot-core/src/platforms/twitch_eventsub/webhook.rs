// File: cb2bot-core/src/platforms/twitch_eventsub/webhook.rs

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::post,
};
use axum_server::Handle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use cb2bot_common::traits::{ChatSink, TwitchApi};

use crate::auth::{handle_auth_callback, AuthQuery, AuthState};
use crate::cache::DedupCache;
use crate::crypto::verify_signature;
use crate::Error;

use super::events::{parse_twitch_notification, EventSubEnvelope};

pub const HEADER_MESSAGE_ID: &str = "Twitch-Eventsub-Message-Id";
pub const HEADER_MESSAGE_TIMESTAMP: &str = "Twitch-Eventsub-Message-Timestamp";
pub const HEADER_MESSAGE_SIGNATURE: &str = "Twitch-Eventsub-Message-Signature";
pub const HEADER_MESSAGE_TYPE: &str = "Twitch-Eventsub-Message-Type";
pub const HEADER_SUBSCRIPTION_TYPE: &str = "Twitch-Eventsub-Subscription-Type";

pub const MESSAGE_TYPE_VERIFICATION: &str = "webhook_callback_verification";
pub const MESSAGE_TYPE_NOTIFICATION: &str = "notification";
pub const MESSAGE_TYPE_REVOCATION: &str = "revocation";

/// Everything the webhook handlers share.
#[derive(Clone)]
pub struct WebhookState {
    pub secret: String,
    pub dedup: Arc<DedupCache>,
    pub chat: Arc<dyn ChatSink>,
    pub auth: Arc<AuthState>,
    pub twitch: Arc<dyn TwitchApi>,
}

/// POST on any path takes EventSub deliveries; GET on any path is the OAuth redirect.
pub fn webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/", post(handle_notification).get(handle_callback))
        .route("/{*rest}", post(handle_notification).get(handle_callback))
        .with_state(Arc::new(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Serves the webhook router on `addr` until `handle` is told to shut down.
pub async fn serve_webhook(addr: SocketAddr, state: WebhookState, handle: Handle) -> Result<(), Error> {
    let app = webhook_router(state);
    info!("EventSub webhook listening on http://{}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    info!("EventSub webhook server shut down.");
    Ok(())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

async fn handle_notification(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(message_id) = header_str(&headers, HEADER_MESSAGE_ID) else {
        debug!("POST without {}; ignoring", HEADER_MESSAGE_ID);
        return StatusCode::OK.into_response();
    };

    if state.dedup.is_duplicate(message_id) {
        debug!("Duplicate EventSub message {}", message_id);
        return StatusCode::OK.into_response();
    }

    let verified = match (
        header_str(&headers, HEADER_MESSAGE_TIMESTAMP),
        header_str(&headers, HEADER_MESSAGE_SIGNATURE),
    ) {
        (Some(timestamp), Some(signature)) => {
            verify_signature(&state.secret, message_id, timestamp, &body, signature)
        }
        _ => false,
    };
    if !verified {
        warn!("Rejecting EventSub message {}: bad or missing signature", message_id);
        return StatusCode::FORBIDDEN.into_response();
    }

    if !state.dedup.claim(message_id) {
        debug!("EventSub message {} claimed by a concurrent delivery", message_id);
        return StatusCode::OK.into_response();
    }

    let envelope: EventSubEnvelope = match serde_json::from_slice(&body) {
        Ok(env) => env,
        Err(e) => {
            warn!("Unparseable EventSub body for {}: {}", message_id, e);
            return StatusCode::OK.into_response();
        }
    };

    let sub_type = header_str(&headers, HEADER_SUBSCRIPTION_TYPE)
        .or(envelope.subscription.as_ref().map(|s| s.sub_type.as_str()))
        .unwrap_or_default();

    let message_type = header_str(&headers, HEADER_MESSAGE_TYPE).unwrap_or_default();
    match message_type {
        MESSAGE_TYPE_VERIFICATION => match envelope.challenge {
            Some(challenge) => {
                info!("Answering EventSub challenge for '{}'", sub_type);
                (
                    StatusCode::OK,
                    [
                        (header::CONTENT_TYPE, "text/plain".to_string()),
                        (header::CONTENT_LENGTH, challenge.len().to_string()),
                    ],
                    challenge,
                )
                    .into_response()
            }
            None => {
                warn!("Verification request {} carried no challenge", message_id);
                StatusCode::OK.into_response()
            }
        },
        MESSAGE_TYPE_NOTIFICATION => {
            let parsed = envelope
                .event
                .as_ref()
                .and_then(|event| parse_twitch_notification(sub_type, event));
            match parsed {
                Some(notification) => {
                    let text = notification.announcement();
                    if let Err(e) = state.chat.send_message(&text).await {
                        error!("Failed to announce {}: {}", sub_type, e);
                    }
                }
                None => debug!("No announcement for EventSub type {}", sub_type),
            }
            StatusCode::OK.into_response()
        }
        MESSAGE_TYPE_REVOCATION => {
            let (id, status) = envelope
                .subscription
                .as_ref()
                .map(|s| (s.id.as_str(), s.status.as_str()))
                .unwrap_or_default();
            warn!("EventSub subscription {} ('{}') revoked: {}", id, sub_type, status);
            StatusCode::OK.into_response()
        }
        other => {
            debug!("Ignoring EventSub message type '{}'", other);
            StatusCode::OK.into_response()
        }
    }
}

async fn handle_callback(
    State(state): State<Arc<WebhookState>>,
    Query(query): Query<AuthQuery>,
) -> (StatusCode, Html<String>) {
    handle_auth_callback(&state.auth, state.twitch.as_ref(), query).await
}
