use axum::http::StatusCode;
use axum::response::Html;
use serde::Deserialize;
use tracing::{error, info, warn};

use cb2bot_common::traits::TwitchApi;

use super::AuthState;

/// Query string Twitch appends to the redirect: `?code=xxx&state=...`
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Handles the browser redirect at the end of the authorization-code flow.
///
/// A missing or mismatched `state` is answered with 403 and nothing is exchanged.
pub async fn handle_auth_callback(
    auth: &AuthState,
    twitch: &dyn TwitchApi,
    query: AuthQuery,
) -> (StatusCode, Html<String>) {
    if let Some(err) = query.error.as_ref() {
        let desc = query.error_description.clone().unwrap_or_default();
        warn!("Authorization was refused: {} {}", err, desc);
        let msg = format!("<h2>OAuth Error</h2><p>{}</p><p>{}</p>", err, desc);
        return (StatusCode::OK, Html(msg));
    }

    let Some(code) = query.code else {
        let msg = "<h2>Missing 'code' query param</h2><p>Check logs or try again.</p>";
        return (StatusCode::OK, Html(msg.to_string()));
    };

    let state_ok = query
        .state
        .as_deref()
        .map(|s| auth.complete(s))
        .unwrap_or(false);
    if !state_ok {
        warn!("Authorization callback with unknown or missing state; rejecting");
        return (StatusCode::FORBIDDEN, Html("<h2>Forbidden</h2>".to_string()));
    }

    match twitch.exchange_code(&code).await {
        Ok(()) => {
            info!("Authorization code exchanged successfully");
            let success = r#"
<h2>Authentication Successful</h2>
<p>The bot is authorized. You can close this window now.</p>
"#;
            (StatusCode::OK, Html(success.to_string()))
        }
        Err(e) => {
            error!("Authorization code exchange failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Html("<h2>Token exchange failed</h2><p>Check the bot logs.</p>".to_string()),
            )
        }
    }
}
