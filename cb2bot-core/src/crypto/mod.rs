//! src/crypto/mod.rs
//!
//! HMAC-SHA256 signatures for EventSub webhook deliveries.
//!
//! Twitch signs `message_id || message_timestamp || raw_body` with the secret given when
//! the subscription was created, and sends the result as `sha256=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_PREFIX: &str = "sha256=";

fn keyed_mac(secret: &str, message_id: &str, timestamp: &str, body: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message_id.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(body);
    Some(mac)
}

/// Produces the header value Twitch would send for this message, `sha256=<hex>`.
pub fn sign_message(secret: &str, message_id: &str, timestamp: &str, body: &[u8]) -> String {
    match keyed_mac(secret, message_id, timestamp, body) {
        Some(mac) => format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes())),
        None => String::new(),
    }
}

/// Returns true only when `presented` is a well-formed `sha256=<hex>` signature matching
/// the message. Malformed input is reported as `false`, never as an error.
pub fn verify_signature(
    secret: &str,
    message_id: &str,
    timestamp: &str,
    body: &[u8],
    presented: &str,
) -> bool {
    let Some(digest_hex) = presented.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(digest_hex) else {
        return false;
    };
    let Some(mac) = keyed_mac(secret, message_id, timestamp, body) else {
        return false;
    };
    // constant-time
    mac.verify_slice(&signature_bytes).is_ok()
}
