//! Slack request signing (`v0` scheme).
//!
//! `X-Slack-Signature` is `v0=` followed by the hex HMAC-SHA256 of
//! `v0:<X-Slack-Request-Timestamp>:<raw body>`, keyed by the signing secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::base::types::{Res, Void};

type HmacSha256 = Hmac<Sha256>;

/// Requests older (or newer) than this are rejected as replays.
pub const MAX_REQUEST_AGE_SECS: u64 = 300;

/// Compute the `X-Slack-Signature` value for a request.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> Res<String> {
    let mac = base_string_mac(secret, timestamp, body)?;

    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

/// Verify a request's signature and freshness against `now` (unix seconds).
pub fn verify(secret: &str, timestamp: &str, body: &[u8], signature: &str, now: i64) -> Void {
    let sent_at: i64 = timestamp.parse().map_err(|_| anyhow::anyhow!("Invalid request timestamp `{}`.", timestamp))?;

    // `abs_diff` cannot overflow, whatever the header carries.
    if now.abs_diff(sent_at) > MAX_REQUEST_AGE_SECS {
        return Err(anyhow::anyhow!("Request timestamp is outside the allowed window."));
    }

    let hex_signature = signature.strip_prefix("v0=").ok_or_else(|| anyhow::anyhow!("Unsupported signature version."))?;
    let expected = hex::decode(hex_signature).map_err(|_| anyhow::anyhow!("Signature is not valid hex."))?;

    // Constant-time comparison.
    base_string_mac(secret, timestamp, body)?.verify_slice(&expected).map_err(|_| anyhow::anyhow!("Signature mismatch."))
}

fn base_string_mac(secret: &str, timestamp: &str, body: &[u8]) -> Res<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| anyhow::anyhow!("Invalid signing secret: {}", e))?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);

    Ok(mac)
}

// Tests.
