//! HMAC-SHA256 request signing and verification.
//!
//! The signature covers the exact body bytes put on the wire, hex encoded,
//! and travels in the [`SIGNATURE_HEADER`] header. Webhooks without a secret
//! are neither signed nor verified.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC-SHA256 of the body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Header carrying the event name on outbound requests.
pub const EVENT_HEADER: &str = "x-webhook-event";

fn mac_for(secret: &str, body: &[u8]) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    mac
}

/// Signs `body` with `secret`, returning a lowercase hex string.
///
/// ```
/// use webhook_hub::webhook::signature;
///
/// let sig = signature::sign("s3cr3t", br#"{"name":"Alice"}"#);
/// assert_eq!(sig.len(), 64);
/// assert!(signature::verify("s3cr3t", br#"{"name":"Alice"}"#, &sig));
/// ```
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> String {
    hex::encode(mac_for(secret, body).finalize().into_bytes())
}

/// Verifies a hex signature over `body`.
///
/// The comparison runs in constant time over the decoded bytes. Hex digits
/// are accepted in either case; anything that is not valid hex fails.
#[must_use]
pub fn verify(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };

    let expected = mac_for(secret, body).finalize().into_bytes();
    expected.as_slice().ct_eq(provided.as_slice()).into()
}
