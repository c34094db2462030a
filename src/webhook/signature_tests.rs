//! Tests for HMAC signing and verification.

use super::signature::{sign, verify};

const SECRET: &str = "s3cr3t";
const BODY: &[u8] = br#"{"name":"Alice"}"#;

#[test]
fn sign_is_deterministic() {
    assert_eq!(sign(SECRET, BODY), sign(SECRET, BODY));
}

#[test]
fn sign_matches_known_vector() {
    // RFC 4231 test case 2
    let sig = sign("Jefe", b"what do ya want for nothing?");

    assert_eq!(
        sig,
        "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
    );
}

#[test]
fn changing_one_byte_changes_signature() {
    let other = br#"{"name":"Alicf"}"#;

    assert_ne!(sign(SECRET, BODY), sign(SECRET, other));
}

#[test]
fn changing_secret_changes_signature() {
    assert_ne!(sign(SECRET, BODY), sign("other", BODY));
}

#[test]
fn verify_accepts_own_signature() {
    assert!(verify(SECRET, BODY, &sign(SECRET, BODY)));
}

#[test]
fn verify_accepts_uppercase_hex() {
    let sig = sign(SECRET, BODY).to_uppercase();

    assert!(verify(SECRET, BODY, &sig));
}

#[test]
fn verify_rejects_other_signatures() {
    assert!(!verify(SECRET, BODY, &sign("other", BODY)));
    assert!(!verify(SECRET, BODY, &sign(SECRET, b"{}")));
    assert!(!verify(SECRET, BODY, ""));
    assert!(!verify(SECRET, BODY, "not-hex"));
}

#[test]
fn verify_rejects_truncated_signature() {
    let sig = sign(SECRET, BODY);

    assert!(!verify(SECRET, BODY, &sig[..62]));
}
