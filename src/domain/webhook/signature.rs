//! Webhook signature scheme.
//!
//! Signatures use the `t=<unix_seconds>,v1=<hex_hmac_sha256>` header format,
//! with the MAC computed over the UTF-8 bytes of `"{timestamp}.{payload}"`.
//! Verification is constant-time and enforces a replay window around the
//! signed timestamp.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::foundation::{Clock, SystemClock};

type HmacSha256 = Hmac<Sha256>;

/// Parsed components of a signature header.
///
/// Unknown key-value pairs are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses `t=<timestamp>,v1=<hex>`; returns None on any malformation.
    fn parse(header: &str) -> Option<Self> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part.split_once('=')?;
            match key.trim() {
                "t" => timestamp = Some(value.trim().parse().ok()?),
                "v1" => v1_signature = Some(hex::decode(value.trim()).ok()?),
                _ => {}
            }
        }

        Some(SignatureHeader {
            timestamp: timestamp?,
            v1_signature: v1_signature?,
        })
    }
}

/// Signs and verifies webhook payloads.
///
/// The clock is injectable so replay-window behavior is testable without
/// sleeping.
#[derive(Clone)]
pub struct SignatureCodec {
    replay_window_secs: i64,
    clock: Arc<dyn Clock>,
}

impl SignatureCodec {
    /// Creates a codec with the given replay window, using the system clock.
    pub fn new(replay_window_secs: i64) -> Self {
        Self::with_clock(replay_window_secs, Arc::new(SystemClock))
    }

    /// Creates a codec with an explicit clock (tests).
    pub fn with_clock(replay_window_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            replay_window_secs,
            clock,
        }
    }

    /// Produces a signature header for the payload at the current time.
    pub fn sign(&self, secret: &SecretString, payload: &str) -> String {
        let timestamp = self.clock.unix_now();
        let digest = compute_digest(secret, timestamp, payload.as_bytes());
        format!("t={},v1={}", timestamp, hex::encode(digest))
    }

    /// Verifies a signature header against the payload.
    ///
    /// Returns false on malformed headers, signatures outside the replay
    /// window, and digest mismatches alike; the caller learns nothing about
    /// which check failed. The digest comparison is constant-time.
    pub fn verify(&self, secret: &SecretString, payload: &[u8], header: &str) -> bool {
        let parsed = match SignatureHeader::parse(header) {
            Some(parsed) => parsed,
            None => return false,
        };

        let now = self.clock.unix_now();
        if (now - parsed.timestamp).abs() > self.replay_window_secs {
            return false;
        }

        let expected = compute_digest(secret, parsed.timestamp, payload);
        constant_time_eq(&expected, &parsed.v1_signature)
    }
}

/// HMAC-SHA256 over `"{timestamp}.{payload}"`.
fn compute_digest(secret: &SecretString, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts any key size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time equality; length mismatch short-circuits, which leaks only
/// the digest length (fixed for SHA-256).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::FixedClock;
    use proptest::prelude::*;

    const WINDOW: i64 = 300;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn codec_at(unix_secs: i64) -> (SignatureCodec, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at(unix_secs));
        (SignatureCodec::with_clock(WINDOW, clock.clone()), clock)
    }

    // ══════════════════════════════════════════════════════════════
    // Round-trip
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn sign_then_verify_succeeds() {
        let (codec, _) = codec_at(1_700_000_000);
        let key = secret("whsec_test");
        let header = codec.sign(&key, r#"{"event":"payment.succeeded"}"#);
        assert!(codec.verify(&key, br#"{"event":"payment.succeeded"}"#, &header));
    }

    #[test]
    fn header_carries_timestamp_and_hex_digest() {
        let (codec, _) = codec_at(1_700_000_000);
        let header = codec.sign(&secret("whsec_test"), "payload");
        assert!(header.starts_with("t=1700000000,v1="));
        let hex_part = header.split("v1=").nth(1).unwrap();
        assert_eq!(hex_part.len(), 64);
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn wrong_secret_fails() {
        let (codec, _) = codec_at(1_700_000_000);
        let header = codec.sign(&secret("whsec_a"), "payload");
        assert!(!codec.verify(&secret("whsec_b"), b"payload", &header));
    }

    #[test]
    fn tampered_payload_fails() {
        let (codec, _) = codec_at(1_700_000_000);
        let header = codec.sign(&secret("whsec_test"), r#"{"amount":"25.00"}"#);
        assert!(!codec.verify(&secret("whsec_test"), br#"{"amount":"99.00"}"#, &header));
    }

    // ══════════════════════════════════════════════════════════════
    // Replay window
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn signature_at_window_boundary_still_verifies() {
        let (codec, clock) = codec_at(1_700_000_000);
        let key = secret("whsec_test");
        let header = codec.sign(&key, "payload");
        clock.advance(WINDOW);
        assert!(codec.verify(&key, b"payload", &header));
    }

    #[test]
    fn signature_past_window_is_rejected() {
        let (codec, clock) = codec_at(1_700_000_000);
        let key = secret("whsec_test");
        let header = codec.sign(&key, "payload");
        clock.advance(WINDOW + 1);
        assert!(!codec.verify(&key, b"payload", &header));
    }

    #[test]
    fn signature_from_the_future_is_rejected() {
        let (codec, clock) = codec_at(1_700_000_000);
        let key = secret("whsec_test");
        let header = codec.sign(&key, "payload");
        clock.set(1_700_000_000 - WINDOW - 1);
        assert!(!codec.verify(&key, b"payload", &header));
    }

    // ══════════════════════════════════════════════════════════════
    // Malformed headers
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn malformed_headers_yield_false() {
        let (codec, _) = codec_at(1_700_000_000);
        let key = secret("whsec_test");
        for header in [
            "",
            "garbage",
            "t=1700000000",
            &format!("v1={}", "a".repeat(64)),
            &format!("t=not_a_number,v1={}", "a".repeat(64)),
            "t=1700000000,v1=not_hex",
            "t1700000000",
        ] {
            assert!(!codec.verify(&key, b"payload", header), "header: {header:?}");
        }
    }

    #[test]
    fn unknown_header_fields_are_ignored() {
        let (codec, _) = codec_at(1_700_000_000);
        let key = secret("whsec_test");
        let header = codec.sign(&key, "payload");
        let extended = format!("{header},v0=deadbeef,scheme=hmac");
        assert!(codec.verify(&key, b"payload", &extended));
    }

    // ══════════════════════════════════════════════════════════════
    // Properties
    // ══════════════════════════════════════════════════════════════

    proptest! {
        #[test]
        fn any_payload_roundtrips(payload in ".*", key in "[a-zA-Z0-9_]{1,64}") {
            let (codec, _) = codec_at(1_700_000_000);
            let key = secret(&key);
            let header = codec.sign(&key, &payload);
            prop_assert!(codec.verify(&key, payload.as_bytes(), &header));
        }

        #[test]
        fn distinct_secrets_never_cross_verify(
            payload in ".*",
            key_a in "[a-z0-9]{8,32}",
            key_b in "[a-z0-9]{8,32}",
        ) {
            prop_assume!(key_a != key_b);
            let (codec, _) = codec_at(1_700_000_000);
            let header = codec.sign(&secret(&key_a), &payload);
            prop_assert!(!codec.verify(&secret(&key_b), payload.as_bytes(), &header));
        }

        #[test]
        fn arbitrary_headers_never_panic(header in ".*") {
            let (codec, _) = codec_at(1_700_000_000);
            let _ = codec.verify(&secret("whsec_test"), b"payload", &header);
        }
    }
}
