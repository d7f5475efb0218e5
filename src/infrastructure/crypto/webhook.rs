//! Webhook signature verification
//!
//! Settlement callbacks carry an HMAC-SHA256 signature over the raw
//! request body, hex-encoded in the `X-Webhook-Signature` header.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA256 signature for a payload.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex-encoded signature against the payload. Comparison is
/// constant-time via the Mac verifier.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_signature_verifies() {
        let signature = sign_payload("secret", b"{\"session_id\":\"abc\"}");
        assert!(verify_signature(
            "secret",
            b"{\"session_id\":\"abc\"}",
            &signature
        ));
    }

    #[test]
    fn tampered_payload_fails() {
        let signature = sign_payload("secret", b"original");
        assert!(!verify_signature("secret", b"tampered", &signature));
    }

    #[test]
    fn wrong_secret_fails() {
        let signature = sign_payload("secret", b"payload");
        assert!(!verify_signature("other", b"payload", &signature));
    }

    #[test]
    fn non_hex_signature_fails() {
        assert!(!verify_signature("secret", b"payload", "not-hex!"));
    }
}
