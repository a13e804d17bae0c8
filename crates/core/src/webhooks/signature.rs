//! HMAC signatures over webhook bodies.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 tag over a payload, as the provider computes it.
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a provider signature over the exact raw body bytes.
///
/// The digest comparison inside `verify_slice` is constant-time.
pub fn verify_signature(secret: &str, signature_hex: &str, body: &[u8]) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };

    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";

    #[test]
    fn valid_signature_is_accepted() {
        let body = br#"{"event":"payment.completed"}"#;
        let signature = compute_signature(SECRET, body);
        assert!(verify_signature(SECRET, &signature, body));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = br#"{"event":"payment.completed"}"#;
        let signature = compute_signature("wrong_secret", body);
        assert!(!verify_signature(SECRET, &signature, body));
    }

    #[test]
    fn modified_payload_is_rejected() {
        let body = br#"{"event":"payment.completed"}"#;
        let signature = compute_signature(SECRET, body);
        assert!(!verify_signature(
            SECRET,
            &signature,
            br#"{"event":"payment.completed","hacked":true}"#
        ));
    }

    #[test]
    fn non_hex_signature_is_rejected() {
        assert!(!verify_signature(SECRET, "not hex at all", b"{}"));
    }
}
