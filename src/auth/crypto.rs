//! Cryptographic primitives for the auth pipeline and webhook verification.
//!
//! Basic-auth passwords are bcrypt hashes (spec.md §6 names
//! `basicAuthUsers` as a `username -> bcrypt-hash` map); webhook
//! signatures are HMAC-SHA256 compared in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::{AuthError, AuthResult};

pub fn verify_bcrypt(password: &str, hash: &str) -> AuthResult<bool> {
    bcrypt::verify(password, hash).map_err(|_| AuthError::HashingFailed)
}

pub fn hash_bcrypt(password: &str) -> AuthResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|_| AuthError::HashingFailed)
}

pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Verifies a GitHub-style `sha256=<hex>` signature header against `body`
/// using `secret` as the HMAC key.
pub fn verify_hmac_sha256(secret: &[u8], body: &[u8], signature_header: &str) -> bool {
    let Some(hex_digest) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected_bytes) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    let computed = mac.finalize().into_bytes();

    constant_time_eq(&computed, &expected_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcrypt_round_trip() {
        let hash = hash_bcrypt("correct horse battery staple").unwrap();
        assert!(verify_bcrypt("correct horse battery staple", &hash).unwrap());
        assert!(!verify_bcrypt("wrong password", &hash).unwrap());
    }

    #[test]
    fn constant_time_comparison_matches_standard_eq() {
        assert!(constant_time_str_eq("hello", "hello"));
        assert!(!constant_time_str_eq("hello", "world"));
        assert!(!constant_time_str_eq("hello", "hello!"));
    }

    #[test]
    fn hmac_signature_verifies_correctly() {
        let secret = b"webhook-secret";
        let body = b"{\"ref\":\"refs/heads/main\"}";

        let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
        mac.update(body);
        let digest = hex::encode(mac.finalize().into_bytes());
        let header = format!("sha256={digest}");

        assert!(verify_hmac_sha256(secret, body, &header));
        assert!(!verify_hmac_sha256(b"wrong-secret", body, &header));
    }

    #[test]
    fn hmac_rejects_malformed_header() {
        assert!(!verify_hmac_sha256(b"secret", b"body", "not-a-signature"));
        assert!(!verify_hmac_sha256(b"secret", b"body", "sha256=not-hex"));
    }
}
