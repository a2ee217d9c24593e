//! HTTP Basic auth strategy, checked against `basicAuthUsers` (bcrypt hashes).

use std::collections::HashMap;

use base64::Engine;

use super::crypto;
use super::errors::{AuthError, AuthResult};

pub struct BasicAuthStrategy {
    users: HashMap<String, String>,
}

impl BasicAuthStrategy {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    /// Verifies a raw `Authorization` header value (`"Basic <base64>"`).
    pub fn verify_header(&self, header_value: &str) -> AuthResult<()> {
        let (username, password) = decode_basic_header(header_value)?;
        let hash = self
            .users
            .get(&username)
            .ok_or(AuthError::InvalidCredentials)?;
        if crypto::verify_bcrypt(&password, hash)? {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

fn decode_basic_header(header_value: &str) -> AuthResult<(String, String)> {
    let encoded = header_value
        .strip_prefix("Basic ")
        .ok_or(AuthError::MalformedHeader)?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| AuthError::MalformedHeader)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader)?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedHeader)?;
    Ok((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_for(username: &str, password: &str) -> String {
        let raw = format!("{username}:{password}");
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }

    #[test]
    fn accepts_matching_username_and_password() {
        let hash = crypto::hash_bcrypt("hunter2").unwrap();
        let mut users = HashMap::new();
        users.insert("alice".to_string(), hash);
        let strategy = BasicAuthStrategy::new(users);

        assert!(strategy.verify_header(&header_for("alice", "hunter2")).is_ok());
    }

    #[test]
    fn rejects_unknown_username() {
        let strategy = BasicAuthStrategy::new(HashMap::new());
        assert!(strategy.verify_header(&header_for("ghost", "pw")).is_err());
    }

    #[test]
    fn rejects_wrong_password() {
        let hash = crypto::hash_bcrypt("hunter2").unwrap();
        let mut users = HashMap::new();
        users.insert("alice".to_string(), hash);
        let strategy = BasicAuthStrategy::new(users);

        assert!(strategy
            .verify_header(&header_for("alice", "wrong"))
            .is_err());
    }

    #[test]
    fn rejects_malformed_header() {
        let strategy = BasicAuthStrategy::new(HashMap::new());
        assert!(strategy.verify_header("not-basic-at-all").is_err());
    }
}
