//! Auth pipeline errors.

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("malformed authorization header")]
    MalformedHeader,
    #[error("no configured auth method accepted the request")]
    NoStrategyAccepted,
    #[error("internal error: password hashing failed")]
    HashingFailed,
    #[error("client certificate verification failed: {0}")]
    CertificateRejected(String),
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::HashingFailed => 500,
            _ => 401,
        }
    }
}
