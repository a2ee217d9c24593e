//! Content fetcher error taxonomy.
//!
//! Network and authentication failures are distinct kinds (spec.md §7) so
//! the scheduler can decide whether a retry is worth attempting without
//! string-matching an error message.

use std::fmt;

#[derive(Debug)]
pub enum FetchError {
    Network(String),
    Auth(String),
    NotFound(String),
    Cancelled,
    Io(std::io::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Auth(msg) => write!(f, "authentication error: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Cancelled => write!(f, "fetch cancelled"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<FetchError> for crate::error::GatewayError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Network(msg) => Self::FetchNetwork(msg),
            FetchError::Auth(msg) => Self::FetchAuth(msg),
            FetchError::NotFound(msg) => Self::FetchNotFound(msg),
            FetchError::Cancelled => Self::Cancelled,
            FetchError::Io(err) => Self::Internal(err.to_string()),
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
