//! Snapshot-specific error codes.
//!
//! Kept as its own small taxonomy (rather than constructing `GatewayError`
//! directly at every call site) because the snapshot manager's failure
//! modes carry an I/O source the caller may want to inspect; a `From`
//! impl collapses it into the gateway-wide error at the module boundary.

use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotErrorCode {
    SwapFailed,
    Io,
    MetadataCorrupt,
}

impl SnapshotErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SwapFailed => "SNAPSHOT_SWAP_FAILED",
            Self::Io => "SNAPSHOT_IO",
            Self::MetadataCorrupt => "SNAPSHOT_METADATA_CORRUPT",
        }
    }
}

impl fmt::Display for SnapshotErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug)]
pub struct SnapshotError {
    code: SnapshotErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl SnapshotError {
    pub fn swap_failed(message: impl Into<String>) -> Self {
        Self {
            code: SnapshotErrorCode::SwapFailed,
            message: message.into(),
            source: None,
        }
    }

    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: SnapshotErrorCode::Io,
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn metadata_corrupt(message: impl Into<String>) -> Self {
        Self {
            code: SnapshotErrorCode::MetadataCorrupt,
            message: message.into(),
            source: None,
        }
    }

    pub fn code(&self) -> SnapshotErrorCode {
        self.code
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<SnapshotError> for crate::error::GatewayError {
    fn from(err: SnapshotError) -> Self {
        crate::error::GatewayError::Internal(err.to_string())
    }
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(SnapshotErrorCode::SwapFailed.code(), "SNAPSHOT_SWAP_FAILED");
        assert_eq!(SnapshotErrorCode::Io.code(), "SNAPSHOT_IO");
    }

    #[test]
    fn converts_into_gateway_error() {
        let err: crate::error::GatewayError = SnapshotError::swap_failed("boom").into();
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
