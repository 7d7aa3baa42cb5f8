//! Shared error type across promrelay crates.

use thiserror::Error;

/// Stable error classes (safe to match on in callers and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid metric definitions or push options.
    Config,
    /// The middleware already launched its push loop.
    AlreadyAttached,
    /// A push cycle failed.
    Export,
    /// Internal failure.
    Internal,
}

impl ErrorCode {
    /// String representation used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Config => "CONFIG",
            ErrorCode::AlreadyAttached => "ALREADY_ATTACHED",
            ErrorCode::Export => "EXPORT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type used by core and the HTTP middleware.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("config: {0}")]
    Config(String),
    #[error("middleware already attached")]
    AlreadyAttached,
    #[error("export: {0}")]
    Export(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl RelayError {
    /// Map the error to its stable class.
    pub fn code(&self) -> ErrorCode {
        match self {
            RelayError::Config(_) => ErrorCode::Config,
            RelayError::AlreadyAttached => ErrorCode::AlreadyAttached,
            RelayError::Export(_) => ErrorCode::Export,
            RelayError::Internal(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(RelayError::Config("x".into()).code().as_str(), "CONFIG");
        assert_eq!(RelayError::AlreadyAttached.code().as_str(), "ALREADY_ATTACHED");
        assert_eq!(RelayError::Export("x".into()).code().as_str(), "EXPORT");
        assert_eq!(RelayError::Internal("x".into()).code().as_str(), "INTERNAL");
    }

    #[test]
    fn display_includes_detail() {
        let e = RelayError::Config("duplicate metric name: a".into());
        assert_eq!(e.to_string(), "config: duplicate metric name: a");
    }
}
