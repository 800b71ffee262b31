//! Error types for kexhold

use std::fmt;

/// Unified error type for all kexhold operations
#[derive(Debug)]
pub enum KexholdError {
    /// I/O error
    Io(std::io::Error),

    /// Configuration error (bad target, bad flag value)
    Config(String),

    /// Protocol error (malformed banner, oversize packet)
    Protocol(String),

    /// Other error
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for KexholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KexholdError::Io(e) => write!(f, "IO error: {}", e),
            KexholdError::Config(msg) => write!(f, "Configuration error: {}", msg),
            KexholdError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            KexholdError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for KexholdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KexholdError::Io(e) => Some(e),
            KexholdError::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KexholdError {
    fn from(err: std::io::Error) -> Self {
        KexholdError::Io(err)
    }
}

/// Result type for kexhold operations
pub type KexholdResult<T> = Result<T, KexholdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KexholdError::Config("unknown service".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown service");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: KexholdError = io_err.into();
        assert!(matches!(err, KexholdError::Io(_)));
    }

    #[test]
    fn test_protocol_error_has_no_source() {
        use std::error::Error;
        let err = KexholdError::Protocol("invalid banner".to_string());
        assert!(err.source().is_none());
    }
}
