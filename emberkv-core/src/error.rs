//! Error types for EmberKV

use thiserror::Error;

/// Result type alias for EmberKV operations
pub type Result<T> = std::result::Result<T, EmberError>;

/// Errors that can occur in EmberKV
#[derive(Error, Debug)]
pub enum EmberError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be decoded
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Encoding a record or snapshot failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmberError::Corruption("bad record at line 3".to_string());
        assert_eq!(err.to_string(), "Data corruption: bad record at line 3");

        let err = EmberError::Serialization("unexpected token".to_string());
        assert_eq!(err.to_string(), "Serialization error: unexpected token");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: EmberError = io_err.into();
        assert!(matches!(err, EmberError::Io(_)));
    }
}
