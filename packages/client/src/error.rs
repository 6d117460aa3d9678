//! Error type for the store client boundary.
//!
//! Errors at this level describe what the store did with a single
//! request. Connection policy errors (lock held, lock missing) belong
//! to the façade layer.

use crate::value::ValueKind;

/// Errors reported by a store client.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The connection could not be established or has gone away.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// The addressed key or group does not exist.
    #[error("not found")]
    NotFound,

    /// The stored value's kind does not match the requested kind.
    #[error("kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    /// The store refused the request.
    #[error("request rejected: {message}")]
    Rejected { message: String },

    /// The operation is not supported by this store.
    #[error("operation not supported")]
    NotSupported,

    /// I/O failure underneath the client.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let e = StoreError::KindMismatch {
            expected: ValueKind::Int32,
            found: ValueKind::String,
        };
        let display = format!("{}", e);
        assert!(display.contains("int32"));
        assert!(display.contains("string"));

        let e = StoreError::Rejected {
            message: "unknown group".to_string(),
        };
        assert!(format!("{}", e).contains("unknown group"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let e: StoreError = io_err.into();
        assert!(matches!(e, StoreError::Io(_)));
    }
}
