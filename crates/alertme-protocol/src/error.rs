//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding or decoding AlertMe payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Cluster payload is shorter than its fixed layout.
    #[error("malformed payload: expected at least {expected} bytes, got {actual}")]
    PayloadTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// A field holds a value the layout does not allow.
    #[error("invalid payload data: {0}")]
    InvalidData(String),

    /// A string does not fit in a one-byte length prefix.
    #[error("string field '{field}' too long: {len} bytes (max 255)")]
    StringTooLong {
        /// Field name.
        field: &'static str,
        /// Actual length in bytes.
        len: usize,
    },

    /// UTF-8 decoding error.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
}

impl ProtocolError {
    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        ProtocolError::InvalidData(message.into())
    }

    /// Fail with [`ProtocolError::PayloadTooShort`] unless `data` has `expected` bytes.
    pub(crate) fn check_len(data: &[u8], expected: usize) -> Result<(), ProtocolError> {
        if data.len() < expected {
            return Err(ProtocolError::PayloadTooShort {
                expected,
                actual: data.len(),
            });
        }
        Ok(())
    }
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
