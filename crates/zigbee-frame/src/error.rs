//! Frame error types.

use thiserror::Error;

/// Errors that can occur while encoding or decoding transport frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Checksum over the unescaped frame body did not verify.
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch {
        /// Checksum computed over the received body.
        expected: u8,
        /// Checksum byte found on the wire.
        actual: u8,
    },

    /// A frame was cut short by a new start delimiter, or carried an
    /// impossible length. The partial bytes have already been discarded.
    #[error("framing error: {0}")]
    Framing(String),

    /// Frame body does not fit in the 16-bit length field.
    #[error("frame too long: maximum {max} bytes, got {actual}")]
    FrameTooLong {
        /// Maximum allowed body length.
        max: usize,
        /// Actual body length.
        actual: usize,
    },

    /// An API frame is shorter than its fixed layout.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Address string could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl FrameError {
    /// Create a framing error.
    pub fn framing(message: impl Into<String>) -> Self {
        FrameError::Framing(message.into())
    }

    /// Create an invalid address error.
    pub fn invalid_address(message: impl Into<String>) -> Self {
        FrameError::InvalidAddress(message.into())
    }
}
