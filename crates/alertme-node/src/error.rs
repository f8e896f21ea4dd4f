//! Node error types.

use alertme_protocol::ProtocolError;
use thiserror::Error;
use zigbee_frame::FrameError;

use crate::transport::TransportError;

/// Errors raised by nodes, their configuration and their I/O loop.
#[derive(Error, Debug)]
pub enum NodeError {
    /// `start` called on a node whose I/O loop is already running.
    #[error("node already started")]
    AlreadyStarted,

    /// `halt` called on a node that is not running.
    #[error("node not started")]
    NotStarted,

    /// A message kind needs a value that is neither in the params nor in the node state.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// A parameter is present but unusable.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Unknown message kind name.
    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    /// No registry entry for the address.
    #[error("device not found: {0}")]
    NotFound(String),

    /// Cluster payload could not be decoded or encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport frame could not be decoded or encoded.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Writing to or reading from the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        NodeError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        NodeError::Config(message.into())
    }
}

/// Result type alias for node operations.
pub type NodeResult<T> = Result<T, NodeError>;
