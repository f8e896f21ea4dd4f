//! ZigBee-style transceiver API frames
//!
//! This crate provides the transport framing used on the serial link between
//! a host and a ZigBee-style radio module running in escaped API mode, plus
//! the explicit-addressing frames that carry application traffic.
//!
//! # Layers
//!
//! - [`FrameCodec`]: delimiter, big-endian length, byte escaping and checksum.
//!   Knows nothing about what the payload means.
//! - [`ApiFrame`]: interprets a [`Frame`] as a TX/RX explicit frame with
//!   addresses, endpoints, cluster and profile.
//!
//! # Example
//!
//! ```rust,ignore
//! use zigbee_frame::{ApiFrame, FrameCodec};
//!
//! let mut codec = FrameCodec::new();
//! codec.push(&received_bytes);
//! while let Some(frame) = codec.decode()? {
//!     let api = ApiFrame::decode(&frame)?;
//! }
//! ```

mod api;
mod error;
mod frame;
mod types;

pub use api::*;
pub use error::*;
pub use frame::*;
pub use types::*;
