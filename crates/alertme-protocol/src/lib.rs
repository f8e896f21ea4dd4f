//! AlertMe cluster protocol
//!
//! This crate encodes and decodes the cluster-specific payloads AlertMe
//! devices exchange over a ZigBee-style radio network. It knows nothing about
//! transport framing; payloads travel inside the explicit-addressing frames
//! provided by `zigbee-frame`.
//!
//! # Protocol Overview
//!
//! All traffic uses the AlertMe profile (`0xC216`). Each payload starts with a
//! three byte [`ClusterHeader`] whose last byte selects the command:
//!
//! - **Version info** (`0x00F6`): identity request and announcement
//! - **Switch state** (`0x00EE`): relay query, change request and report
//! - **Power** (`0x00EF`): instantaneous power report
//!
//! # Example
//!
//! ```rust,ignore
//! use alertme_protocol::{Command, Message, SwitchState};
//!
//! let msg = Message::from_command(&Command::SwitchStateUpdate(SwitchState::On))?;
//! assert_eq!(msg.data, b"\th\x80\x07\x01");
//! ```

mod commands;
mod constants;
mod error;
mod message;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use message::*;
pub use types::*;
