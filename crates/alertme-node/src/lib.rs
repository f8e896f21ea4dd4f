//! AlertMe nodes
//!
//! Hub, SmartPlug and generic device nodes that talk the AlertMe protocol
//! over an escaped-API-mode radio link.
//!
//! ## Architecture
//!
//! ```text
//! Transport ──bytes──► IoLoop ──Frame──► Node::process_frame
//!                                            │
//!                                            ▼
//!                                 Role::on_command (state, registry)
//!                                            │
//!                                  replies (MessageKind)
//!                                            │
//!                                            ▼
//! Transport ◄──TX explicit frame── Node::generate_message
//! ```
//!
//! Each started node runs one reader thread that owns its transport. Frames
//! are handled one at a time in arrival order, and any reply is written
//! before the next frame is looked at.
//!
//! ## Key Types
//!
//! - [`Node`]: addresses, identity, transport slot and I/O loop
//! - [`Role`]: what a node does with inbound commands ([`HubRole`],
//!   [`SmartPlugRole`], [`DeviceRole`])
//! - [`DeviceRegistry`]: the hub's view of the network
//! - [`Transport`]: byte link to the radio ([`MemoryTransport`],
//!   [`StreamTransport`])

mod any_node;
mod config;
mod device;
mod error;
mod hub;
mod io_loop;
mod node;
mod params;
mod registry;
mod smartplug;
mod transport;

pub use any_node::AnyNode;
pub use config::{Identity, NodeConfig, NodeRole, DEFAULT_POLL_INTERVAL_MS};
pub use device::{Device, DeviceRole};
pub use error::{NodeError, NodeResult};
pub use hub::{Hub, HubRole};
pub use node::{Node, Role};
pub use params::{MessageKind, MessageParams};
pub use registry::{DeviceRecord, DeviceRegistry, DeviceStatus};
pub use smartplug::{SmartPlug, SmartPlugRole};
pub use transport::{MemoryTransport, StreamTransport, Transport, TransportError};
