//! Node whose role is picked at runtime from configuration.

use std::collections::BTreeMap;

use alertme_protocol::{Message, ReceivedMessage};
use zigbee_frame::{Address16, Address64};

use crate::config::{NodeConfig, NodeRole};
use crate::device::Device;
use crate::error::NodeResult;
use crate::hub::Hub;
use crate::params::{MessageKind, MessageParams};
use crate::registry::DeviceRecord;
use crate::smartplug::SmartPlug;
use crate::transport::Transport;

/// Any node variant.
#[derive(Debug)]
pub enum AnyNode {
    /// Hub.
    Hub(Hub),
    /// SmartPlug.
    SmartPlug(SmartPlug),
    /// Generic device.
    Device(Device),
}

macro_rules! dispatch {
    ($self:expr, $node:ident => $body:expr) => {
        match $self {
            AnyNode::Hub($node) => $body,
            AnyNode::SmartPlug($node) => $body,
            AnyNode::Device($node) => $body,
        }
    };
}

impl AnyNode {
    /// Build the node described by `config`.
    pub fn from_config(config: &NodeConfig) -> Self {
        match config.role {
            NodeRole::Hub => AnyNode::Hub(Hub::new(config)),
            NodeRole::SmartPlug => AnyNode::SmartPlug(SmartPlug::new(config)),
            NodeRole::Device => AnyNode::Device(Device::new(config)),
        }
    }

    /// Node variant.
    pub fn role(&self) -> NodeRole {
        match self {
            AnyNode::Hub(_) => NodeRole::Hub,
            AnyNode::SmartPlug(_) => NodeRole::SmartPlug,
            AnyNode::Device(_) => NodeRole::Device,
        }
    }

    /// Own long address.
    pub fn addr_long(&self) -> Address64 {
        dispatch!(self, node => node.addr_long())
    }

    /// Own short address.
    pub fn addr_short(&self) -> Address16 {
        dispatch!(self, node => node.addr_short())
    }

    /// See [`Node::start`](crate::Node::start).
    pub fn start<T: Transport + 'static>(&self, transport: T) -> NodeResult<()> {
        dispatch!(self, node => node.start(transport))
    }

    /// See [`Node::halt`](crate::Node::halt).
    pub fn halt(&self) -> NodeResult<()> {
        dispatch!(self, node => node.halt())
    }

    /// See [`Node::receive_message`](crate::Node::receive_message).
    pub fn receive_message(&self, msg: &ReceivedMessage) -> NodeResult<Vec<Message>> {
        dispatch!(self, node => node.receive_message(msg))
    }

    /// See [`Node::frames_handled`](crate::Node::frames_handled).
    pub fn frames_handled(&self) -> u64 {
        dispatch!(self, node => node.frames_handled())
    }

    /// See [`Node::generate_message`](crate::Node::generate_message).
    pub fn generate_message(&self, kind: MessageKind, params: &MessageParams) -> NodeResult<Message> {
        dispatch!(self, node => node.generate_message(kind, params))
    }

    /// Registry snapshot; `None` unless this is a hub.
    pub fn list_devices(&self) -> Option<BTreeMap<String, DeviceRecord>> {
        match self {
            AnyNode::Hub(hub) => Some(hub.list_devices()),
            _ => None,
        }
    }
}
