//! Generic device role.

use alertme_protocol::{Command, ReceivedMessage};

use crate::config::{Identity, NodeRole};
use crate::node::{Node, Role};
use crate::params::MessageKind;

/// A device with no relay or meter; it only answers identity requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceRole;

impl Role for DeviceRole {
    fn kind(&self) -> NodeRole {
        NodeRole::Device
    }

    fn default_identity(&self) -> Identity {
        Identity {
            device_type: Some("Generic".to_string()),
            ..Default::default()
        }
    }

    fn on_command(&mut self, _from: &ReceivedMessage, command: &Command) -> Vec<MessageKind> {
        match command {
            Command::VersionInfoRequest => vec![MessageKind::VersionInfoUpdate],
            _ => Vec::new(),
        }
    }
}

/// A generic device node.
pub type Device = Node<DeviceRole>;
