//! Hub role.

use std::collections::BTreeMap;

use alertme_protocol::{Command, ReceivedMessage};
use tracing::{debug, info};
use zigbee_frame::Address64;

use crate::config::{Identity, NodeRole};
use crate::error::{NodeError, NodeResult};
use crate::node::{Node, Role};
use crate::params::MessageKind;
use crate::registry::{DeviceRecord, DeviceRegistry, DeviceStatus};

/// Coordinator state: everything learned about other devices.
#[derive(Debug, Clone, Default)]
pub struct HubRole {
    registry: DeviceRegistry,
}

impl HubRole {
    /// Create a hub with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The device registry.
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }
}

impl Role for HubRole {
    fn kind(&self) -> NodeRole {
        NodeRole::Hub
    }

    fn default_identity(&self) -> Identity {
        Identity {
            device_type: Some("Hub".to_string()),
            ..Default::default()
        }
    }

    fn on_command(&mut self, from: &ReceivedMessage, command: &Command) -> Vec<MessageKind> {
        let addr = from.source_addr_long;
        match command {
            Command::VersionInfo(info) => {
                let record = DeviceRecord::from(info);
                info!(
                    device = %addr,
                    "{} from {} (hw {}.{})",
                    record.device_type,
                    record.manu_string,
                    record.hw_major_version,
                    record.hw_minor_version
                );
                self.registry.upsert(addr, record);
            }
            Command::SwitchStateUpdate(state) => {
                debug!(device = %addr, "switch state {}", state);
                self.registry.update_switch_state(addr, *state);
            }
            Command::PowerFactor { power } => {
                debug!(device = %addr, "power {}", power);
                self.registry.update_power(addr, *power);
            }
            _ => {}
        }
        Vec::new()
    }

    fn on_other(&mut self, from: &ReceivedMessage) -> Vec<MessageKind> {
        if from.is_match_descriptor_request() {
            debug!(device = %from.source_addr_long, "device looking for a hub, asking for its version");
            return vec![MessageKind::VersionInfoRequest];
        }
        Vec::new()
    }
}

/// A hub node.
pub type Hub = Node<HubRole>;

impl Node<HubRole> {
    /// Snapshot of the registry keyed by colon-separated long address.
    pub fn list_devices(&self) -> BTreeMap<String, DeviceRecord> {
        self.role().registry().list()
    }

    /// Record of one device, by colon-separated long address.
    pub fn get_device(&self, addr: &str) -> NodeResult<DeviceRecord> {
        let parsed: Address64 = addr.parse()?;
        self.role()
            .registry()
            .get(&parsed)
            .cloned()
            .ok_or_else(|| NodeError::NotFound(addr.to_string()))
    }

    /// Last relay state and power reported by a device.
    pub fn device_status(&self, addr: &Address64) -> Option<DeviceStatus> {
        self.role().registry().status(addr)
    }
}
