//! Node configuration.
//!
//! Nodes are described in YAML:
//!
//! ```yaml
//! name: lounge-plug
//! role: smartplug
//! addr_long: "00:0d:6f:00:03:bb:b9:f8"
//! addr_short: "889f"
//! identity:
//!   type: SmartPlug
//!   hw_major_version: 1
//!   hw_minor_version: 0
//!   manu_string: AlertMe.com
//!   manu_date: "2013-09-26"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zigbee_frame::{Address16, Address64};

use crate::error::{NodeError, NodeResult};

/// Default idle wait of the I/O loop.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Which node variant to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Coordinator keeping the device registry.
    Hub,
    /// Switchable plug with a power meter.
    #[serde(alias = "smart_plug")]
    SmartPlug,
    /// Generic device that only announces its identity.
    #[default]
    Device,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Hub => write!(f, "hub"),
            NodeRole::SmartPlug => write!(f, "smartplug"),
            NodeRole::Device => write!(f, "device"),
        }
    }
}

impl FromStr for NodeRole {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hub" => Ok(NodeRole::Hub),
            "smartplug" | "smart_plug" => Ok(NodeRole::SmartPlug),
            "device" => Ok(NodeRole::Device),
            other => Err(NodeError::config(format!("unknown role '{}'", other))),
        }
    }
}

/// Identity fields a node announces in its version info report.
///
/// Every field is optional; a node without a complete identity cannot
/// announce itself unless the missing values are passed as parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identity {
    /// Device type, e.g. `SmartPlug`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    /// Hardware major version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_major_version: Option<u8>,
    /// Hardware minor version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_minor_version: Option<u8>,
    /// Manufacturer name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manu_string: Option<String>,
    /// Manufacture date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manu_date: Option<String>,
}

impl Identity {
    /// Whether every field needed for a version info report is set.
    pub fn is_complete(&self) -> bool {
        self.device_type.is_some()
            && self.hw_major_version.is_some()
            && self.hw_minor_version.is_some()
            && self.manu_string.is_some()
            && self.manu_date.is_some()
    }

    /// Fill fields missing here from `fallback`.
    pub fn or(self, fallback: &Identity) -> Identity {
        Identity {
            device_type: self.device_type.or_else(|| fallback.device_type.clone()),
            hw_major_version: self.hw_major_version.or(fallback.hw_major_version),
            hw_minor_version: self.hw_minor_version.or(fallback.hw_minor_version),
            manu_string: self.manu_string.or_else(|| fallback.manu_string.clone()),
            manu_date: self.manu_date.or_else(|| fallback.manu_date.clone()),
        }
    }
}

/// Configuration of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Node name, used for the I/O thread name and in logs.
    pub name: String,
    /// Node variant.
    #[serde(default)]
    pub role: NodeRole,
    /// Own long address.
    #[serde(default)]
    pub addr_long: Address64,
    /// Own short address.
    #[serde(default = "default_addr_short")]
    pub addr_short: Address16,
    /// Identity overrides; unset fields use the role's defaults.
    #[serde(default)]
    pub identity: Option<Identity>,
    /// How long the I/O loop waits when the transport has no data.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_addr_short() -> Address16 {
    Address16::UNKNOWN
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            name: "node".to_string(),
            role: NodeRole::default(),
            addr_long: Address64::default(),
            addr_short: default_addr_short(),
            identity: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl NodeConfig {
    /// Create a config with the given name and role.
    pub fn new(name: impl Into<String>, role: NodeRole) -> Self {
        NodeConfig {
            name: name.into(),
            role,
            ..Default::default()
        }
    }

    /// Set the node's addresses.
    pub fn with_addresses(mut self, addr_long: Address64, addr_short: Address16) -> Self {
        self.addr_long = addr_long;
        self.addr_short = addr_short;
        self
    }

    /// Set the identity overrides.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> NodeResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| NodeError::config(e.to_string()))
    }

    /// Load a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> NodeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
            .map_err(|e| NodeError::config(format!("{}: {}", path.display(), e)))
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> NodeResult<String> {
        serde_yaml::to_string(self).map_err(|e| NodeError::config(e.to_string()))
    }

    /// Idle wait of the I/O loop.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
