//! Common types used in the protocol.

use serde::{Deserialize, Serialize};
use zigbee_frame::{Address16, Address64};

use crate::constants::*;
use crate::error::*;

/// Relay state of a switchable device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    /// Relay open.
    #[default]
    Off,
    /// Relay closed.
    On,
}

impl SwitchState {
    /// Integer form: 0 = off, 1 = on.
    pub fn as_u8(self) -> u8 {
        match self {
            SwitchState::Off => 0,
            SwitchState::On => 1,
        }
    }

    /// Whether the relay is on.
    pub fn is_on(self) -> bool {
        self == SwitchState::On
    }

    /// Parse the integer form. Anything but 0 or 1 is rejected.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(SwitchState::Off),
            1 => Some(SwitchState::On),
            _ => None,
        }
    }
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on {
            SwitchState::On
        } else {
            SwitchState::Off
        }
    }
}

impl std::fmt::Display for SwitchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwitchState::Off => write!(f, "off"),
            SwitchState::On => write!(f, "on"),
        }
    }
}

/// The three bytes every cluster payload starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterHeader {
    /// Frame control (request vs. report).
    pub frame_control: u8,
    /// Transaction sequence number.
    pub sequence: u8,
    /// Cluster-specific command.
    pub command: u8,
}

impl ClusterHeader {
    /// Create a new header.
    pub fn new(frame_control: u8, sequence: u8, command: u8) -> Self {
        ClusterHeader {
            frame_control,
            sequence,
            command,
        }
    }

    /// Read the header from the start of a cluster payload.
    pub fn decode(data: &[u8]) -> ProtocolResult<Self> {
        ProtocolError::check_len(data, CLUSTER_HEADER_LEN)?;
        Ok(ClusterHeader {
            frame_control: data[0],
            sequence: data[1],
            command: data[2],
        })
    }

    /// Header bytes.
    pub fn encode(&self) -> [u8; CLUSTER_HEADER_LEN] {
        [self.frame_control, self.sequence, self.command]
    }
}

/// Identity a device announces in a version info report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    /// Sequence byte of the report.
    pub sequence: u8,
    /// Sender's short address.
    pub addr_short: Address16,
    /// Sender's long address.
    pub addr_long: Address64,
    /// Opaque bytes between the addresses and the versions.
    pub reference: [u8; 6],
    /// Hardware minor version.
    pub hw_minor_version: u8,
    /// Hardware major version.
    pub hw_major_version: u8,
    /// Manufacturer name.
    pub manu_string: String,
    /// Device type, e.g. `SmartPlug`.
    #[serde(rename = "type")]
    pub device_type: String,
    /// Manufacture date, e.g. `2013-09-26`.
    pub manu_date: String,
}

impl Default for VersionInfo {
    fn default() -> Self {
        VersionInfo {
            sequence: SEQ_VERSION_INFO_REPORT,
            addr_short: Address16::default(),
            addr_long: Address64::default(),
            reference: DEFAULT_VERSION_REFERENCE,
            hw_minor_version: 0,
            hw_major_version: 0,
            manu_string: String::new(),
            device_type: String::new(),
            manu_date: String::new(),
        }
    }
}
