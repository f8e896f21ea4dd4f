//! Hub device registry.
//!
//! Identity records are keyed by the long address of the message that
//! carried them, never by the address inside the report body. A new report
//! replaces the previous record wholesale.

use std::collections::BTreeMap;

use alertme_protocol::{SwitchState, VersionInfo};
use serde::{Deserialize, Serialize};
use zigbee_frame::Address64;

/// Last known identity of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device type, e.g. `SmartPlug`.
    #[serde(rename = "type")]
    pub device_type: String,
    /// Hardware major version.
    #[serde(rename = "hwMajorVersion")]
    pub hw_major_version: u8,
    /// Hardware minor version.
    #[serde(rename = "hwMinorVersion")]
    pub hw_minor_version: u8,
    /// Manufacturer name.
    pub manu_string: String,
}

impl From<&VersionInfo> for DeviceRecord {
    fn from(info: &VersionInfo) -> Self {
        DeviceRecord {
            device_type: info.device_type.clone(),
            hw_major_version: info.hw_major_version,
            hw_minor_version: info.hw_minor_version,
            manu_string: info.manu_string.clone(),
        }
    }
}

/// Last reported relay state and power draw of a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Relay state from the last switch state report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_state: Option<SwitchState>,
    /// Power from the last power report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<u16>,
}

/// Identity and status of every device heard from.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<Address64, DeviceRecord>,
    status: BTreeMap<Address64, DeviceStatus>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `addr`. Returns the previous record.
    pub fn upsert(&mut self, addr: Address64, record: DeviceRecord) -> Option<DeviceRecord> {
        self.devices.insert(addr, record)
    }

    /// Record for `addr`.
    pub fn get(&self, addr: &Address64) -> Option<&DeviceRecord> {
        self.devices.get(addr)
    }

    /// Number of known devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device is known.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Snapshot keyed by colon-separated address strings.
    pub fn list(&self) -> BTreeMap<String, DeviceRecord> {
        self.devices
            .iter()
            .map(|(addr, record)| (addr.to_string(), record.clone()))
            .collect()
    }

    /// Store the relay state reported by `addr`.
    pub fn update_switch_state(&mut self, addr: Address64, state: SwitchState) {
        self.status.entry(addr).or_default().switch_state = Some(state);
    }

    /// Store the power reported by `addr`.
    pub fn update_power(&mut self, addr: Address64, power: u16) {
        self.status.entry(addr).or_default().power = Some(power);
    }

    /// Last status reported by `addr`.
    pub fn status(&self, addr: &Address64) -> Option<DeviceStatus> {
        self.status.get(addr).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plug_record() -> DeviceRecord {
        DeviceRecord {
            device_type: "SmartPlug".to_string(),
            hw_major_version: 1,
            hw_minor_version: 0,
            manu_string: "AlertMe.com".to_string(),
        }
    }

    #[test]
    fn test_upsert_replaces() {
        let addr: Address64 = "00:0d:6f:00:01:72:f7:1b".parse().unwrap();
        let mut registry = DeviceRegistry::new();
        assert!(registry.upsert(addr, plug_record()).is_none());

        let mut updated = plug_record();
        updated.hw_minor_version = 2;
        assert_eq!(registry.upsert(addr, updated.clone()), Some(plug_record()));
        assert_eq!(registry.get(&addr), Some(&updated));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_json_shape() {
        let addr: Address64 = "00:0d:6f:00:01:72:f7:1b".parse().unwrap();
        let mut registry = DeviceRegistry::new();
        registry.upsert(addr, plug_record());

        let json = serde_json::to_value(registry.list()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "00:0d:6f:00:01:72:f7:1b": {
                    "type": "SmartPlug",
                    "hwMajorVersion": 1,
                    "hwMinorVersion": 0,
                    "manu_string": "AlertMe.com"
                }
            })
        );
    }

    #[test]
    fn test_status_separate_from_identity() {
        let addr: Address64 = "00:0d:6f:00:03:bb:b9:f8".parse().unwrap();
        let mut registry = DeviceRegistry::new();
        registry.update_switch_state(addr, SwitchState::On);
        registry.update_power(addr, 42);

        assert!(registry.is_empty());
        assert_eq!(
            registry.status(&addr),
            Some(DeviceStatus {
                switch_state: Some(SwitchState::On),
                power: Some(42),
            })
        );
    }
}
