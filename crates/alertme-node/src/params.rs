//! Message kinds and generation parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::Identity;
use crate::error::{NodeError, NodeResult};

/// Messages a node can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Identity announcement (version info report).
    VersionInfoUpdate,
    /// Ask a device to announce its identity.
    VersionInfoRequest,
    /// Relay state report.
    SwitchStateUpdate,
    /// Instantaneous power report.
    PowerFactorUpdate,
    /// Ask a plug to switch its relay.
    SwitchStateRequest,
    /// Ask a plug for its relay state.
    SwitchStatusQuery,
}

impl MessageKind {
    /// Every kind, in a stable order.
    pub const ALL: [MessageKind; 6] = [
        MessageKind::VersionInfoUpdate,
        MessageKind::VersionInfoRequest,
        MessageKind::SwitchStateUpdate,
        MessageKind::PowerFactorUpdate,
        MessageKind::SwitchStateRequest,
        MessageKind::SwitchStatusQuery,
    ];

    /// Name used in configuration and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::VersionInfoUpdate => "version_info_update",
            MessageKind::VersionInfoRequest => "version_info_request",
            MessageKind::SwitchStateUpdate => "switch_state_update",
            MessageKind::PowerFactorUpdate => "power_factor_update",
            MessageKind::SwitchStateRequest => "switch_state_request",
            MessageKind::SwitchStatusQuery => "switch_status_query",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        MessageKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| NodeError::UnknownKind(s.to_string()))
    }
}

/// Values used when generating a message.
///
/// Anything left unset falls back to the node's own state and identity.
/// Deserializes from any map; keys it does not know are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageParams {
    /// Device type.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_type: Option<String>,
    /// Hardware major version.
    #[serde(
        alias = "hwMajorVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hw_major_version: Option<u8>,
    /// Hardware minor version.
    #[serde(
        alias = "hwMinorVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hw_minor_version: Option<u8>,
    /// Manufacturer name.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub manu_string: Option<String>,
    /// Manufacture date.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub manu_date: Option<String>,
    /// Relay state: 0 = off, 1 = on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<u8>,
    /// Power reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<u16>,
}

impl MessageParams {
    /// Empty parameters: everything comes from the node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the relay state.
    pub fn with_state(mut self, state: u8) -> Self {
        self.state = Some(state);
        self
    }

    /// Build from `key=value` style pairs.
    ///
    /// Values that parse as JSON scalars are taken as such, everything else
    /// is a string.
    pub fn from_pairs<I, K, V>(pairs: I) -> NodeResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut map = serde_json::Map::new();
        for (key, value) in pairs {
            let value = value.as_ref();
            let parsed = match serde_json::from_str::<serde_json::Value>(value) {
                Ok(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => v,
                _ => serde_json::Value::String(value.to_string()),
            };
            map.insert(key.into(), parsed);
        }
        Self::from_json(serde_json::Value::Object(map))
    }

    /// Build from a JSON object.
    pub fn from_json(value: serde_json::Value) -> NodeResult<Self> {
        serde_json::from_value(value).map_err(|e| NodeError::config(e.to_string()))
    }

    /// The identity fields carried by these parameters.
    pub fn identity(&self) -> Identity {
        Identity {
            device_type: self.device_type.clone(),
            hw_major_version: self.hw_major_version,
            hw_minor_version: self.hw_minor_version,
            manu_string: self.manu_string.clone(),
            manu_date: self.manu_date.clone(),
        }
    }
}

/// Accept numbers where a string is expected, so `manu_date=2013` works.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        for kind in MessageKind::ALL {
            assert_eq!(kind.as_str().parse::<MessageKind>().unwrap(), kind);
        }
        assert!(matches!(
            "switch_toggle".parse::<MessageKind>(),
            Err(NodeError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_params_from_json_ignores_unknown_keys() {
        let params = MessageParams::from_json(serde_json::json!({
            "type": "SmartPlug",
            "hwMajorVersion": 1,
            "hwMinorVersion": 0,
            "manu_string": "AlertMe.com",
            "colour": "blue"
        }))
        .unwrap();
        assert_eq!(params.device_type.as_deref(), Some("SmartPlug"));
        assert_eq!(params.hw_major_version, Some(1));
        assert_eq!(params.hw_minor_version, Some(0));
        assert_eq!(params.manu_string.as_deref(), Some("AlertMe.com"));
        assert_eq!(params.manu_date, None);
    }

    #[test]
    fn test_params_from_pairs() {
        let params = MessageParams::from_pairs([
            ("state", "1"),
            ("power", "10"),
            ("manu_date", "2013-09-26"),
            ("type", "2013"),
        ])
        .unwrap();
        assert_eq!(params.state, Some(1));
        assert_eq!(params.power, Some(10));
        assert_eq!(params.manu_date.as_deref(), Some("2013-09-26"));
        assert_eq!(params.device_type.as_deref(), Some("2013"));
    }

    #[test]
    fn test_params_out_of_range() {
        let result = MessageParams::from_pairs([("hw_major_version", "300")]);
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn test_params_identity() {
        let params = MessageParams {
            device_type: Some("Lamp".to_string()),
            hw_minor_version: Some(3),
            ..Default::default()
        };
        let identity = params.identity();
        assert_eq!(identity.device_type.as_deref(), Some("Lamp"));
        assert_eq!(identity.hw_minor_version, Some(3));
        assert!(!identity.is_complete());
    }
}
