//! Cluster command encoding and decoding.
//!
//! Payload layouts (offsets into the cluster payload):
//!
//! | Command | Cluster | Bytes |
//! |---------|---------|-------|
//! | Version info request | `0x00F6` | `11 00 FC` |
//! | Version info report | `0x00F6` | `09 seq FE short(2,LE) long(8,LE) reference(6) hw_minor(1) hw_major(1) pstr(manu) pstr(type) pstr(date)` |
//! | Switch status query | `0x00EE` | `11 00 01 01` |
//! | Switch state change | `0x00EE` | `11 00 02 relay_flag 01` |
//! | Switch state report | `0x00EE` | `09 68 80 status state` |
//! | Instantaneous power | `0x00EF` | `09 6A 81 power(2,LE)` |
//!
//! `pstr` is a one-byte length followed by that many bytes, no terminator.

use serde::Serialize;
use zigbee_frame::{Address16, Address64};

use crate::constants::*;
use crate::error::*;
use crate::types::*;

/// Offset of the short address in a version info report.
const VERSION_ADDR_SHORT_OFFSET: usize = 3;
/// Offset of the long address in a version info report.
const VERSION_ADDR_LONG_OFFSET: usize = 5;
/// Offset of the opaque reference bytes in a version info report.
const VERSION_REFERENCE_OFFSET: usize = 13;
/// Offset of the hardware minor version in a version info report.
const VERSION_HW_MINOR_OFFSET: usize = 19;
/// Offset of the hardware major version in a version info report.
const VERSION_HW_MAJOR_OFFSET: usize = 20;
/// Fixed part of a version info report, before the strings.
const VERSION_FIXED_LEN: usize = 21;

/// Length of a switch state change request.
const SWITCH_REQUEST_LEN: usize = 5;
/// Length of a switch state report.
const SWITCH_REPORT_LEN: usize = 5;
/// Length of a power report.
const POWER_REPORT_LEN: usize = 5;

/// AlertMe cluster commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum Command {
    /// Hub asks a device to announce its identity.
    VersionInfoRequest,

    /// Device identity announcement.
    VersionInfo(VersionInfo),

    /// Hub asks a plug for its relay state.
    SwitchStatusQuery,

    /// Hub asks a plug to switch its relay.
    SwitchStateRequest(SwitchState),

    /// Plug reports its relay state.
    SwitchStateUpdate(SwitchState),

    /// Plug reports its instantaneous power draw.
    PowerFactor {
        /// Power reading.
        power: u16,
    },
}

impl Command {
    /// Cluster this command belongs to.
    pub fn cluster(&self) -> u16 {
        match self {
            Command::VersionInfoRequest | Command::VersionInfo(_) => CLUSTER_VERSION_INFO,
            Command::SwitchStatusQuery
            | Command::SwitchStateRequest(_)
            | Command::SwitchStateUpdate(_) => CLUSTER_SWITCH_STATE,
            Command::PowerFactor { .. } => CLUSTER_POWER,
        }
    }

    /// Human readable label.
    pub fn description(&self) -> &'static str {
        match self {
            Command::VersionInfoRequest => DESC_VERSION_INFO_REQUEST,
            Command::VersionInfo(_) => DESC_VERSION_INFO,
            Command::SwitchStatusQuery => DESC_SWITCH_STATUS_QUERY,
            Command::SwitchStateRequest(_) => DESC_SWITCH_STATE_REQUEST,
            Command::SwitchStateUpdate(_) => DESC_SWITCH_STATE_UPDATE,
            Command::PowerFactor { .. } => DESC_POWER,
        }
    }

    /// Source and destination endpoints used when sending this command.
    pub fn endpoints(&self) -> (u8, u8) {
        match self {
            Command::VersionInfo(_) | Command::SwitchStateUpdate(_) => {
                (ENDPOINT_DEFAULT, ENDPOINT_ALERTME)
            }
            Command::VersionInfoRequest
            | Command::SwitchStatusQuery
            | Command::SwitchStateRequest(_)
            | Command::PowerFactor { .. } => (ENDPOINT_ALERTME, ENDPOINT_ALERTME),
        }
    }

    /// Encode the cluster payload.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        match self {
            Command::VersionInfoRequest => Ok(encode_version_info_request()),
            Command::VersionInfo(info) => encode_version_info(info),
            Command::SwitchStatusQuery => Ok(encode_switch_status_query()),
            Command::SwitchStateRequest(state) => Ok(encode_switch_state_request(*state)),
            Command::SwitchStateUpdate(state) => Ok(encode_switch_state_update(*state)),
            Command::PowerFactor { power } => Ok(encode_power_factor(*power)),
        }
    }

    /// Decode a cluster payload.
    ///
    /// Returns `Ok(None)` for clusters and sub-commands this codec does not
    /// handle; those are not errors.
    pub fn decode(cluster: u16, data: &[u8]) -> ProtocolResult<Option<Self>> {
        let known = matches!(
            cluster,
            CLUSTER_VERSION_INFO | CLUSTER_SWITCH_STATE | CLUSTER_POWER
        );
        if !known {
            return Ok(None);
        }

        let header = ClusterHeader::decode(data)?;
        let command = match (cluster, header.command) {
            (CLUSTER_VERSION_INFO, CMD_VERSION_INFO_REQUEST) => Command::VersionInfoRequest,
            (CLUSTER_VERSION_INFO, CMD_VERSION_INFO_REPORT) => {
                Command::VersionInfo(parse_version_info(data)?)
            }
            (CLUSTER_SWITCH_STATE, CMD_SWITCH_STATUS_QUERY) => Command::SwitchStatusQuery,
            (CLUSTER_SWITCH_STATE, CMD_SWITCH_STATE_CHANGE) => {
                Command::SwitchStateRequest(parse_switch_state_request(data)?)
            }
            (CLUSTER_SWITCH_STATE, CMD_SWITCH_STATE_REPORT) => {
                Command::SwitchStateUpdate(parse_switch_state_update(data)?)
            }
            (CLUSTER_POWER, CMD_POWER_INSTANT) => Command::PowerFactor {
                power: parse_power_factor(data)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

// ============================================================================
// Encoding Functions
// ============================================================================

/// Encode a version info request.
pub fn encode_version_info_request() -> Vec<u8> {
    ClusterHeader::new(FRAME_CONTROL_REQUEST, SEQ_REQUEST, CMD_VERSION_INFO_REQUEST)
        .encode()
        .to_vec()
}

/// Encode a version info report.
pub fn encode_version_info(info: &VersionInfo) -> ProtocolResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(
        VERSION_FIXED_LEN + 3 + info.manu_string.len() + info.device_type.len() + info.manu_date.len(),
    );
    buf.extend_from_slice(
        &ClusterHeader::new(FRAME_CONTROL_REPORT, info.sequence, CMD_VERSION_INFO_REPORT).encode(),
    );
    buf.extend_from_slice(&info.addr_short.to_le_bytes());
    buf.extend_from_slice(&info.addr_long.to_le_bytes());
    buf.extend_from_slice(&info.reference);
    buf.push(info.hw_minor_version);
    buf.push(info.hw_major_version);
    put_pascal_string(&mut buf, "manu_string", &info.manu_string)?;
    put_pascal_string(&mut buf, "type", &info.device_type)?;
    put_pascal_string(&mut buf, "manu_date", &info.manu_date)?;
    Ok(buf)
}

/// Encode a switch status query.
pub fn encode_switch_status_query() -> Vec<u8> {
    let mut buf = ClusterHeader::new(FRAME_CONTROL_REQUEST, SEQ_REQUEST, CMD_SWITCH_STATUS_QUERY)
        .encode()
        .to_vec();
    buf.push(SWITCH_REQUEST_TRAILER);
    buf
}

/// Encode a request to switch the relay.
pub fn encode_switch_state_request(state: SwitchState) -> Vec<u8> {
    let mut buf = ClusterHeader::new(FRAME_CONTROL_REQUEST, SEQ_REQUEST, CMD_SWITCH_STATE_CHANGE)
        .encode()
        .to_vec();
    buf.push(if state.is_on() { RELAY_ON } else { RELAY_OFF });
    buf.push(SWITCH_REQUEST_TRAILER);
    buf
}

/// Encode a relay state report.
pub fn encode_switch_state_update(state: SwitchState) -> Vec<u8> {
    let mut buf = ClusterHeader::new(
        FRAME_CONTROL_REPORT,
        SEQ_SWITCH_STATE_REPORT,
        CMD_SWITCH_STATE_REPORT,
    )
    .encode()
    .to_vec();
    match state {
        SwitchState::On => buf.extend_from_slice(&[SWITCH_STATUS_ON, 0x01]),
        SwitchState::Off => buf.extend_from_slice(&[SWITCH_STATUS_OFF, 0x00]),
    }
    buf
}

/// Encode an instantaneous power report.
pub fn encode_power_factor(power: u16) -> Vec<u8> {
    let mut buf = ClusterHeader::new(FRAME_CONTROL_REPORT, SEQ_POWER_REPORT, CMD_POWER_INSTANT)
        .encode()
        .to_vec();
    buf.extend_from_slice(&power.to_le_bytes());
    buf
}

fn put_pascal_string(buf: &mut Vec<u8>, field: &'static str, value: &str) -> ProtocolResult<()> {
    let bytes = value.as_bytes();
    if bytes.len() > u8::MAX as usize {
        return Err(ProtocolError::StringTooLong {
            field,
            len: bytes.len(),
        });
    }
    buf.push(bytes.len() as u8);
    buf.extend_from_slice(bytes);
    Ok(())
}

// ============================================================================
// Parsing Functions
// ============================================================================

/// Parse a switch state change request, returning the requested state.
pub fn parse_switch_state_request(data: &[u8]) -> ProtocolResult<SwitchState> {
    ProtocolError::check_len(data, SWITCH_REQUEST_LEN)?;
    if data[2] != CMD_SWITCH_STATE_CHANGE {
        return Err(ProtocolError::invalid_data(format!(
            "not a state change request: command 0x{:02X}",
            data[2]
        )));
    }
    match data[3] {
        RELAY_ON => Ok(SwitchState::On),
        RELAY_OFF => Ok(SwitchState::Off),
        flag => Err(ProtocolError::invalid_data(format!(
            "relay flag 0x{:02X}",
            flag
        ))),
    }
}

/// Parse a relay state report.
pub fn parse_switch_state_update(data: &[u8]) -> ProtocolResult<SwitchState> {
    ProtocolError::check_len(data, SWITCH_REPORT_LEN)?;
    SwitchState::from_u8(data[4])
        .ok_or_else(|| ProtocolError::invalid_data(format!("switch state 0x{:02X}", data[4])))
}

/// Parse an instantaneous power report.
pub fn parse_power_factor(data: &[u8]) -> ProtocolResult<u16> {
    ProtocolError::check_len(data, POWER_REPORT_LEN)?;
    Ok(u16::from_le_bytes([data[3], data[4]]))
}

/// Parse a version info report.
///
/// The fixed header is read at known offsets, then the three strings are
/// scanned one length prefix at a time.
pub fn parse_version_info(data: &[u8]) -> ProtocolResult<VersionInfo> {
    ProtocolError::check_len(data, VERSION_FIXED_LEN)?;

    let mut short = [0u8; 2];
    short.copy_from_slice(&data[VERSION_ADDR_SHORT_OFFSET..VERSION_ADDR_LONG_OFFSET]);
    let mut long = [0u8; 8];
    long.copy_from_slice(&data[VERSION_ADDR_LONG_OFFSET..VERSION_REFERENCE_OFFSET]);
    let mut reference = [0u8; 6];
    reference.copy_from_slice(&data[VERSION_REFERENCE_OFFSET..VERSION_HW_MINOR_OFFSET]);

    let mut i = VERSION_FIXED_LEN;
    let manu_string = read_pascal_string(data, &mut i)?;
    let device_type = read_pascal_string(data, &mut i)?;
    let manu_date = read_pascal_string(data, &mut i)?;

    Ok(VersionInfo {
        sequence: data[1],
        addr_short: Address16::from_le_bytes(short),
        addr_long: Address64::from_le_bytes(long),
        reference,
        hw_minor_version: data[VERSION_HW_MINOR_OFFSET],
        hw_major_version: data[VERSION_HW_MAJOR_OFFSET],
        manu_string,
        device_type,
        manu_date,
    })
}

fn read_pascal_string(data: &[u8], i: &mut usize) -> ProtocolResult<String> {
    ProtocolError::check_len(data, *i + 1)?;
    let len = data[*i] as usize;
    let start = *i + 1;
    ProtocolError::check_len(data, start + len)?;
    let text = std::str::from_utf8(&data[start..start + len])
        .map_err(|_| ProtocolError::InvalidUtf8)?
        .to_string();
    *i = start + len;
    Ok(text)
}
