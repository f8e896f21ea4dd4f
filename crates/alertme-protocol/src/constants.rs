//! Protocol constants
//!
//! Profile, cluster and command identifiers used by AlertMe devices, plus the
//! fixed header bytes each outbound message carries.

// ============================================================================
// Profile
// ============================================================================

/// AlertMe private profile id.
pub const ALERTME_PROFILE_ID: u16 = 0xC216;
/// ZigBee device object profile, used for network discovery.
pub const ZDO_PROFILE_ID: u16 = 0x0000;

// ============================================================================
// Clusters
// ============================================================================

/// Hardware/type/version information.
pub const CLUSTER_VERSION_INFO: u16 = 0x00F6;
/// Relay switch state.
pub const CLUSTER_SWITCH_STATE: u16 = 0x00EE;
/// Power measurement.
pub const CLUSTER_POWER: u16 = 0x00EF;
/// ZDO match descriptor request, sent by devices looking for a hub.
pub const CLUSTER_MATCH_DESCRIPTOR_REQUEST: u16 = 0x0006;

// ============================================================================
// Cluster header
// ============================================================================

/// Length of the header every cluster payload starts with.
pub const CLUSTER_HEADER_LEN: usize = 3;
/// Frame control used on requests (hub → device).
pub const FRAME_CONTROL_REQUEST: u8 = 0x11;
/// Frame control used on reports (device → hub).
pub const FRAME_CONTROL_REPORT: u8 = 0x09;

// ============================================================================
// Command Codes
// ============================================================================

/// Ask a plug for its current relay state.
pub const CMD_SWITCH_STATUS_QUERY: u8 = 0x01;
/// Ask a plug to change its relay state.
pub const CMD_SWITCH_STATE_CHANGE: u8 = 0x02;
/// Relay state report.
pub const CMD_SWITCH_STATE_REPORT: u8 = 0x80;
/// Instantaneous power report.
pub const CMD_POWER_INSTANT: u8 = 0x81;
/// Ask a device for its version information.
pub const CMD_VERSION_INFO_REQUEST: u8 = 0xFC;
/// Version information report.
pub const CMD_VERSION_INFO_REPORT: u8 = 0xFE;

// ============================================================================
// Fixed sequence numbers on generated reports
// ============================================================================

/// Sequence byte of a switch state report.
pub const SEQ_SWITCH_STATE_REPORT: u8 = 0x68;
/// Sequence byte of an instantaneous power report.
pub const SEQ_POWER_REPORT: u8 = 0x6A;
/// Sequence byte of a generated version info report.
pub const SEQ_VERSION_INFO_REPORT: u8 = 0x71;
/// Sequence byte of hub requests.
pub const SEQ_REQUEST: u8 = 0x00;

// ============================================================================
// Field values
// ============================================================================

/// Relay flag meaning "on" in a state change request.
pub const RELAY_ON: u8 = 0x01;
/// Relay flag meaning "off" in a state change request.
pub const RELAY_OFF: u8 = 0x00;
/// Last byte of a switch request.
pub const SWITCH_REQUEST_TRAILER: u8 = 0x01;
/// Status byte of a switch report when the relay is on.
pub const SWITCH_STATUS_ON: u8 = 0x07;
/// Status byte of a switch report when the relay is off.
pub const SWITCH_STATUS_OFF: u8 = 0x06;

/// Opaque bytes between the addresses and the hardware versions of a
/// version info report.
pub const DEFAULT_VERSION_REFERENCE: [u8; 6] = [0x39, 0x10, 0x07, 0x00, 0x00, 0x29];

// ============================================================================
// Endpoints
// ============================================================================

/// Endpoint of the AlertMe application on a device.
pub const ENDPOINT_ALERTME: u8 = 0x02;
/// ZDO/default endpoint used as source of identity and switch reports.
pub const ENDPOINT_DEFAULT: u8 = 0x00;

// ============================================================================
// Descriptions
// ============================================================================

/// Label of a version info report.
pub const DESC_VERSION_INFO: &str = "Type Info";
/// Label of a version info request.
pub const DESC_VERSION_INFO_REQUEST: &str = "Version Info Request";
/// Label of a switch state report.
pub const DESC_SWITCH_STATE_UPDATE: &str = "Switch State Update";
/// Label of a switch state change request.
pub const DESC_SWITCH_STATE_REQUEST: &str = "Switch State Request";
/// Label of a switch status query.
pub const DESC_SWITCH_STATUS_QUERY: &str = "Switch Status Query";
/// Label of an instantaneous power report.
pub const DESC_POWER: &str = "Current Instantaneous Power";
