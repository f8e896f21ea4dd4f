//! Explicit-addressing API frames.
//!
//! Application traffic travels in two frame types:
//!
//! | Frame type | Direction | Layout (after the type byte) |
//! |------------|-----------|------------------------------|
//! | `0x11` TX explicit | host → radio | frame_id(1) dest_addr_long(8) dest_addr(2) src_endpoint(1) dest_endpoint(1) cluster(2) profile(2) broadcast_radius(1) options(1) data |
//! | `0x91` RX explicit | radio → host | source_addr_long(8) source_addr(2) source_endpoint(1) dest_endpoint(1) cluster(2) profile(2) options(1) rf_data |
//!
//! Multi-byte fields are big-endian. Every other frame type is passed through
//! untouched as [`ApiFrame::Other`].

use serde::Serialize;

use crate::{Address16, Address64, Frame, FrameError};

/// Explicit addressing command (transmit request).
pub const FRAME_TYPE_TX_EXPLICIT: u8 = 0x11;
/// Explicit RX indicator (received data).
pub const FRAME_TYPE_RX_EXPLICIT: u8 = 0x91;

/// Fixed part of a TX explicit payload.
pub const TX_EXPLICIT_HEADER_LEN: usize = 19;
/// Fixed part of an RX explicit payload.
pub const RX_EXPLICIT_HEADER_LEN: usize = 17;

/// A transmit request with explicit endpoints, cluster and profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxExplicit {
    /// Frame id used to correlate transmit status (0 disables status).
    pub frame_id: u8,
    /// Destination long address.
    pub dest_addr_long: Address64,
    /// Destination short address.
    pub dest_addr: Address16,
    /// Source endpoint.
    pub src_endpoint: u8,
    /// Destination endpoint.
    pub dest_endpoint: u8,
    /// Cluster id.
    pub cluster: u16,
    /// Profile id.
    pub profile: u16,
    /// Maximum hops for broadcasts (0 = network maximum).
    pub broadcast_radius: u8,
    /// Transmit options.
    pub options: u8,
    /// Application payload.
    pub data: Vec<u8>,
}

/// Data received with explicit endpoints, cluster and profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RxExplicit {
    /// Sender long address.
    pub source_addr_long: Address64,
    /// Sender short address.
    pub source_addr: Address16,
    /// Sender endpoint.
    pub source_endpoint: u8,
    /// Destination endpoint.
    pub dest_endpoint: u8,
    /// Cluster id.
    pub cluster: u16,
    /// Profile id.
    pub profile: u16,
    /// Receive options.
    pub options: u8,
    /// Application payload.
    pub rf_data: Vec<u8>,
}

/// An API frame understood by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "id", rename_all = "snake_case")]
pub enum ApiFrame {
    /// Outbound explicit transmit request.
    TxExplicit(TxExplicit),
    /// Inbound explicit receive indicator.
    RxExplicit(RxExplicit),
    /// Any other frame type, left opaque.
    Other(Frame),
}

impl ApiFrame {
    /// Short name of the frame kind.
    pub fn id(&self) -> &'static str {
        match self {
            ApiFrame::TxExplicit(_) => "tx_explicit",
            ApiFrame::RxExplicit(_) => "rx_explicit",
            ApiFrame::Other(_) => "unknown",
        }
    }

    /// Frame type byte.
    pub fn frame_type(&self) -> u8 {
        match self {
            ApiFrame::TxExplicit(_) => FRAME_TYPE_TX_EXPLICIT,
            ApiFrame::RxExplicit(_) => FRAME_TYPE_RX_EXPLICIT,
            ApiFrame::Other(frame) => frame.frame_type,
        }
    }

    /// Interpret a decoded transport frame.
    pub fn decode(frame: &Frame) -> Result<Self, FrameError> {
        let data = &frame.payload;
        match frame.frame_type {
            FRAME_TYPE_TX_EXPLICIT => {
                check_len(data, TX_EXPLICIT_HEADER_LEN)?;
                Ok(ApiFrame::TxExplicit(TxExplicit {
                    frame_id: data[0],
                    dest_addr_long: read_addr64(&data[1..9]),
                    dest_addr: Address16([data[9], data[10]]),
                    src_endpoint: data[11],
                    dest_endpoint: data[12],
                    cluster: u16::from_be_bytes([data[13], data[14]]),
                    profile: u16::from_be_bytes([data[15], data[16]]),
                    broadcast_radius: data[17],
                    options: data[18],
                    data: data[TX_EXPLICIT_HEADER_LEN..].to_vec(),
                }))
            }
            FRAME_TYPE_RX_EXPLICIT => {
                check_len(data, RX_EXPLICIT_HEADER_LEN)?;
                Ok(ApiFrame::RxExplicit(RxExplicit {
                    source_addr_long: read_addr64(&data[0..8]),
                    source_addr: Address16([data[8], data[9]]),
                    source_endpoint: data[10],
                    dest_endpoint: data[11],
                    cluster: u16::from_be_bytes([data[12], data[13]]),
                    profile: u16::from_be_bytes([data[14], data[15]]),
                    options: data[16],
                    rf_data: data[RX_EXPLICIT_HEADER_LEN..].to_vec(),
                }))
            }
            _ => Ok(ApiFrame::Other(frame.clone())),
        }
    }

    /// Build the transport frame carrying this API frame.
    pub fn to_frame(&self) -> Frame {
        match self {
            ApiFrame::TxExplicit(tx) => {
                let mut buf = Vec::with_capacity(TX_EXPLICIT_HEADER_LEN + tx.data.len());
                buf.push(tx.frame_id);
                buf.extend_from_slice(tx.dest_addr_long.as_bytes());
                buf.extend_from_slice(tx.dest_addr.as_bytes());
                buf.push(tx.src_endpoint);
                buf.push(tx.dest_endpoint);
                buf.extend_from_slice(&tx.cluster.to_be_bytes());
                buf.extend_from_slice(&tx.profile.to_be_bytes());
                buf.push(tx.broadcast_radius);
                buf.push(tx.options);
                buf.extend_from_slice(&tx.data);
                Frame::new(FRAME_TYPE_TX_EXPLICIT, buf)
            }
            ApiFrame::RxExplicit(rx) => {
                let mut buf = Vec::with_capacity(RX_EXPLICIT_HEADER_LEN + rx.rf_data.len());
                buf.extend_from_slice(rx.source_addr_long.as_bytes());
                buf.extend_from_slice(rx.source_addr.as_bytes());
                buf.push(rx.source_endpoint);
                buf.push(rx.dest_endpoint);
                buf.extend_from_slice(&rx.cluster.to_be_bytes());
                buf.extend_from_slice(&rx.profile.to_be_bytes());
                buf.push(rx.options);
                buf.extend_from_slice(&rx.rf_data);
                Frame::new(FRAME_TYPE_RX_EXPLICIT, buf)
            }
            ApiFrame::Other(frame) => frame.clone(),
        }
    }

    /// Encode straight to escaped wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        self.to_frame().encode()
    }
}

fn check_len(data: &[u8], expected: usize) -> Result<(), FrameError> {
    if data.len() < expected {
        return Err(FrameError::FrameTooShort {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn read_addr64(slice: &[u8]) -> Address64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(slice);
    Address64(bytes)
}
