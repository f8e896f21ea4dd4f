//! Application-level message envelopes.

use serde::Serialize;
use zigbee_frame::{Address16, Address64, RxExplicit, TxExplicit};

use crate::commands::Command;
use crate::constants::*;
use crate::error::*;

/// An outbound message built by a node, before it is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Human readable label.
    pub description: &'static str,
    /// Source endpoint.
    pub src_endpoint: u8,
    /// Destination endpoint.
    pub dest_endpoint: u8,
    /// Cluster id.
    pub cluster: u16,
    /// Profile id.
    pub profile: u16,
    /// Cluster payload.
    pub data: Vec<u8>,
}

impl Message {
    /// Build the message that carries `command`.
    pub fn from_command(command: &Command) -> ProtocolResult<Self> {
        let (src_endpoint, dest_endpoint) = command.endpoints();
        Ok(Message {
            description: command.description(),
            src_endpoint,
            dest_endpoint,
            cluster: command.cluster(),
            profile: ALERTME_PROFILE_ID,
            data: command.encode()?,
        })
    }

    /// Address this message as a transmit request.
    pub fn to_tx_explicit(&self, dest_addr_long: Address64, dest_addr: Address16) -> TxExplicit {
        TxExplicit {
            frame_id: 0,
            dest_addr_long,
            dest_addr,
            src_endpoint: self.src_endpoint,
            dest_endpoint: self.dest_endpoint,
            cluster: self.cluster,
            profile: self.profile,
            broadcast_radius: 0,
            options: 0,
            data: self.data.clone(),
        }
    }

    /// The message as a peer would receive it from `source_addr_long`.
    pub fn into_received(self, source_addr_long: Address64, source_addr: Address16) -> ReceivedMessage {
        ReceivedMessage {
            source_addr_long,
            source_addr,
            source_endpoint: self.src_endpoint,
            dest_endpoint: self.dest_endpoint,
            cluster: self.cluster,
            profile: self.profile,
            options: 0x01,
            data: self.data,
        }
    }
}

/// An inbound message, as delivered by an explicit receive frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceivedMessage {
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
    /// Link-layer receive options.
    pub options: u8,
    /// Cluster payload.
    pub data: Vec<u8>,
}

impl ReceivedMessage {
    /// Whether this message uses the AlertMe profile.
    pub fn is_alertme(&self) -> bool {
        self.profile == ALERTME_PROFILE_ID
    }

    /// Whether this is a ZDO match descriptor request from a device joining
    /// the network.
    pub fn is_match_descriptor_request(&self) -> bool {
        self.profile == ZDO_PROFILE_ID && self.cluster == CLUSTER_MATCH_DESCRIPTOR_REQUEST
    }

    /// Decode the AlertMe command carried by this message.
    ///
    /// Returns `Ok(None)` for other profiles and for clusters or
    /// sub-commands the codec does not handle.
    pub fn command(&self) -> ProtocolResult<Option<Command>> {
        if !self.is_alertme() {
            return Ok(None);
        }
        Command::decode(self.cluster, &self.data)
    }
}

impl From<RxExplicit> for ReceivedMessage {
    fn from(rx: RxExplicit) -> Self {
        ReceivedMessage {
            source_addr_long: rx.source_addr_long,
            source_addr: rx.source_addr,
            source_endpoint: rx.source_endpoint,
            dest_endpoint: rx.dest_endpoint,
            cluster: rx.cluster,
            profile: rx.profile,
            options: rx.options,
            data: rx.rf_data,
        }
    }
}

impl From<ReceivedMessage> for RxExplicit {
    fn from(msg: ReceivedMessage) -> Self {
        RxExplicit {
            source_addr_long: msg.source_addr_long,
            source_addr: msg.source_addr,
            source_endpoint: msg.source_endpoint,
            dest_endpoint: msg.dest_endpoint,
            cluster: msg.cluster,
            profile: msg.profile,
            options: msg.options,
            rf_data: msg.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SwitchState;

    #[test]
    fn test_switch_state_update_message() {
        let msg = Message::from_command(&Command::SwitchStateUpdate(SwitchState::On)).unwrap();
        assert_eq!(msg.description, "Switch State Update");
        assert_eq!(msg.src_endpoint, 0x00);
        assert_eq!(msg.dest_endpoint, 0x02);
        assert_eq!(msg.cluster, 0x00EE);
        assert_eq!(msg.profile, 0xC216);
        assert_eq!(msg.data, b"\th\x80\x07\x01");
    }

    #[test]
    fn test_power_message_endpoints() {
        let msg = Message::from_command(&Command::PowerFactor { power: 10 }).unwrap();
        assert_eq!(msg.description, "Current Instantaneous Power");
        assert_eq!((msg.src_endpoint, msg.dest_endpoint), (0x02, 0x02));
        assert_eq!(msg.cluster, 0x00EF);
    }

    #[test]
    fn test_into_received_decodes() {
        let addr: Address64 = "00:0d:6f:00:00:00:ff:ff".parse().unwrap();
        let msg = Message::from_command(&Command::SwitchStateRequest(SwitchState::On)).unwrap();
        let received = msg.into_received(addr, Address16([0x88, 0xfd]));
        assert_eq!(received.source_addr_long, addr);
        assert_eq!(
            received.command().unwrap(),
            Some(Command::SwitchStateRequest(SwitchState::On))
        );
    }

    #[test]
    fn test_other_profile_ignored() {
        let received = ReceivedMessage {
            source_addr_long: Address64::default(),
            source_addr: Address16::default(),
            source_endpoint: 0,
            dest_endpoint: 0,
            cluster: 0x00EE,
            profile: 0x0000,
            options: 1,
            data: b"\x11\x00\x02\x01\x01".to_vec(),
        };
        assert_eq!(received.command().unwrap(), None);
        assert!(!received.is_match_descriptor_request());
    }

    #[test]
    fn test_match_descriptor_request() {
        let received = ReceivedMessage {
            source_addr_long: "00:13:a2:00:40:a2:3b:09".parse().unwrap(),
            source_addr: Address16([0x52, 0x4b]),
            source_endpoint: 0,
            dest_endpoint: 0,
            cluster: 0x0006,
            profile: 0x0000,
            options: 1,
            data: b"\x01\xfd\xff\x16\xc2\x00\x01\xf0\x00".to_vec(),
        };
        assert!(received.is_match_descriptor_request());
        assert_eq!(received.command().unwrap(), None);
    }

    #[test]
    fn test_message_json() {
        let msg = Message::from_command(&Command::PowerFactor { power: 0 }).unwrap();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["description"], "Current Instantaneous Power");
        assert_eq!(json["cluster"], 0xEF);
    }
}
