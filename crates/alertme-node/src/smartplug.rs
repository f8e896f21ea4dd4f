//! SmartPlug role.

use alertme_protocol::{Command, Message, ReceivedMessage, SwitchState};
use tracing::{debug, trace};

use crate::config::{Identity, NodeRole};
use crate::error::NodeResult;
use crate::node::{Node, Role};
use crate::params::{MessageKind, MessageParams};

/// Relay and power meter of a plug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmartPlugRole {
    /// Relay state. Plugs power up switched off.
    pub state: SwitchState,
    /// Last power reading.
    pub power: u16,
}

impl SmartPlugRole {
    /// Create a plug that is off and drawing nothing.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Role for SmartPlugRole {
    fn kind(&self) -> NodeRole {
        NodeRole::SmartPlug
    }

    fn default_identity(&self) -> Identity {
        Identity {
            device_type: Some("SmartPlug".to_string()),
            hw_major_version: Some(1),
            hw_minor_version: Some(0),
            manu_string: Some("AlertMe.com".to_string()),
            manu_date: Some("2013-09-26".to_string()),
        }
    }

    fn switch_state(&self) -> Option<SwitchState> {
        Some(self.state)
    }

    fn power(&self) -> Option<u16> {
        Some(self.power)
    }

    fn on_command(&mut self, from: &ReceivedMessage, command: &Command) -> Vec<MessageKind> {
        match command {
            Command::SwitchStateRequest(state) => {
                debug!(from = %from.source_addr_long, "relay {} -> {}", self.state, state);
                self.state = *state;
                vec![MessageKind::SwitchStateUpdate]
            }
            Command::SwitchStatusQuery => vec![MessageKind::SwitchStateUpdate],
            Command::VersionInfoRequest => vec![MessageKind::VersionInfoUpdate],
            other => {
                trace!("plug ignores {}", other.description());
                Vec::new()
            }
        }
    }
}

/// A SmartPlug node.
pub type SmartPlug = Node<SmartPlugRole>;

impl Node<SmartPlugRole> {
    /// Relay state.
    pub fn state(&self) -> SwitchState {
        self.role().state
    }

    /// Switch the relay locally.
    pub fn set_state(&self, state: SwitchState) {
        self.role().state = state;
    }

    /// Power reading.
    pub fn power(&self) -> u16 {
        self.role().power
    }

    /// Record a new power reading.
    pub fn set_power(&self, power: u16) {
        self.role().power = power;
    }

    /// Report of the current relay state.
    pub fn generate_switch_state_update(&self) -> NodeResult<Message> {
        self.generate_message(MessageKind::SwitchStateUpdate, &MessageParams::default())
    }

    /// Report of the current power reading.
    pub fn generate_power_factor(&self) -> NodeResult<Message> {
        self.generate_message(MessageKind::PowerFactorUpdate, &MessageParams::default())
    }

    /// Identity announcement.
    pub fn generate_type_update(&self) -> NodeResult<Message> {
        self.generate_message(MessageKind::VersionInfoUpdate, &MessageParams::default())
    }
}
