//! Nodes and their roles.
//!
//! A [`Node`] owns its addresses, identity, transport slot and I/O loop. What
//! it does with inbound commands is decided by its [`Role`]: the hub keeps a
//! registry, the plug switches its relay, a generic device only announces
//! itself. Roles never touch the transport; they return the kinds of
//! message to send back and the node builds, encodes and writes them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alertme_protocol::{
    Command, Message, ReceivedMessage, SwitchState, VersionInfo,
};
use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, trace, warn};
use zigbee_frame::{Address16, Address64, ApiFrame, Frame};

use crate::config::{Identity, NodeConfig, NodeRole};
use crate::error::{NodeError, NodeResult};
use crate::io_loop::IoLoop;
use crate::params::{MessageKind, MessageParams};
use crate::transport::{Link, Transport};

/// Behaviour of a node variant.
pub trait Role: Send + 'static {
    /// Which variant this is.
    fn kind(&self) -> NodeRole;

    /// Identity announced when the configuration leaves fields unset.
    fn default_identity(&self) -> Identity {
        Identity::default()
    }

    /// Current relay state, for nodes that have one.
    fn switch_state(&self) -> Option<SwitchState> {
        None
    }

    /// Current power reading, for nodes that measure one.
    fn power(&self) -> Option<u16> {
        None
    }

    /// Apply an inbound AlertMe command and name the replies to send back to
    /// the sender.
    fn on_command(&mut self, from: &ReceivedMessage, command: &Command) -> Vec<MessageKind>;

    /// Inbound traffic that carries no AlertMe command. Ignored by default.
    fn on_other(&mut self, _from: &ReceivedMessage) -> Vec<MessageKind> {
        Vec::new()
    }
}

struct Shared<R> {
    name: String,
    addresses: RwLock<(Address64, Address16)>,
    identity: Identity,
    poll_interval: Duration,
    role: Mutex<R>,
    link: Link,
    frames_handled: AtomicU64,
}

impl<R: Role> Shared<R> {
    fn process_frame(&self, frame: &Frame) -> NodeResult<Vec<Message>> {
        match ApiFrame::decode(frame)? {
            ApiFrame::RxExplicit(rx) => self.receive_message(&ReceivedMessage::from(rx)),
            other => {
                trace!(node = %self.name, "ignoring {} frame 0x{:02x}", other.id(), other.frame_type());
                Ok(Vec::new())
            }
        }
    }

    fn receive_message(&self, msg: &ReceivedMessage) -> NodeResult<Vec<Message>> {
        let command = msg.command()?;

        // Replies are built under the same guard that applied the command,
        // so they report the state the command produced.
        let replies = {
            let mut role = self.role.lock();
            let kinds = match &command {
                Some(command) => {
                    debug!(
                        node = %self.name,
                        from = %msg.source_addr_long,
                        "received {}",
                        command.description()
                    );
                    role.on_command(msg, command)
                }
                None => {
                    trace!(
                        node = %self.name,
                        from = %msg.source_addr_long,
                        "no handler for cluster 0x{:04x} profile 0x{:04x}",
                        msg.cluster,
                        msg.profile
                    );
                    role.on_other(msg)
                }
            };

            let mut replies = Vec::with_capacity(kinds.len());
            for kind in kinds {
                match self.build_message(&role, kind, &MessageParams::default()) {
                    Ok(reply) => replies.push(reply),
                    Err(NodeError::MissingParameter(name)) => {
                        debug!(node = %self.name, "cannot send {}: missing {}", kind, name);
                    }
                    Err(e) => return Err(e),
                }
            }
            replies
        };

        for reply in &replies {
            self.write_message(reply, msg.source_addr_long, msg.source_addr)?;
        }
        Ok(replies)
    }

    fn generate_message(&self, kind: MessageKind, params: &MessageParams) -> NodeResult<Message> {
        let role = self.role.lock();
        self.build_message(&role, kind, params)
    }

    fn build_message(&self, role: &R, kind: MessageKind, params: &MessageParams) -> NodeResult<Message> {
        let command = match kind {
            MessageKind::VersionInfoUpdate => {
                let identity = params.identity().or(&self.identity);
                let (addr_long, addr_short) = *self.addresses.read();
                Command::VersionInfo(VersionInfo {
                    addr_short,
                    addr_long,
                    hw_minor_version: identity
                        .hw_minor_version
                        .ok_or(NodeError::MissingParameter("hw_minor_version"))?,
                    hw_major_version: identity
                        .hw_major_version
                        .ok_or(NodeError::MissingParameter("hw_major_version"))?,
                    manu_string: identity
                        .manu_string
                        .ok_or(NodeError::MissingParameter("manu_string"))?,
                    device_type: identity
                        .device_type
                        .ok_or(NodeError::MissingParameter("type"))?,
                    manu_date: identity
                        .manu_date
                        .ok_or(NodeError::MissingParameter("manu_date"))?,
                    ..VersionInfo::default()
                })
            }
            MessageKind::VersionInfoRequest => Command::VersionInfoRequest,
            MessageKind::SwitchStateUpdate => {
                let state = match params.state {
                    Some(value) => state_param(value)?,
                    None => role
                        .switch_state()
                        .ok_or(NodeError::MissingParameter("state"))?,
                };
                Command::SwitchStateUpdate(state)
            }
            MessageKind::PowerFactorUpdate => {
                let power = match params.power {
                    Some(power) => power,
                    None => role.power().ok_or(NodeError::MissingParameter("power"))?,
                };
                Command::PowerFactor { power }
            }
            MessageKind::SwitchStateRequest => {
                let value = params.state.ok_or(NodeError::MissingParameter("state"))?;
                Command::SwitchStateRequest(state_param(value)?)
            }
            MessageKind::SwitchStatusQuery => Command::SwitchStatusQuery,
        };
        Ok(Message::from_command(&command)?)
    }

    fn write_message(
        &self,
        msg: &Message,
        dest_long: Address64,
        dest_short: Address16,
    ) -> NodeResult<bool> {
        let bytes = ApiFrame::TxExplicit(msg.to_tx_explicit(dest_long, dest_short)).encode()?;
        let written = self.link.write(&bytes)?;
        if written {
            debug!(node = %self.name, to = %dest_long, "sent {}", msg.description);
        } else {
            trace!(node = %self.name, "not started, {} not sent", msg.description);
        }
        Ok(written)
    }
}

fn state_param(value: u8) -> NodeResult<SwitchState> {
    SwitchState::from_u8(value)
        .ok_or_else(|| NodeError::invalid_parameter("state", format!("expected 0 or 1, got {}", value)))
}

/// A node on the AlertMe network.
///
/// Message handling and generation work whether or not the node is started;
/// only a started node writes replies to a transport.
pub struct Node<R: Role> {
    shared: Arc<Shared<R>>,
    io: Mutex<Option<IoLoop>>,
}

impl<R: Role + Default> Node<R> {
    /// Create a node with the role's initial state.
    pub fn new(config: &NodeConfig) -> Self {
        Self::with_role(config, R::default())
    }
}

impl<R: Role> Node<R> {
    /// Create a node with an explicit role value.
    pub fn with_role(config: &NodeConfig, role: R) -> Self {
        let identity = config
            .identity
            .clone()
            .unwrap_or_default()
            .or(&role.default_identity());

        Node {
            shared: Arc::new(Shared {
                name: config.name.clone(),
                addresses: RwLock::new((config.addr_long, config.addr_short)),
                identity,
                poll_interval: config.poll_interval(),
                role: Mutex::new(role),
                link: Link::default(),
                frames_handled: AtomicU64::new(0),
            }),
            io: Mutex::new(None),
        }
    }

    /// Node name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Own long address.
    pub fn addr_long(&self) -> Address64 {
        self.shared.addresses.read().0
    }

    /// Own short address.
    pub fn addr_short(&self) -> Address16 {
        self.shared.addresses.read().1
    }

    /// Change the node's addresses, e.g. after the radio reports them.
    pub fn set_addresses(&self, addr_long: Address64, addr_short: Address16) {
        *self.shared.addresses.write() = (addr_long, addr_short);
    }

    /// Identity the node announces by default.
    pub fn identity(&self) -> &Identity {
        &self.shared.identity
    }

    /// Lock and access the role state.
    ///
    /// Do not hold the guard across calls into the node.
    pub fn role(&self) -> MutexGuard<'_, R> {
        self.shared.role.lock()
    }

    /// Frames the I/O loop has finished handling since the node was created,
    /// including frames whose payload was rejected.
    pub fn frames_handled(&self) -> u64 {
        self.shared.frames_handled.load(Ordering::Acquire)
    }

    /// Whether the I/O loop is running.
    pub fn is_running(&self) -> bool {
        self.io.lock().is_some()
    }

    /// Bind the node to `transport` and start its I/O loop.
    pub fn start<T: Transport + 'static>(&self, transport: T) -> NodeResult<()> {
        let mut io = self.io.lock();
        if io.is_some() {
            return Err(NodeError::AlreadyStarted);
        }

        self.shared.link.attach(Box::new(transport));
        let shared = Arc::clone(&self.shared);
        let spawned = IoLoop::spawn(
            &self.shared.name,
            self.shared.link.clone(),
            self.shared.poll_interval,
            move |frame| {
                if let Err(e) = shared.process_frame(&frame) {
                    warn!(node = %shared.name, "dropping frame: {}", e);
                }
                shared.frames_handled.fetch_add(1, Ordering::Release);
            },
        );

        match spawned {
            Ok(io_loop) => {
                *io = Some(io_loop);
                debug!(node = %self.shared.name, "started");
                Ok(())
            }
            Err(e) => {
                self.shared.link.detach();
                Err(e.into())
            }
        }
    }

    /// Stop the I/O loop after the frame in progress and release the
    /// transport.
    pub fn halt(&self) -> NodeResult<()> {
        let io_loop = self.io.lock().take().ok_or(NodeError::NotStarted)?;
        io_loop.halt();
        self.shared.link.detach();
        debug!(node = %self.shared.name, "halted");
        Ok(())
    }

    /// Handle one inbound message.
    ///
    /// Returns the replies generated. When the node is started they have
    /// already been written to the transport. Messages without a handler
    /// are ignored.
    pub fn receive_message(&self, msg: &ReceivedMessage) -> NodeResult<Vec<Message>> {
        self.shared.receive_message(msg)
    }

    /// Handle one decoded transport frame. Frames other than explicit
    /// receive indicators are ignored.
    pub fn process_frame(&self, frame: &Frame) -> NodeResult<Vec<Message>> {
        self.shared.process_frame(frame)
    }

    /// Build a message. Values missing from `params` come from the node's
    /// state and identity.
    pub fn generate_message(&self, kind: MessageKind, params: &MessageParams) -> NodeResult<Message> {
        self.shared.generate_message(kind, params)
    }

    /// Address `msg` to a peer and write it to the transport.
    pub fn send_message(
        &self,
        msg: &Message,
        dest_long: Address64,
        dest_short: Address16,
    ) -> NodeResult<()> {
        if self.shared.write_message(msg, dest_long, dest_short)? {
            Ok(())
        } else {
            Err(NodeError::NotStarted)
        }
    }
}

impl<R: Role> Drop for Node<R> {
    fn drop(&mut self) {
        if let Some(io_loop) = self.io.get_mut().take() {
            io_loop.halt();
            self.shared.link.detach();
        }
    }
}

impl<R: Role> std::fmt::Debug for Node<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.shared.name)
            .field("role", &self.shared.role.lock().kind())
            .field("addr_long", &self.addr_long())
            .field("running", &self.is_running())
            .finish()
    }
}
