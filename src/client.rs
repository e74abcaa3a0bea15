//! Per-session client state and the connect state machine.

use std::time::Duration;

use mqttbytes::v4::Connect;

use crate::engine::keep_alive::KeepAliveTimer;
use crate::engine::pending::AckTable;

/// Stages of the staged connect handshake.
///
/// A client only moves forward along `Disconnected → TcpPending →
/// TlsPending → MqttConnectSent → Established`, skipping stages that
/// complete synchronously, and drops back to `Disconnected` on failure or
/// disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectState {
    Disconnected,
    /// TCP connect started, waiting for completion.
    TcpPending,
    /// TLS handshake started, waiting for completion.
    TlsPending,
    /// CONNECT sent, waiting for CONNACK.
    MqttConnectSent,
    Established,
}

impl ConnectState {
    /// Whether moving to `next` follows the handshake order. Dropping back
    /// to `Disconnected` is always allowed.
    fn permits(self, next: ConnectState) -> bool {
        use ConnectState::*;
        match next {
            Disconnected => true,
            TcpPending => self == Disconnected,
            TlsPending => matches!(self, Disconnected | TcpPending),
            MqttConnectSent => matches!(self, Disconnected | TcpPending | TlsPending),
            Established => self == MqttConnectSent,
        }
    }
}

/// Rejected connect-state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid connect state transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: ConnectState,
    pub to: ConnectState,
}

/// Handshake inputs saved while a connect attempt is in flight, so later
/// stages can be resumed from readiness events.
#[derive(Debug)]
pub(crate) struct Handshake {
    /// Parsed host, presented for SNI when TLS is on.
    pub server_name: String,
    pub tls: bool,
    pub connect: Connect,
    pub keep_alive: Duration,
}

/// One logical MQTT session, owned by the registry.
#[derive(Debug)]
pub struct Client<T> {
    client_id: String,
    pub(crate) transport: T,
    state: ConnectState,
    good: bool,
    ping_outstanding: bool,
    pub(crate) handshake: Option<Handshake>,
    pub(crate) pending_acks: AckTable,
    pub(crate) keep_alive: KeepAliveTimer,
}

impl<T> Client<T> {
    pub fn new<S: ToString>(client_id: S, transport: T) -> Self {
        Self {
            client_id: client_id.to_string(),
            transport,
            state: ConnectState::Disconnected,
            good: true,
            ping_outstanding: false,
            handshake: None,
            pending_acks: AckTable::new(),
            keep_alive: KeepAliveTimer::disabled(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn state(&self) -> ConnectState {
        self.state
    }

    /// False once a fatal transport or handshake error occurred.
    pub fn is_good(&self) -> bool {
        self.good
    }

    /// A PINGREQ went out and its PINGRESP has not come back yet.
    pub fn ping_outstanding(&self) -> bool {
        self.ping_outstanding
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub(crate) fn set_good(&mut self, good: bool) {
        self.good = good;
    }

    pub(crate) fn set_ping_outstanding(&mut self, outstanding: bool) {
        self.ping_outstanding = outstanding;
    }

    /// Advance the connect state machine, rejecting transitions that do
    /// not follow the handshake order.
    pub(crate) fn advance(&mut self, next: ConnectState) -> Result<(), InvalidTransition> {
        if !self.state.permits(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        log::debug!(
            "client {} state {:?} -> {:?}",
            self.client_id,
            self.state,
            next
        );
        self.state = next;
        Ok(())
    }

    /// Drop back to `Disconnected` and clear all in-flight handshake and
    /// ack state. The transport is the caller's to close.
    pub(crate) fn reset(&mut self) {
        if self.state != ConnectState::Disconnected {
            log::debug!(
                "client {} state {:?} -> {:?}",
                self.client_id,
                self.state,
                ConnectState::Disconnected
            );
        }
        self.state = ConnectState::Disconnected;
        self.handshake = None;
        self.ping_outstanding = false;
        self.pending_acks.clear();
        self.keep_alive = KeepAliveTimer::disabled();
    }
}
