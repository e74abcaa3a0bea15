//! The protocol engine: staged connect, subscriptions, inbound acks and
//! keepalive, driven one step at a time by an external readiness loop.
//!
//! The engine owns the [`ClientRegistry`] and keys every operation by
//! [`SocketId`]. Nothing here blocks: an operation either finishes
//! synchronously or parks a handshake stage and reports
//! [`Pending`](crate::transport::Progress::Pending)/
//! [`Interrupted`](crate::transport::Progress::Interrupted) for the loop
//! to resume later. The engine assumes a single writer; a multi-threaded embedder
//! wraps it in its own synchronization.

pub mod keep_alive;
pub mod pending;

mod acks;
mod connect;
#[cfg(test)]
pub(crate) mod mock;
mod subscribe;

use std::time::Duration;

use bytes::BytesMut;
use mqttbytes::v4::{Connect, ConnectReturnCode, Packet};
pub use mqttbytes::v4::{LastWill, Login};
pub use mqttbytes::{Protocol, QoS};
use thiserror::Error;

use crate::client::{Client, ConnectState, InvalidTransition};
use crate::codec::CodecError;
use crate::registry::{ClientRegistry, SocketId};
use crate::transport::{Transport, TransportError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    State(#[from] InvalidTransition),
    /// A packet was dispatched for a socket no client is registered
    /// under. This is an internal invariant violation, not a protocol
    /// error.
    #[error("no client registered for socket {0}")]
    UnknownSocket(SocketId),
    #[error("client id {0:?} is already registered")]
    DuplicateClientId(String),
    #[error("a connect attempt is already in flight")]
    ConnectInFlight,
    #[error("no handshake stage to resume in state {0:?}")]
    NothingPending(ConnectState),
    #[error("MQTT connect rejected: {0:?}")]
    ConnectionRejected(ConnectReturnCode),
    #[error("keep alive timeout")]
    KeepAliveTimeout,
    #[error("subscription topic and QoS lists differ in length")]
    SubscriptionMismatch,
    #[error("message id {0} already has an acknowledgment outstanding")]
    MessageIdInUse(u16),
}

/// Configuration for one connect attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectOptions {
    /// Protocol level stamped into the CONNECT packet.
    pub protocol: Protocol,
    pub login: Option<Login>,
    /// Keep-alive interval; zero disables client pings.
    pub keep_alive: Duration,
    pub clean_session: bool,
    pub last_will: Option<LastWill>,
    /// Run the TLS handshake before CONNECT, presenting the parsed host
    /// for SNI.
    pub tls: bool,
}

impl ConnectOptions {
    /// Defaults: protocol 3.1.1, no login, 5 minute keep alive, session
    /// resumed, no will, no TLS.
    pub fn new() -> Self {
        Self {
            protocol: Protocol::V4,
            login: None,
            keep_alive: Duration::from_secs(5 * 60),
            clean_session: false,
            last_will: None,
            tls: false,
        }
    }

    fn as_connect(&self, client_id: &str) -> Connect {
        let mut connect = Connect::new(client_id);
        connect.protocol = self.protocol;
        connect.clean_session = self.clean_session;
        connect.keep_alive = self.keep_alive.as_secs().min(u16::MAX as u64) as u16;
        connect.login = self.login.clone();
        connect.last_will = self.last_will.clone();
        connect
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// The protocol engine. One instance per readiness loop; all clients live
/// in its registry.
pub struct Engine<T> {
    clients: ClientRegistry<T>,
}

impl<T: Transport> Engine<T> {
    pub fn new() -> Self {
        Self {
            clients: ClientRegistry::new(),
        }
    }

    /// Add a client to the registry, issuing the socket id used for every
    /// later operation on it.
    pub fn register(&mut self, client: Client<T>) -> Result<SocketId, Error> {
        self.clients
            .register(client)
            .map_err(|client| Error::DuplicateClientId(client.client_id().to_owned()))
    }

    /// Remove a client, freeing its socket id.
    pub fn unregister(&mut self, socket: SocketId) -> Option<Client<T>> {
        self.clients.remove(socket)
    }

    pub fn client(&self, socket: SocketId) -> Option<&Client<T>> {
        self.clients.get(socket)
    }

    pub fn client_mut(&mut self, socket: SocketId) -> Option<&mut Client<T>> {
        self.clients.get_mut(socket)
    }

    /// Look up a client's socket by client id.
    pub fn find_client_id(&self, client_id: &str) -> Option<SocketId> {
        self.clients.find_client_id(client_id)
    }

    pub(crate) fn lookup(&mut self, socket: SocketId) -> Result<&mut Client<T>, Error> {
        self.clients
            .get_mut(socket)
            .ok_or(Error::UnknownSocket(socket))
    }
}

impl<T: Transport> Default for Engine<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `packet` and hand it to the client's transport.
pub(crate) fn send_packet<T: Transport>(
    client: &mut Client<T>,
    packet: Packet,
) -> Result<(), Error> {
    let mut buf = BytesMut::new();
    crate::codec::encode(&packet, &mut buf)?;
    client.transport.send(&buf)?;
    Ok(())
}
