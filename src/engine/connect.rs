//! Staged connection establishment.

use mqttbytes::v4::Packet;

use crate::client::{Client, ConnectState, Handshake};
use crate::endpoint::Endpoint;
use crate::registry::SocketId;
use crate::transport::{Progress, Transport};

use super::{send_packet, ConnectOptions, Engine, Error};

impl<T: Transport> Engine<T> {
    /// Start connecting a client to the broker at `address`.
    ///
    /// Performs exactly one bounded step: resolve the address, start a
    /// non-blocking TCP connect and, when that finishes synchronously, run
    /// the optional TLS handshake and send CONNECT. A stage that cannot
    /// finish immediately parks the client in `TcpPending` or `TlsPending`
    /// and [`Engine::resume`] picks it up from the next readiness event.
    /// CONNACK handling is a separate, later step.
    pub fn connect(
        &mut self,
        socket: SocketId,
        address: &str,
        options: &ConnectOptions,
    ) -> Result<Progress, Error> {
        let client = self.lookup(socket)?;
        if client.state() != ConnectState::Disconnected {
            return Err(Error::ConnectInFlight);
        }
        client.set_good(true);

        let endpoint = Endpoint::parse(address);
        log::debug!(
            "socket {} client {} connecting to {}",
            socket,
            client.client_id(),
            endpoint
        );

        let connect = options.as_connect(client.client_id());
        client.handshake = Some(Handshake {
            server_name: endpoint.host().to_owned(),
            tls: options.tls,
            connect,
            keep_alive: options.keep_alive,
        });

        match client.transport.start_connect(endpoint.host(), endpoint.port()) {
            Ok(Progress::Complete) => Self::after_tcp(socket, client),
            Ok(progress) => {
                client.advance(ConnectState::TcpPending)?;
                Ok(progress)
            }
            Err(e) => Err(Self::fail(client, e.into())),
        }
        // The endpoint, and any host buffer the parser copied, is
        // released here.
    }

    /// Resume a handshake parked by an earlier [`Engine::connect`] call.
    /// Invoked by the readiness loop when the client's socket becomes
    /// ready; performs one more bounded step.
    pub fn resume(&mut self, socket: SocketId) -> Result<Progress, Error> {
        let client = self.lookup(socket)?;
        match client.state() {
            ConnectState::TcpPending => match client.transport.resume_connect() {
                Ok(Progress::Complete) => Self::after_tcp(socket, client),
                Ok(progress) => Ok(progress),
                Err(e) => Err(Self::fail(client, e.into())),
            },
            ConnectState::TlsPending => match client.transport.resume_tls() {
                Ok(Progress::Complete) => Self::send_connect(socket, client),
                Ok(progress) => Ok(progress),
                Err(e) => Err(Self::fail(client, e.into())),
            },
            state => Err(Error::NothingPending(state)),
        }
    }

    /// Abandon the connection: close the transport and reset the client
    /// record. The registry entry and socket id stay valid for a later
    /// connect.
    pub fn disconnect(&mut self, socket: SocketId) -> Result<(), Error> {
        let client = self.lookup(socket)?;
        log::debug!(
            "socket {} client {} disconnecting",
            socket,
            client.client_id()
        );
        client.transport.close();
        client.reset();
        Ok(())
    }

    /// TCP is up; run the TLS stage when requested, then CONNECT.
    fn after_tcp(socket: SocketId, client: &mut Client<T>) -> Result<Progress, Error> {
        let handshake = match client.handshake.take() {
            Some(handshake) => handshake,
            None => return Err(Error::NothingPending(client.state())),
        };

        if !handshake.tls {
            client.handshake = Some(handshake);
            return Self::send_connect(socket, client);
        }

        let started = client.transport.start_tls(&handshake.server_name);
        client.handshake = Some(handshake);
        match started {
            Ok(Progress::Complete) => Self::send_connect(socket, client),
            Ok(progress) => {
                client.advance(ConnectState::TlsPending)?;
                Ok(progress)
            }
            Err(e) => Err(Self::fail(client, e.into())),
        }
    }

    /// The transport is fully up; encode and send CONNECT.
    fn send_connect(socket: SocketId, client: &mut Client<T>) -> Result<Progress, Error> {
        let connect = match client.handshake.as_ref() {
            Some(handshake) => handshake.connect.clone(),
            None => return Err(Error::NothingPending(client.state())),
        };
        log::debug!(
            "socket {} client {} sending CONNECT",
            socket,
            client.client_id()
        );
        match send_packet(client, Packet::Connect(connect)) {
            Ok(()) => {
                client.advance(ConnectState::MqttConnectSent)?;
                Ok(Progress::Complete)
            }
            Err(e) => Err(Self::fail(client, e)),
        }
    }

    /// A handshake stage failed: drop back to `Disconnected` and mark the
    /// client bad. The attempt is over; retrying is the caller's decision.
    fn fail(client: &mut Client<T>, error: Error) -> Error {
        log::debug!(
            "client {} handshake failed: {}",
            client.client_id(),
            error
        );
        client.set_good(false);
        client.reset();
        error
    }
}
