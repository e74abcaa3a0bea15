//! Inbound acknowledgment dispatch.
//!
//! Each handler follows the same lookup → update → release pattern: find
//! the client for the socket the packet arrived on, apply the effect, and
//! let the packet drop before returning. Packets are taken by value so
//! they cannot outlive the dispatch call.

use std::time::Instant;

use mqttbytes::v4::{ConnAck, ConnectReturnCode, SubAck, UnsubAck};

use crate::client::ConnectState;
use crate::registry::SocketId;
use crate::transport::{Progress, Transport};

use super::keep_alive::KeepAliveTimer;
use super::{Engine, Error};

impl<T: Transport> Engine<T> {
    /// The broker answered a PINGREQ.
    pub fn handle_pingresp(&mut self, socket: SocketId) -> Result<Progress, Error> {
        let client = self.lookup(socket)?;
        log::debug!("socket {} client {} PINGRESP", socket, client.client_id());
        client.set_ping_outstanding(false);
        client.keep_alive.pong_received();
        Ok(Progress::Complete)
    }

    /// The broker acknowledged a SUBSCRIBE.
    pub fn handle_suback(&mut self, socket: SocketId, suback: SubAck) -> Result<Progress, Error> {
        let client = self.lookup(socket)?;
        log::debug!(
            "socket {} client {} SUBACK msgid {} granted {:?}",
            socket,
            client.client_id(),
            suback.pkid,
            suback.return_codes
        );
        if client.pending_acks.take(suback.pkid).is_none() {
            log::warn!(
                "socket {} client {} SUBACK for unknown msgid {}",
                socket,
                client.client_id(),
                suback.pkid
            );
        }
        Ok(Progress::Complete)
        // `suback`, granted-QoS list included, is dropped here.
    }

    /// The broker acknowledged an UNSUBSCRIBE.
    pub fn handle_unsuback(
        &mut self,
        socket: SocketId,
        unsuback: UnsubAck,
    ) -> Result<Progress, Error> {
        let client = self.lookup(socket)?;
        log::debug!(
            "socket {} client {} UNSUBACK msgid {}",
            socket,
            client.client_id(),
            unsuback.pkid
        );
        if client.pending_acks.take(unsuback.pkid).is_none() {
            log::warn!(
                "socket {} client {} UNSUBACK for unknown msgid {}",
                socket,
                client.client_id(),
                unsuback.pkid
            );
        }
        Ok(Progress::Complete)
    }

    /// The broker answered CONNECT. Completes the handshake started by
    /// [`Engine::connect`]: a success code establishes the session and
    /// arms the keep-alive timer, a refusal resets the client.
    pub fn handle_connack(
        &mut self,
        socket: SocketId,
        connack: ConnAck,
        now: Instant,
    ) -> Result<Progress, Error> {
        let client = self.lookup(socket)?;
        if client.state() != ConnectState::MqttConnectSent {
            log::warn!(
                "socket {} client {} unexpected CONNACK in state {:?}",
                socket,
                client.client_id(),
                client.state()
            );
            return Ok(Progress::Complete);
        }
        log::debug!(
            "socket {} client {} CONNACK {:?}",
            socket,
            client.client_id(),
            connack.code
        );
        if connack.code != ConnectReturnCode::Success {
            client.set_good(false);
            client.reset();
            return Err(Error::ConnectionRejected(connack.code));
        }

        let keep_alive = client
            .handshake
            .take()
            .map(|handshake| handshake.keep_alive)
            .unwrap_or_default();
        client.keep_alive = KeepAliveTimer::new(keep_alive, now);
        client.advance(ConnectState::Established)?;
        Ok(Progress::Complete)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use mqttbytes::v4::{ConnAck, ConnectReturnCode, SubAck, SubscribeReasonCode, UnsubAck};
    use mqttbytes::QoS;

    use crate::client::{Client, ConnectState};
    use crate::engine::mock::MockTransport;
    use crate::engine::{ConnectOptions, Engine, Error};
    use crate::registry::SocketId;
    use crate::transport::Progress;

    fn connected(state_now: Instant) -> (Engine<MockTransport>, SocketId) {
        let mut engine = Engine::new();
        let socket = engine
            .register(Client::new("test-client", MockTransport::new()))
            .unwrap();
        let progress = engine
            .connect(socket, "broker.local", &ConnectOptions::new())
            .unwrap();
        assert_eq!(progress, Progress::Complete);
        let progress = engine
            .handle_connack(
                socket,
                ConnAck {
                    session_present: false,
                    code: ConnectReturnCode::Success,
                },
                state_now,
            )
            .unwrap();
        assert_eq!(progress, Progress::Complete);
        (engine, socket)
    }

    #[test]
    fn pingresp_clears_the_outstanding_flag() {
        let (mut engine, socket) = connected(Instant::now());
        let client = engine.client_mut(socket).unwrap();
        client.set_ping_outstanding(true);

        let progress = engine.handle_pingresp(socket).unwrap();
        assert_eq!(progress, Progress::Complete);
        assert!(!engine.client(socket).unwrap().ping_outstanding());
    }

    #[test]
    fn dispatch_for_an_unregistered_socket_is_reported() {
        let mut engine: Engine<MockTransport> = Engine::new();
        let err = engine.handle_pingresp(SocketId(3)).unwrap_err();
        assert!(matches!(err, Error::UnknownSocket(_)));
    }

    #[test]
    fn dispatch_after_unregister_is_reported() {
        let (mut engine, socket) = connected(Instant::now());
        engine.unregister(socket).unwrap();

        let err = engine
            .handle_unsuback(socket, UnsubAck::new(1))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSocket(_)));
    }

    #[test]
    fn suback_retires_the_pending_entry() {
        let (mut engine, socket) = connected(Instant::now());
        let progress = engine
            .subscribe(socket, &["a/b"], &[QoS::AtLeastOnce], 7)
            .unwrap();
        assert_eq!(progress, Progress::Complete);

        let progress = engine
            .handle_suback(
                socket,
                SubAck::new(7, vec![SubscribeReasonCode::Success(QoS::AtLeastOnce)]),
            )
            .unwrap();
        assert_eq!(progress, Progress::Complete);
        assert!(engine.client(socket).unwrap().pending_acks.is_empty());
    }

    #[test]
    fn suback_for_an_unknown_msgid_is_tolerated() {
        let (mut engine, socket) = connected(Instant::now());
        let progress = engine
            .handle_suback(socket, SubAck::new(99, vec![SubscribeReasonCode::Failure]))
            .unwrap();
        assert_eq!(progress, Progress::Complete);
    }

    #[test]
    fn unsuback_retires_the_pending_entry() {
        let (mut engine, socket) = connected(Instant::now());
        let progress = engine.unsubscribe(socket, &["a/b"], 8).unwrap();
        assert_eq!(progress, Progress::Complete);

        let progress = engine.handle_unsuback(socket, UnsubAck::new(8)).unwrap();
        assert_eq!(progress, Progress::Complete);
        assert!(engine.client(socket).unwrap().pending_acks.is_empty());
    }

    #[test]
    fn connack_refusal_rejects_and_resets() {
        let mut engine = Engine::new();
        let socket = engine
            .register(Client::new("test-client", MockTransport::new()))
            .unwrap();
        let progress = engine
            .connect(socket, "broker.local", &ConnectOptions::new())
            .unwrap();
        assert_eq!(progress, Progress::Complete);

        let err = engine
            .handle_connack(
                socket,
                ConnAck {
                    session_present: false,
                    code: ConnectReturnCode::NotAuthorized,
                },
                Instant::now(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ConnectionRejected(ConnectReturnCode::NotAuthorized)
        ));

        let client = engine.client(socket).unwrap();
        assert_eq!(client.state(), ConnectState::Disconnected);
        assert!(!client.is_good());
    }

    #[test]
    fn connack_in_an_unexpected_state_is_ignored() {
        let mut engine = Engine::new();
        let socket = engine
            .register(Client::new("test-client", MockTransport::new()))
            .unwrap();

        let progress = engine
            .handle_connack(
                socket,
                ConnAck {
                    session_present: false,
                    code: ConnectReturnCode::Success,
                },
                Instant::now(),
            )
            .unwrap();
        assert_eq!(progress, Progress::Complete);
        assert_eq!(engine.client(socket).unwrap().state(), ConnectState::Disconnected);
    }

    #[test]
    fn connack_arms_the_keep_alive_timer() {
        let now = Instant::now();
        let mut engine = Engine::new();
        let socket = engine
            .register(Client::new("test-client", MockTransport::new()))
            .unwrap();
        let mut options = ConnectOptions::new();
        options.keep_alive = Duration::from_secs(30);
        let progress = engine.connect(socket, "broker.local", &options).unwrap();
        assert_eq!(progress, Progress::Complete);
        let progress = engine
            .handle_connack(
                socket,
                ConnAck {
                    session_present: false,
                    code: ConnectReturnCode::Success,
                },
                now,
            )
            .unwrap();
        assert_eq!(progress, Progress::Complete);

        // A ping falls due one interval later.
        let progress = engine
            .keep_alive(socket, now + Duration::from_secs(30))
            .unwrap();
        assert_eq!(progress, Progress::Complete);
        assert!(engine.client(socket).unwrap().ping_outstanding());
    }
}
