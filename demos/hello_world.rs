//! Walks the engine through a full exchange against an in-memory
//! transport: connect, CONNACK, subscribe, SUBACK, keepalive.

use std::time::{Duration, Instant};

use bytes::BytesMut;
use mqttbytes::v4::{ConnAck, ConnectReturnCode, SubAck, SubscribeReasonCode};

use stepmqtt::client::Client;
use stepmqtt::engine::{ConnectOptions, Engine, QoS};
use stepmqtt::transport::{Progress, Transport, TransportError};

/// Loopback transport: connects instantly and remembers what was sent.
#[derive(Default)]
struct Loopback {
    sent: BytesMut,
}

impl Transport for Loopback {
    fn start_connect(&mut self, host: &str, port: u16) -> Result<Progress, TransportError> {
        println!("-> tcp connect {host}:{port}");
        Ok(Progress::Complete)
    }

    fn resume_connect(&mut self) -> Result<Progress, TransportError> {
        Ok(Progress::Complete)
    }

    fn start_tls(&mut self, _server_name: &str) -> Result<Progress, TransportError> {
        Err(TransportError::TlsUnavailable)
    }

    fn resume_tls(&mut self) -> Result<Progress, TransportError> {
        Err(TransportError::TlsUnavailable)
    }

    fn send(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        self.sent.extend_from_slice(packet);
        Ok(())
    }

    fn close(&mut self) {}
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simple_logger::SimpleLogger::new().init()?;

    let mut engine = Engine::new();
    let socket = engine.register(Client::new("stepmqtt-demo", Loopback::default()))?;

    let mut options = ConnectOptions::new();
    options.keep_alive = Duration::from_secs(5);
    let progress = engine.connect(socket, "test.mosquitto.org:1883", &options)?;
    println!("connect step: {progress:?}");

    // The broker's half of the conversation, scripted.
    let progress = engine.handle_connack(
        socket,
        ConnAck {
            session_present: false,
            code: ConnectReturnCode::Success,
        },
        Instant::now(),
    )?;
    println!("connack: {progress:?}");

    let progress = engine.subscribe(socket, &["hello/world"], &[QoS::AtLeastOnce], 1)?;
    println!("subscribe step: {progress:?}");
    let progress = engine.handle_suback(
        socket,
        SubAck::new(1, vec![SubscribeReasonCode::Success(QoS::AtLeastOnce)]),
    )?;
    println!("suback: {progress:?}");

    // A keep-alive interval later a PINGREQ goes out.
    let progress = engine.keep_alive(socket, Instant::now() + Duration::from_secs(5))?;
    println!("keep alive step: {progress:?}");
    let progress = engine.handle_pingresp(socket)?;
    println!("pingresp: {progress:?}");

    let client = engine.client(socket).ok_or("client vanished")?;
    println!(
        "client {} is {:?} with {} bytes on the wire",
        client.client_id(),
        client.state(),
        client.transport().sent.len()
    );

    Ok(())
}
