//! Scripted transport shared by the engine tests.

use std::collections::VecDeque;

use bytes::BytesMut;
use mqttbytes::v4::Packet;

use crate::codec;
use crate::transport::{Progress, Transport, TransportError};

/// Transport whose connect/TLS stages follow a script and whose sends are
/// captured for inspection. An exhausted script answers `Complete`.
#[derive(Default, Debug)]
pub struct MockTransport {
    /// Outcomes returned by `start_connect`/`resume_connect`, in order.
    pub connect_script: VecDeque<Result<Progress, TransportError>>,
    /// Outcomes returned by `start_tls`/`resume_tls`, in order.
    pub tls_script: VecDeque<Result<Progress, TransportError>>,
    /// Fail every `send` when set.
    pub fail_sends: bool,
    pub connected_to: Option<(String, u16)>,
    pub server_name: Option<String>,
    pub sent: BytesMut,
    pub closed: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(
        connect: Vec<Result<Progress, TransportError>>,
        tls: Vec<Result<Progress, TransportError>>,
    ) -> Self {
        Self {
            connect_script: connect.into(),
            tls_script: tls.into(),
            ..Self::default()
        }
    }

    fn next(
        script: &mut VecDeque<Result<Progress, TransportError>>,
    ) -> Result<Progress, TransportError> {
        script.pop_front().unwrap_or(Ok(Progress::Complete))
    }

    /// Decode everything written so far, draining the capture buffer.
    pub fn sent_packets(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();
        while let Some(packet) = codec::decode(&mut self.sent).unwrap() {
            packets.push(packet);
        }
        packets
    }
}

impl Transport for MockTransport {
    fn start_connect(&mut self, host: &str, port: u16) -> Result<Progress, TransportError> {
        self.connected_to = Some((host.to_owned(), port));
        Self::next(&mut self.connect_script)
    }

    fn resume_connect(&mut self) -> Result<Progress, TransportError> {
        Self::next(&mut self.connect_script)
    }

    fn start_tls(&mut self, server_name: &str) -> Result<Progress, TransportError> {
        self.server_name = Some(server_name.to_owned());
        Self::next(&mut self.tls_script)
    }

    fn resume_tls(&mut self) -> Result<Progress, TransportError> {
        Self::next(&mut self.tls_script)
    }

    fn send(&mut self, packet: &[u8]) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Closed);
        }
        self.sent.extend_from_slice(packet);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
