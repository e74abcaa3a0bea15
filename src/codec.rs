//! Adapter over the [`mqttbytes`] packet codec.
//!
//! The engine stages encoded packets in a [`BytesMut`] before handing them
//! to the transport, and the readiness loop feeds received bytes through
//! [`decode`] until it stops producing packets.

use bytes::BytesMut;
use mqttbytes::v4::Packet;
use thiserror::Error;

pub const MAX_PACKET_SIZE: usize = 256 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("MQTT protocol error: {0}")]
    ProtocolError(mqttbytes::Error),
}

impl From<mqttbytes::Error> for CodecError {
    fn from(v: mqttbytes::Error) -> Self {
        Self::ProtocolError(v)
    }
}

/// Decode one packet from `src`, or `None` when only a partial packet is
/// buffered (room for the rest is reserved).
pub fn decode(src: &mut BytesMut) -> Result<Option<Packet>, CodecError> {
    match mqttbytes::check(src.iter(), MAX_PACKET_SIZE) {
        Ok(_header) => {
            let packet = mqttbytes::v4::read(src, MAX_PACKET_SIZE)?;
            Ok(Some(packet))
        }
        Err(mqttbytes::Error::InsufficientBytes(x)) => {
            if src.capacity() < x {
                src.reserve(x - src.capacity());
            }
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Append the wire form of `item` to `dst`.
pub fn encode(item: &Packet, dst: &mut BytesMut) -> Result<(), CodecError> {
    match item {
        Packet::Connect(p) => p.write(dst)?,
        Packet::ConnAck(p) => p.write(dst)?,
        Packet::Publish(p) => p.write(dst)?,
        Packet::PubAck(p) => p.write(dst)?,
        Packet::PubRec(p) => p.write(dst)?,
        Packet::PubRel(p) => p.write(dst)?,
        Packet::PubComp(p) => p.write(dst)?,
        Packet::Subscribe(p) => p.write(dst)?,
        Packet::SubAck(p) => p.write(dst)?,
        Packet::Unsubscribe(p) => p.write(dst)?,
        Packet::UnsubAck(p) => p.write(dst)?,
        Packet::PingReq => mqttbytes::v4::PingReq.write(dst)?,
        Packet::PingResp => mqttbytes::v4::PingResp.write(dst)?,
        Packet::Disconnect => mqttbytes::v4::Disconnect.write(dst)?,
    };

    Ok(())
}
