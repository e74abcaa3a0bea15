//! Outbound SUBSCRIBE and UNSUBSCRIBE.

use mqttbytes::v4::{Packet, Subscribe, SubscribeFilter, Unsubscribe};
use mqttbytes::QoS;

use crate::registry::SocketId;
use crate::transport::{Progress, Transport};

use super::pending::PendingAck;
use super::{send_packet, Engine, Error};

impl<T: Transport> Engine<T> {
    /// Send a SUBSCRIBE for `topics` with matching per-topic QoS.
    ///
    /// `topics` and `qos` must be the same length. The call returns as
    /// soon as the transport accepts (or refuses) the packet; the broker's
    /// SUBACK is dispatched later through [`Engine::handle_suback`].
    /// Nothing is resent on a missing acknowledgment; the recorded
    /// pending entry is where that would attach.
    pub fn subscribe(
        &mut self,
        socket: SocketId,
        topics: &[&str],
        qos: &[QoS],
        msg_id: u16,
    ) -> Result<Progress, Error> {
        if topics.len() != qos.len() {
            return Err(Error::SubscriptionMismatch);
        }
        let client = self.lookup(socket)?;

        let owned: Vec<String> = topics.iter().map(|topic| topic.to_string()).collect();
        client
            .pending_acks
            .record(msg_id, PendingAck::Subscribe(owned))
            .map_err(|_| Error::MessageIdInUse(msg_id))?;

        log::debug!(
            "socket {} client {} SUBSCRIBE msgid {} ({} topics)",
            socket,
            client.client_id(),
            msg_id,
            topics.len()
        );

        let filters = topics
            .iter()
            .zip(qos)
            .map(|(topic, qos)| SubscribeFilter::new(topic.to_string(), *qos))
            .collect();
        let subscribe = Subscribe {
            pkid: msg_id,
            filters,
        };
        match send_packet(client, Packet::Subscribe(subscribe)) {
            Ok(()) => Ok(Progress::Complete),
            Err(e) => {
                // The request never went out.
                client.pending_acks.take(msg_id);
                Err(e)
            }
        }
    }

    /// Send an UNSUBSCRIBE for `topics`. Same non-blocking contract as
    /// [`Engine::subscribe`].
    pub fn unsubscribe(
        &mut self,
        socket: SocketId,
        topics: &[&str],
        msg_id: u16,
    ) -> Result<Progress, Error> {
        let client = self.lookup(socket)?;

        let owned: Vec<String> = topics.iter().map(|topic| topic.to_string()).collect();
        client
            .pending_acks
            .record(msg_id, PendingAck::Unsubscribe(owned.clone()))
            .map_err(|_| Error::MessageIdInUse(msg_id))?;

        log::debug!(
            "socket {} client {} UNSUBSCRIBE msgid {} ({} topics)",
            socket,
            client.client_id(),
            msg_id,
            topics.len()
        );

        let unsubscribe = Unsubscribe {
            pkid: msg_id,
            topics: owned,
        };
        match send_packet(client, Packet::Unsubscribe(unsubscribe)) {
            Ok(()) => Ok(Progress::Complete),
            Err(e) => {
                client.pending_acks.take(msg_id);
                Err(e)
            }
        }
    }
}
