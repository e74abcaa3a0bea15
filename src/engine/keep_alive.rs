//! Outbound keepalive.
//!
//! The engine has no timers of its own; the readiness loop calls
//! [`Engine::keep_alive`] with its current time and the poll-style
//! [`KeepAliveTimer`] decides whether a PINGREQ is due or an outstanding
//! ping has missed its response deadline.

use std::time::{Duration, Instant};

use mqttbytes::v4::Packet;

use crate::client::ConnectState;
use crate::registry::SocketId;
use crate::transport::{Progress, Transport};

use super::{send_packet, Engine, Error};

/// What the timer wants done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAlive {
    PingRequest,
    PingResponseDeadline,
}

/// Poll-driven keep-alive schedule: a ping falls due every interval, and
/// an outstanding ping must be answered within half an interval. A zero
/// interval disables the schedule entirely.
#[derive(Debug)]
pub struct KeepAliveTimer {
    period: Option<Duration>,
    ping_at: Option<Instant>,
    deadline: Option<Instant>,
}

impl KeepAliveTimer {
    /// A timer that never fires (keep alive disabled, or the session not
    /// established yet).
    pub fn disabled() -> Self {
        Self {
            period: None,
            ping_at: None,
            deadline: None,
        }
    }

    /// Start the schedule: the first ping falls due one interval after
    /// `now`.
    pub fn new(period: Duration, now: Instant) -> Self {
        if period.is_zero() {
            return Self::disabled();
        }
        Self {
            period: Some(period),
            ping_at: Some(now + period),
            deadline: None,
        }
    }

    /// A ping went out at `now`: the response deadline is half an
    /// interval away, the next ping a full interval away.
    pub fn ping_sent(&mut self, now: Instant) {
        if let Some(period) = self.period {
            self.ping_at = Some(now + period);
            self.deadline = Some(now + period / 2);
        }
    }

    /// The response arrived; disarm the deadline.
    pub fn pong_received(&mut self) {
        self.deadline = None;
    }

    /// What is due at `now`, if anything. An armed deadline outranks the
    /// next ping.
    pub fn poll(&self, now: Instant) -> Option<KeepAlive> {
        self.period?;
        if let Some(deadline) = self.deadline {
            if now >= deadline {
                return Some(KeepAlive::PingResponseDeadline);
            }
            return None;
        }
        match self.ping_at {
            Some(ping_at) if now >= ping_at => Some(KeepAlive::PingRequest),
            _ => None,
        }
    }
}

impl<T: Transport> Engine<T> {
    /// Run the keep-alive schedule for one client. Called periodically by
    /// the readiness loop with its current time.
    ///
    /// Sends a PINGREQ when one falls due and reports
    /// [`Error::KeepAliveTimeout`] when the broker missed the response
    /// deadline; `Pending` means nothing was due.
    pub fn keep_alive(&mut self, socket: SocketId, now: Instant) -> Result<Progress, Error> {
        let client = self.lookup(socket)?;
        if client.state() != ConnectState::Established {
            return Ok(Progress::Pending);
        }
        match client.keep_alive.poll(now) {
            Some(KeepAlive::PingRequest) => {
                log::debug!("socket {} client {} PINGREQ", socket, client.client_id());
                send_packet(client, Packet::PingReq)?;
                client.set_ping_outstanding(true);
                client.keep_alive.ping_sent(now);
                Ok(Progress::Complete)
            }
            Some(KeepAlive::PingResponseDeadline) => {
                log::debug!(
                    "socket {} client {} ping response deadline reached",
                    socket,
                    client.client_id()
                );
                client.set_good(false);
                Err(Error::KeepAliveTimeout)
            }
            None => Ok(Progress::Pending),
        }
    }
}
