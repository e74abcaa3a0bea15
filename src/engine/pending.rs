//! Outstanding subscribe/unsubscribe requests, keyed by message id.
//!
//! SUBSCRIBE and UNSUBSCRIBE go out exactly once; the table records what
//! is in flight so the matching SUBACK/UNSUBACK can retire it. It is also
//! the attachment point for resend logic, should at-least-once control
//! packets be added.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// What a recorded message id is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAck {
    /// SUBACK for the listed topic filters.
    Subscribe(Vec<String>),
    /// UNSUBACK for the listed topics.
    Unsubscribe(Vec<String>),
}

#[derive(Debug, Default)]
pub struct AckTable {
    waiting: HashMap<u16, PendingAck>,
}

impl AckTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an in-flight request. When `msg_id` is already waiting for
    /// an acknowledgment the new entry is handed back.
    pub fn record(&mut self, msg_id: u16, ack: PendingAck) -> Result<(), PendingAck> {
        match self.waiting.entry(msg_id) {
            Entry::Occupied(_) => Err(ack),
            Entry::Vacant(slot) => {
                slot.insert(ack);
                Ok(())
            }
        }
    }

    /// Retire the entry for `msg_id`, if one is waiting.
    pub fn take(&mut self, msg_id: u16) -> Option<PendingAck> {
        self.waiting.remove(&msg_id)
    }

    pub fn clear(&mut self) {
        self.waiting.clear();
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}
