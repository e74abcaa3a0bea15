//! The process-wide client registry.

use std::collections::HashMap;
use std::fmt;

use slab::Slab;

use crate::client::Client;

/// Token identifying a registered client's socket. Issued at registration
/// and used by the readiness loop to route events back to the owning
/// client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub(crate) usize);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Socket-keyed storage for all live clients, with a secondary index by
/// client id. A socket id maps to at most one live client at any instant.
///
/// No locking: the registry expects a single-writer readiness loop, per
/// the crate's concurrency model.
pub struct ClientRegistry<T> {
    clients: Slab<Client<T>>,
    by_client_id: HashMap<String, usize>,
}

impl<T> ClientRegistry<T> {
    pub fn new() -> Self {
        Self {
            clients: Slab::new(),
            by_client_id: HashMap::new(),
        }
    }

    /// Insert a client and issue its socket id. The client id must be
    /// unique among live clients; on conflict the client is handed back.
    pub fn register(&mut self, client: Client<T>) -> Result<SocketId, Client<T>> {
        if self.by_client_id.contains_key(client.client_id()) {
            return Err(client);
        }
        let client_id = client.client_id().to_owned();
        let key = self.clients.insert(client);
        self.by_client_id.insert(client_id, key);
        Ok(SocketId(key))
    }

    pub fn get(&self, socket: SocketId) -> Option<&Client<T>> {
        self.clients.get(socket.0)
    }

    pub fn get_mut(&mut self, socket: SocketId) -> Option<&mut Client<T>> {
        self.clients.get_mut(socket.0)
    }

    /// Look up a live client's socket by its client id.
    pub fn find_client_id(&self, client_id: &str) -> Option<SocketId> {
        self.by_client_id.get(client_id).copied().map(SocketId)
    }

    /// Remove a client, freeing its socket id for reuse.
    pub fn remove(&mut self, socket: SocketId) -> Option<Client<T>> {
        let client = self.clients.try_remove(socket.0)?;
        self.by_client_id.remove(client.client_id());
        Some(client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl<T> Default for ClientRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
