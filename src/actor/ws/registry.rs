//! Live set of browser connections.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tungstenite::protocol::Message;
use tungstenite::{Error, WebSocket};

use crate::reload::RELOAD_MESSAGE;

/// Opaque handle for a registered connection
pub type ClientId = u64;

#[derive(Default)]
struct Clients {
    next_id: ClientId,
    sockets: FxHashMap<ClientId, WebSocket<TcpStream>>,
}

impl Clients {
    /// Unregister and close with the lock already held.
    fn remove_locked(&mut self, id: ClientId) -> bool {
        match self.sockets.remove(&id) {
            Some(ws) => {
                close_quietly(ws);
                true
            }
            None => false,
        }
    }
}

/// Registered WebSocket clients, shared between the actor and the reader thread.
///
/// Every operation takes the same lock, so a broadcast sees one consistent
/// membership: a client removed before it starts never receives it, and a
/// client added after it completes never receives it either.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<Clients>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an established connection. Sockets are switched to
    /// non-blocking so neither polling nor broadcasting can stall.
    pub fn add(&self, ws: WebSocket<TcpStream>) -> ClientId {
        if let Err(e) = ws.get_ref().set_nonblocking(true) {
            crate::debug!("ws"; "set_nonblocking failed: {}", e);
        }

        let mut clients = self.inner.lock();
        let id = clients.next_id;
        clients.next_id += 1;
        clients.sockets.insert(id, ws);
        crate::debug!("ws"; "client {} connected (total: {})", id, clients.sockets.len());
        id
    }

    /// Unregister a connection. Removing an absent id is a no-op.
    ///
    /// Once this returns, no later broadcast reaches the connection.
    pub fn remove(&self, id: ClientId) -> bool {
        self.inner.lock().remove_locked(id)
    }

    /// Send `reload` to every registered client.
    ///
    /// A failed send drops that client only. Returns how many clients the
    /// message was handed to.
    pub fn broadcast_reload(&self) -> usize {
        let mut clients = self.inner.lock();
        let mut failed = Vec::new();
        let mut delivered = 0;

        for (&id, ws) in clients.sockets.iter_mut() {
            match ws.send(Message::Text(RELOAD_MESSAGE.into())) {
                Ok(()) => delivered += 1,
                // Frame is buffered; the next poll flushes it
                Err(Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => delivered += 1,
                Err(e) => {
                    crate::debug!("ws"; "send to client {} failed: {}", id, e);
                    failed.push(id);
                }
            }
        }

        for id in failed {
            clients.remove_locked(id);
        }
        delivered
    }

    /// Drain pending input of every client without blocking.
    ///
    /// Close frames and socket errors unregister the client; other inbound
    /// messages are ignored. Returns how many clients were dropped.
    pub fn poll_clients(&self) -> usize {
        let mut disconnected = Vec::new();
        let mut clients = self.inner.lock();

        for (&id, ws) in clients.sockets.iter_mut() {
            loop {
                match ws.read() {
                    Ok(Message::Close(_)) => {
                        disconnected.push(id);
                        break;
                    }
                    Ok(_) => continue,
                    Err(Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(_) => {
                        disconnected.push(id);
                        break;
                    }
                }
            }
        }

        let mut dropped = 0;
        for id in disconnected {
            if clients.remove_locked(id) {
                crate::debug!("ws"; "client {} disconnected", id);
                dropped += 1;
            }
        }
        dropped
    }

    /// Close and unregister every client.
    pub fn close_all(&self) {
        let mut clients = self.inner.lock();
        let ids: Vec<ClientId> = clients.sockets.keys().copied().collect();
        for id in ids {
            clients.remove_locked(id);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn close_quietly(mut ws: WebSocket<TcpStream>) {
    let _ = ws.close(None);
    let _ = ws.flush();
}
