//! WebSocket Actor - Reload Broadcast
//!
//! This actor is responsible for:
//! - Owning the connection registry
//! - Broadcasting reloads to every connected client
//! - Dropping clients that went away (via a background reader thread)
//!
//! ```text
//! FsActor --[Reload]--> WsActor --"reload"--> Clients
//! acceptor --[AddClient]--^
//! ```

mod registry;

use registry::ConnectionRegistry;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;

use super::messages::WsMsg;
use crate::utils::plural::plural_count;

/// How often client sockets are polled for disconnects
const READ_POLL: Duration = Duration::from_millis(100);

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients (shared with the reader thread)
    registry: ConnectionRegistry,
}

/// Stops the reader thread when dropped.
struct ReaderGuard(Arc<AtomicBool>);

impl Drop for ReaderGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl WsActor {
    /// Create a new WsActor
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            registry: ConnectionRegistry::new(),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let _reader = Self::spawn_reader(self.registry.clone());

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::AddClient(ws) => {
                    self.registry.add(ws);
                }

                WsMsg::Reload { reason } => {
                    if self.registry.is_empty() {
                        crate::debug!("ws"; "no clients connected");
                    }
                    let count = self.registry.broadcast_reload();
                    crate::logger::status_success(&format!(
                        "reload ({}): {}",
                        plural_count(count, "client"),
                        reason
                    ));
                }

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down ({} clients)", self.registry.len());
                    break;
                }
            }
        }

        self.registry.close_all();
    }

    /// Background thread to drop disconnected clients (non-blocking poll)
    fn spawn_reader(registry: ConnectionRegistry) -> ReaderGuard {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let spawned = thread::Builder::new()
            .name("live-reload-reader".into())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    thread::sleep(READ_POLL);
                    registry.poll_clients();
                }
            });
        if let Err(e) = spawned {
            crate::log!("ws"; "failed to spawn reader thread: {}", e);
        }

        ReaderGuard(stop)
    }
}
