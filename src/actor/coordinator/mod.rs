//! Actor Coordinator - Wires up the Live Reload Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Starts the WebSocket acceptor and the file watcher
//! - Runs the actors until shutdown

mod runtime;

use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::WsMsg;
use super::ws::WsActor;
use crate::config::ServeConfig;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<ServeConfig>,
    ws_listener: Option<TcpListener>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    /// Create from Arc<ServeConfig>.
    pub fn new(config: Arc<ServeConfig>) -> Self {
        Self {
            config,
            ws_listener: None,
            shutdown_rx: None,
        }
    }

    /// Set the bound WebSocket listener.
    pub fn with_ws_listener(mut self, listener: TcpListener) -> Self {
        self.ws_listener = Some(listener);
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        if let Some(listener) = self.ws_listener.take()
            && let Err(e) = crate::reload::server::spawn_acceptor(listener, ws_tx.clone())
        {
            crate::log!("ws"; "websocket server failed: {}", e);
        }

        // Static serving keeps working without a watcher
        let fs_actor = match FsActor::new(self.config.root.clone(), self.config.debounce, ws_tx.clone()) {
            Ok(actor) => {
                crate::log!("watch"; "watching {}", self.config.root.display());
                Some(actor)
            }
            Err(e) => {
                crate::log!("error"; "watch failed, serving without live reload: {}", e);
                None
            }
        };

        let ws_actor = WsActor::new(ws_rx);

        crate::debug!("actor"; "start");
        let shutdown_rx = self.shutdown_rx.take();
        runtime::run_actors(fs_actor, ws_actor, ws_tx, shutdown_rx).await?;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
