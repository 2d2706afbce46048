//! Actor Message Definitions
//!
//! ```text
//! FsActor --Reload--> WsActor <--AddClient-- acceptor thread
//! ```

use std::net::TcpStream;

use tungstenite::WebSocket;

/// Messages to WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Register a client whose handshake completed
    AddClient(WebSocket<TcpStream>),
    /// Broadcast reload to every registered client
    Reload { reason: String },
    /// Close all clients and stop
    Shutdown,
}
