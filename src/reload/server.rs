//! WebSocket Server for Live Reload
//!
//! Accepts browser connections on the live reload port, performs the
//! handshake and hands the established socket to `WsActor` via channel.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;

use crate::actor::messages::WsMsg;
use crate::embed::serve::WS_PATH;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Interval between accept polls
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Upper bound for a client to finish the opening handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bind the live reload listener, retrying with incremented port if in use.
///
/// Port 0 binds an ephemeral port; the returned address has the real one.
pub fn bind_ws_listener(host: IpAddr, base_port: u16) -> Result<(TcpListener, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(host, port)) {
            Ok(listener) => {
                if offset > 0 {
                    crate::log!("ws"; "port {} in use, using {} instead", base_port, port);
                }
                let addr = listener.local_addr()?;
                return Ok((listener, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        MAX_PORT_RETRIES,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Spawn the acceptor thread that sends handshaken clients to WsActor.
///
/// The thread exits once the actor's receiver is gone or shutdown starts.
pub fn spawn_acceptor(listener: TcpListener, ws_tx: mpsc::Sender<WsMsg>) -> Result<()> {
    listener.set_nonblocking(true)?;

    thread::Builder::new()
        .name("live-reload-accept".into())
        .spawn(move || accept_loop(listener, ws_tx))?;
    Ok(())
}

fn accept_loop(listener: TcpListener, ws_tx: mpsc::Sender<WsMsg>) {
    while !ws_tx.is_closed() && !crate::core::is_shutdown() {
        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("ws"; "connection from {}", addr);
                let tx = ws_tx.clone();
                // Handshake off the accept loop; a silent peer must not stall others
                let spawned = thread::Builder::new()
                    .name("live-reload-handshake".into())
                    .spawn(move || handshake(stream, tx));
                if let Err(e) = spawned {
                    crate::log!("ws"; "failed to spawn handshake thread: {}", e);
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                crate::log!("ws"; "accept error: {}", e);
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
    crate::debug!("ws"; "acceptor stopped");
}

fn handshake(stream: TcpStream, ws_tx: mpsc::Sender<WsMsg>) {
    // Accepted sockets may inherit non-blocking mode from the listener
    if stream.set_nonblocking(false).is_err()
        || stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)).is_err()
    {
        return;
    }

    let ws = match tungstenite::accept_hdr(stream, check_path) {
        Ok(ws) => ws,
        Err(e) => {
            crate::debug!("ws"; "handshake failed: {}", e);
            return;
        }
    };

    let _ = ws.get_ref().set_read_timeout(None);
    if ws_tx.blocking_send(WsMsg::AddClient(ws)).is_err() {
        crate::debug!("ws"; "actor gone, dropping client");
    }
}

/// Only the reload endpoint is upgraded; anything else gets 404.
fn check_path(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if request.uri().path() == WS_PATH {
        return Ok(response);
    }

    let mut error = ErrorResponse::new(Some("404 Not Found".to_string()));
    *error.status_mut() = StatusCode::NOT_FOUND;
    Err(error)
}
