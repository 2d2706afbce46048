//! Server lifecycle management.

use crate::{actor::Coordinator, config::ServeConfig, core::register_server, log};
use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, Sender};
use std::{
    net::{IpAddr, SocketAddr, TcpListener, ToSocketAddrs},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;

/// Maximum number of port binding attempts.
pub const MAX_PORT_RETRIES: u16 = 10;

/// Resolve a configured host (`localhost`, `0.0.0.0`, `::1`, ...) to the
/// address both listeners bind.
///
/// The first address the resolver returns wins, so both listeners share it.
pub fn resolve_host(host: &str) -> Result<IpAddr> {
    if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
        return Ok(ip);
    }

    (host, 0)
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve host `{host}`"))?
        .map(|addr| addr.ip())
        .next()
        .ok_or_else(|| anyhow::anyhow!("Host `{host}` resolved to no addresses"))
}

/// Bind to the specified interface and port, with automatic port retry.
///
/// Port 0 binds an ephemeral port; the returned address has the real one.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let bound = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, bound));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Register server for graceful shutdown.
pub fn register_server_for_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) {
    register_server(server, shutdown_tx);
}

/// Spawn the actor system for file watching and live reload.
pub fn spawn_actors(
    config: Arc<ServeConfig>,
    ws_listener: TcpListener,
    shutdown_rx: Receiver<()>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("live-reload-actors".into())
        .spawn(move || run_actor_system(config, ws_listener, shutdown_rx))
        .context("Failed to spawn actor thread")
}

fn run_actor_system(config: Arc<ServeConfig>, ws_listener: TcpListener, shutdown_rx: Receiver<()>) {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log!("error"; "failed to create tokio runtime, live reload disabled: {}", e);
            return;
        }
    };

    rt.block_on(async {
        let coordinator = Coordinator::new(config)
            .with_ws_listener(ws_listener)
            .with_shutdown_signal(shutdown_rx);
        if let Err(e) = coordinator.run().await {
            log!("error"; "live reload stopped: {:#}", e);
        }
    });
}

/// Wait for actor system to shutdown gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
