//! Development server with live reload support.
//!
//! ```text
//! GET /___inject_script.js ──────────────────────────────> reload script
//! GET /<path> ──> path::resolve_path ──┬─ html ──> inject ──> response
//!                                      └─ other ──────────> response
//! ```

mod content;
mod lifecycle;
mod path;
mod response;


use content::{ReloadScript, browser_host};

use crate::{config::ServeConfig, debug, embed::serve::INJECT_SCRIPT_PATH, log};
use anyhow::Result;
use crossbeam::channel;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use tiny_http::{Method, Request, Server};

/// Number of threads handling HTTP requests.
const REQUEST_THREADS: usize = 4;

/// Read-only state shared by every request handler.
#[derive(Debug)]
pub struct ServeContext {
    /// Canonical served root
    pub root: PathBuf,
    /// Reload script rendered for this server's addresses
    pub script: ReloadScript,
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    ws_listener: TcpListener,
    ws_addr: SocketAddr,
    config: Arc<ServeConfig>,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server and the live reload listener without serving yet.
pub fn bind_server(config: Arc<ServeConfig>) -> Result<BoundServer> {
    let ip = lifecycle::resolve_host(&config.host)?;
    debug!("serve"; "host {} -> {}", config.host, ip);

    let (server, addr) = lifecycle::bind_with_retry(ip, config.port)?;
    let server = Arc::new(server);

    let (ws_listener, ws_addr) = crate::reload::server::bind_ws_listener(ip, config.ws_port)?;
    debug!("ws"; "ws://{}:{}", browser_host(ws_addr), ws_addr.port());

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}:{} ({})", browser_host(addr), addr.port(), config.root.display());

    Ok(BoundServer {
        server,
        addr,
        ws_listener,
        ws_addr,
        config,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Get the bound HTTP address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the bound WebSocket address.
    pub fn ws_addr(&self) -> SocketAddr {
        self.ws_addr
    }

    /// Start the actor system and the request loop (blocking).
    pub fn run(self) -> Result<()> {
        let context = Arc::new(ServeContext {
            root: self.config.root.clone(),
            script: ReloadScript::new(self.addr, self.ws_addr),
        });

        let actor_handle =
            lifecycle::spawn_actors(Arc::clone(&self.config), self.ws_listener, self.shutdown_rx)?;
        run_request_loop(&self.server, &context)?;
        lifecycle::wait_for_shutdown(actor_handle);
        Ok(())
    }
}

fn run_request_loop(server: &Server, context: &Arc<ServeContext>) -> Result<()> {
    // Requests are independent; a slow client must not block the others
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .build()?;

    for request in server.incoming_requests() {
        let context = Arc::clone(context);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &context) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, context: &ServeContext) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    let url = request.url().to_string();
    let route = url.split(['?', '#']).next().unwrap_or_default();

    // Served from memory; does not depend on the file system
    if route == INJECT_SCRIPT_PATH {
        return response::respond_reload_js(request, &context.script);
    }

    match path::resolve_path(&url, &context.root) {
        Ok(file) => {
            debug!("serve"; "{} {} -> {} bytes", request.method(), url, file.size);
            response::respond_file(request, &file, &context.script)
        }
        Err(e) => {
            debug!("serve"; "{} {} -> {}", request.method(), url, e.status());
            response::respond_error(request, e)
        }
    }
}
