//! Reload Module
//!
//! WebSocket endpoint that browsers connect to for live reload.
//!
//! ```text
//! FsActor --Reload--> WsActor --"reload"--> Browser
//!                        ^
//! server (accept) ---AddClient
//! ```

pub mod server;

/// Text frame sent to every connected client after a debounced change.
pub const RELOAD_MESSAGE: &str = "reload";
