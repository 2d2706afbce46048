//! `[serve]` section of `live-reload.toml`.
//!
//! Every field is optional; missing fields fall back to CLI arguments and
//! then to built-in defaults.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! host = "127.0.0.1"     # Host or interface (127.0.0.1 = localhost only)
//! port = 8000            # HTTP port number
//! ws_port = 35729        # Live reload WebSocket port
//! root = "public"        # Directory to serve, relative to this file
//! debounce_ms = 100      # Quiet period before browsers reload
//! ```
//!
//! Use `host = "0.0.0.0"` to make the server accessible from LAN.

use std::path::PathBuf;

use serde::Deserialize;

/// Root structure of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Development server settings
    #[serde(default)]
    pub serve: ServeSection,
}

/// Development server settings as written in the file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeSection {
    /// Host name or address to bind, resolved at startup.
    pub host: Option<String>,

    /// HTTP port number.
    pub port: Option<u16>,

    /// WebSocket port for live reload.
    pub ws_port: Option<u16>,

    /// Directory to serve, relative to the config file.
    pub root: Option<PathBuf>,

    /// Debounce window in milliseconds.
    pub debounce_ms: Option<u64>,
}
