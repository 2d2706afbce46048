//! Reload script rendering and HTML injection.

use std::net::SocketAddr;
use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::embed::serve::{WS_PATH, hotreload_js, script_tag};

/// Injection anchors in priority order.
///
/// The first pattern that matches anywhere in the document wins, even if a
/// lower-priority anchor appears earlier. `<header>` is not `<head>`.
static ANCHORS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"(?i-u)<!doctype[^>]*>",
        r"(?i-u)<html(?:[\s/][^>]*)?>",
        r"(?i-u)<head(?:[\s/][^>]*)?>",
        r"(?i-u)<body(?:[\s/][^>]*)?>",
    ]
    .map(|pattern| Regex::new(pattern).unwrap())
});

/// Reload script and tag, rendered once per server instance.
#[derive(Debug, Clone)]
pub struct ReloadScript {
    tag: String,
    js: String,
}

impl ReloadScript {
    /// Render for the bound HTTP and WebSocket addresses.
    pub fn new(http_addr: SocketAddr, ws_addr: SocketAddr) -> Self {
        let origin = format!("http://{}:{}", browser_host(http_addr), http_addr.port());
        let ws_url = format!("ws://{}:{}{}", browser_host(ws_addr), ws_addr.port(), WS_PATH);

        Self {
            tag: script_tag(&origin),
            js: hotreload_js(&ws_url),
        }
    }

    /// `<script>` tag pointing at the reload script.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Reload script body.
    pub fn js(&self) -> &str {
        &self.js
    }
}

/// Host part of a URL the browser can actually connect to.
///
/// A wildcard bind address is not routable, so it is shown as `localhost`.
pub fn browser_host(addr: SocketAddr) -> String {
    match addr {
        SocketAddr::V4(v4) if v4.ip().is_unspecified() => "localhost".to_string(),
        SocketAddr::V6(v6) if v6.ip().is_unspecified() => "localhost".to_string(),
        SocketAddr::V4(v4) => v4.ip().to_string(),
        SocketAddr::V6(v6) => format!("[{}]", v6.ip()),
    }
}

/// Insert `script_tag` after the highest-priority anchor tag.
///
/// Falls back to prepending when the document has no anchor. Each call
/// inserts exactly one tag; content that already carries one gets a second.
pub fn inject_reload_script(html: &[u8], script_tag: &str) -> Vec<u8> {
    let at = ANCHORS
        .iter()
        .find_map(|anchor| anchor.find(html))
        .map_or(0, |m| m.end());

    let mut result = Vec::with_capacity(html.len() + script_tag.len());
    result.extend_from_slice(&html[..at]);
    result.extend_from_slice(script_tag.as_bytes());
    result.extend_from_slice(&html[at..]);
    result
}
