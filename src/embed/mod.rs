//! Embedded static resources.
//!
//! - `serve` - Dev server resources (reload script and its `<script>` tag)
//!
//! Placeholders in the embedded sources are plain `__NAME__` markers and are
//! filled once per server, when its listen addresses are known.

pub mod serve {
    /// Path of the reload script on the HTTP server.
    pub const INJECT_SCRIPT_PATH: &str = "/___inject_script.js";

    /// Path of the live reload endpoint on the WebSocket listener.
    pub const WS_PATH: &str = "/___ws";

    /// Browser side of live reload: connects back and reloads on `reload`.
    const HOTRELOAD_JS: &str = include_str!("serve/hotreload.js");

    /// Reload script pointed at `ws_url`, e.g. `ws://127.0.0.1:35729/___ws`.
    pub fn hotreload_js(ws_url: &str) -> String {
        HOTRELOAD_JS.replace("__LIVE_RELOAD_WS_URL__", ws_url)
    }

    /// Tag inserted into every served HTML document. `origin` is the HTTP
    /// origin of this server, e.g. `http://127.0.0.1:8000`.
    pub fn script_tag(origin: &str) -> String {
        format!(r#"<script type="text/javascript" src="{origin}{INJECT_SCRIPT_PATH}"></script>"#)
    }
}
