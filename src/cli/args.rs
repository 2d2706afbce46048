//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Serve a directory over HTTP and reload the browser on every change
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory to serve (default: current directory)
    #[arg(value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Host or interface to bind (e.g., localhost, 127.0.0.1, 0.0.0.0)
    #[arg(long, value_hint = clap::ValueHint::Hostname)]
    pub host: Option<String>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Port for the live reload WebSocket
    #[arg(long = "ws-port")]
    pub ws_port: Option<u16>,

    /// Quiet period after the last file change before browsers reload
    #[arg(long = "debounce-ms", value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Config file path (default: live-reload.toml, if present)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}
