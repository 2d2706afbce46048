//! Actor System for Live Reload
//!
//! Message-passing concurrency for serve mode:
//!
//! ```text
//! FsActor --Reload--> WsActor --"reload"--> browsers
//! (watch)           (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `ws` - Connection registry and broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
