//! FileSystem Actor
//!
//! Watches the served root and sends one reload per burst of changes to
//! the WsActor.
//!
//! ```text
//! notify thread → Debouncer (timing + dedup) → WsMsg::Reload
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::WsMsg;

// Pure timing and deduplication.
mod debouncer;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
use types::ChangeSet;
use watch_roots::WatchRoots;

/// How often a detached root is checked for re-creation
const REATTACH_INTERVAL: Duration = Duration::from_secs(1);

/// Number of paths named in a reload reason before summarizing
const REASON_PATHS: usize = 3;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Re-attaches the root if it is deleted and recreated
    watch_roots: WatchRoots,
    /// Canonical served root, for readable reasons
    root: PathBuf,
    /// Channel to send messages to WsActor
    ws_tx: mpsc::Sender<WsMsg>,
    /// Debouncer state
    debouncer: Debouncer,
}

impl FsActor {
    /// Create a new FsActor; the watcher starts immediately.
    pub fn new(root: PathBuf, window: Duration, ws_tx: mpsc::Sender<WsMsg>) -> notify::Result<Self> {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut watch_roots = WatchRoots::new(root.clone());
        watch_roots.attach(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            root,
            ws_tx,
            debouncer: Debouncer::new(window),
        })
    }

    /// Run the actor event loop until the WsActor is gone.
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            root,
            ws_tx,
            debouncer,
        } = self;

        let (async_tx, async_rx) = mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::logger::status_error("watch error", &e.to_string()),
                }
            }
        });

        debounce_loop(async_rx, debouncer, &root, &ws_tx, || {
            watch_roots.maintain(&mut watcher);
            (!watch_roots.is_attached()).then_some(REATTACH_INTERVAL)
        })
        .await;

        crate::debug!("watch"; "stopped");
    }
}

/// Feed events into the debouncer and emit one reload per quiet window.
///
/// `on_tick` runs whenever the timer fires and may cap the next sleep.
/// Returns when the WsActor is gone or the event source closes.
async fn debounce_loop(
    mut events: mpsc::Receiver<notify::Event>,
    mut debouncer: Debouncer,
    root: &Path,
    ws_tx: &mpsc::Sender<WsMsg>,
    mut on_tick: impl FnMut() -> Option<Duration>,
) {
    let mut cap: Option<Duration> = None;

    loop {
        let sleep = match cap {
            Some(cap) => debouncer.sleep_duration().min(cap),
            None => debouncer.sleep_duration(),
        };

        tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(event) => {
                    debouncer.add_event(&event);
                }
                None => {
                    // Source closed: flush what is pending, then stop
                    if !debouncer.is_idle() {
                        tokio::time::sleep(debouncer.sleep_duration()).await;
                        if let Some(changes) = debouncer.take_if_ready() {
                            let _ = send_reload(ws_tx, root, changes).await;
                        }
                    }
                    break;
                }
            },
            _ = tokio::time::sleep(sleep) => {
                cap = on_tick();
                if let Some(changes) = debouncer.take_if_ready()
                    && send_reload(ws_tx, root, changes).await.is_err()
                {
                    break;
                }
            }
        }
    }
}

/// Returns `Err(())` if WsActor shut down
async fn send_reload(ws_tx: &mpsc::Sender<WsMsg>, root: &Path, changes: ChangeSet) -> Result<(), ()> {
    let reason = describe_changes(root, &changes);
    crate::debug!("watch"; "{}", reason);
    ws_tx.send(WsMsg::Reload { reason }).await.map_err(|_| ())
}

/// Short, stable description of a change set, relative to the root.
fn describe_changes(root: &Path, changes: &ChangeSet) -> String {
    let mut paths: Vec<String> = changes
        .keys()
        .map(|path| {
            path.strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    paths.sort_unstable();

    let extra = paths.len().saturating_sub(REASON_PATHS);
    paths.truncate(REASON_PATHS);
    let listed = paths.join(", ");

    if extra > 0 {
        format!("{listed} (+{extra} more)")
    } else {
        listed
    }
}
