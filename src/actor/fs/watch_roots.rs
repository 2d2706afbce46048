use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

/// Watch-root consistency manager.
///
/// Responsibility:
/// - Attach the served root at startup
/// - Re-attach it if it was removed and recreated
pub(super) struct WatchRoots {
    root: PathBuf,
    attached: bool,
}

impl WatchRoots {
    pub(super) fn new(root: PathBuf) -> Self {
        Self {
            root,
            attached: false,
        }
    }

    pub(super) fn attach(&mut self, watcher: &mut RecommendedWatcher) -> notify::Result<()> {
        watcher.watch(&self.root, RecursiveMode::Recursive)?;
        self.attached = true;
        Ok(())
    }

    pub(super) fn is_attached(&self) -> bool {
        self.attached
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        // Drop the stale handle if the root vanished
        if self.attached && !self.root.exists() {
            let _ = watcher.unwatch(&self.root);
            self.attached = false;
            crate::log!("watch"; "root removed: {}", self.root.display());
        }

        if self.attached || !self.root.exists() {
            return;
        }

        if watcher.watch(&self.root, RecursiveMode::Recursive).is_ok() {
            self.attached = true;
            crate::log!("watch"; "re-attached watch: {}", self.root.display());
        }
    }
}
