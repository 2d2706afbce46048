use std::path::Path;
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};

use super::types::{ChangeKind, ChangeSet};

/// Sleep used while idle; the select loop wakes on the next event anyway.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

/// Pure debouncer: only handles timing and event deduplication.
/// No business logic, no global state access.
pub(super) struct Debouncer {
    /// Quiet period that must pass after the last event
    pub(super) window: Duration,
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    pub(super) changes: ChangeSet,
    /// `None` while idle, `Some` while debouncing
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            changes: ChangeSet::default(),
            last_event: None,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Modify + Remove → Remove (file was deleted)
    /// - Create + Remove → Remove (a page may have fetched it meanwhile)
    /// - Same type events: first event wins
    ///
    /// Returns `true` if the event restarted the quiet window.
    pub(super) fn add_event(&mut self, event: &notify::Event) -> bool {
        let kinds: &[ChangeKind] = match event.kind {
            EventKind::Create(_) => &[ChangeKind::Created],
            EventKind::Remove(_) => &[ChangeKind::Removed],
            // Ignore metadata-only changes (mtime/atime/chmod noise)
            EventKind::Modify(ModifyKind::Metadata(_)) => return false,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => &[ChangeKind::Removed],
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => &[ChangeKind::Created],
            // Paired rename: [from, to]
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                &[ChangeKind::Removed, ChangeKind::Created]
            }
            EventKind::Modify(_) => &[ChangeKind::Modified],
            _ => return false,
        };

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        let mut accepted = false;
        for (i, path) in event.paths.iter().enumerate() {
            if is_temp_file(path) {
                continue;
            }
            let kind = kinds[i.min(kinds.len() - 1)];
            self.record(path, kind);
            accepted = true;
        }

        if accepted {
            self.last_event = Some(Instant::now());
        }
        accepted
    }

    fn record(&mut self, path: &Path, kind: ChangeKind) {
        let Some(&existing) = self.changes.get(path) else {
            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path.to_path_buf(), kind);
            return;
        };

        match (existing, kind) {
            (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                crate::debug!("watch"; "restore {}->{}: {}", existing.label(), kind.label(), path.display());
                self.changes.insert(path.to_path_buf(), kind);
            }
            (ChangeKind::Modified, ChangeKind::Removed) => {
                crate::debug!("watch"; "upgrade modified->removed: {}", path.display());
                self.changes.insert(path.to_path_buf(), ChangeKind::Removed);
            }
            (ChangeKind::Created, ChangeKind::Removed) => {
                crate::debug!("watch"; "transient created+removed: {}", path.display());
                self.changes.insert(path.to_path_buf(), ChangeKind::Removed);
            }
            // Created+Modified and repeats: first wins
            _ => {}
        }
    }

    /// Take collected changes once the quiet window has elapsed.
    ///
    /// Every burst that accepted at least one event yields exactly once;
    /// dedup only shapes the change set, never whether a reload is due.
    pub(super) fn take_if_ready(&mut self) -> Option<ChangeSet> {
        let last_event = self.last_event?;
        if last_event.elapsed() < self.window {
            return None;
        }

        self.last_event = None;
        Some(std::mem::take(&mut self.changes))
    }

    pub(super) fn is_idle(&self) -> bool {
        self.last_event.is_none()
    }

    /// Precise sleep duration until the window can elapse.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE_SLEEP;
        };

        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Version control metadata directories; churn inside them is not content.
const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Check if path is an editor artifact or lives in a VCS directory.
///
/// Other dotfiles (`.htaccess`, `.well-known/...`) are served content and
/// must still trigger a reload.
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        // emacs lock and auto-save files
        || name.starts_with(".#")
        || (name.len() > 1 && name.starts_with('#') && name.ends_with('#'))
        || name == ".DS_Store"
        || in_vcs_dir(path)
}

fn in_vcs_dir(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str().to_str().is_some_and(|c| VCS_DIRS.contains(&c)))
}
