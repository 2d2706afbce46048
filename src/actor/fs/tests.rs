use std::path::PathBuf;
use std::time::Duration;

use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::EventKind;
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::debouncer::{Debouncer, is_temp_file};
use super::types::{ChangeKind, ChangeSet};
use super::{FsActor, debounce_loop, describe_changes};
use crate::actor::messages::WsMsg;

const WINDOW: Duration = Duration::from_millis(50);

fn make_event(paths: Vec<&str>, kind: EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> EventKind {
    EventKind::Modify(ModifyKind::Data(DataChange::Any))
}

fn create_kind() -> EventKind {
    EventKind::Create(CreateKind::File)
}

fn remove_kind() -> EventKind {
    EventKind::Remove(RemoveKind::File)
}

fn kind_of(debouncer: &Debouncer, path: &str) -> ChangeKind {
    debouncer.changes[&PathBuf::from(path)]
}

/// Drive `debounce_loop` with synthetic events.
fn spawn_loop() -> (mpsc::Sender<notify::Event>, mpsc::Receiver<WsMsg>) {
    let (event_tx, event_rx) = mpsc::channel(64);
    let (ws_tx, ws_rx) = mpsc::channel(16);
    tokio::spawn(async move {
        debounce_loop(event_rx, Debouncer::new(WINDOW), &PathBuf::from("/site"), &ws_tx, || None).await;
    });
    (event_tx, ws_rx)
}

fn drain_reloads(rx: &mut mpsc::Receiver<WsMsg>) -> Vec<String> {
    let mut reasons = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let WsMsg::Reload { reason } = msg {
            reasons.push(reason);
        }
    }
    reasons
}

#[test]
fn test_debouncer_starts_idle() {
    let mut debouncer = Debouncer::new(WINDOW);
    assert!(debouncer.is_idle());
    assert!(debouncer.take_if_ready().is_none());
    assert!(debouncer.sleep_duration() >= Duration::from_secs(3600));
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = Debouncer::new(WINDOW);

    assert!(debouncer.add_event(&make_event(vec!["/site/a.html"], create_kind())));
    assert!(debouncer.add_event(&make_event(vec!["/site/b.css"], modify_kind())));
    assert!(debouncer.add_event(&make_event(vec!["/site/c.js"], remove_kind())));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(kind_of(&debouncer, "/site/a.html"), ChangeKind::Created);
    assert_eq!(kind_of(&debouncer, "/site/b.css"), ChangeKind::Modified);
    assert_eq!(kind_of(&debouncer, "/site/c.js"), ChangeKind::Removed);
    assert!(!debouncer.is_idle());
}

#[test]
fn test_rename_maps_to_remove_and_create() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(
        vec!["/site/old.html", "/site/new.html"],
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
    ));
    assert_eq!(kind_of(&debouncer, "/site/old.html"), ChangeKind::Removed);
    assert_eq!(kind_of(&debouncer, "/site/new.html"), ChangeKind::Created);

    debouncer.add_event(&make_event(
        vec!["/site/moved.css"],
        EventKind::Modify(ModifyKind::Name(RenameMode::To)),
    ));
    assert_eq!(kind_of(&debouncer, "/site/moved.css"), ChangeKind::Created);
}

#[test]
fn test_metadata_and_access_ignored() {
    let mut debouncer = Debouncer::new(WINDOW);

    let metadata = EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime));
    let access = EventKind::Access(AccessKind::Any);
    assert!(!debouncer.add_event(&make_event(vec!["/site/a.html"], metadata)));
    assert!(!debouncer.add_event(&make_event(vec!["/site/a.html"], access)));

    assert!(debouncer.changes.is_empty());
    assert!(debouncer.is_idle());
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(vec!["/site/real.html"], modify_kind()));
    let first_time = debouncer.last_event.unwrap();

    std::thread::sleep(Duration::from_millis(5));

    // Temp file events must not restart the window or add to changes
    assert!(!debouncer.add_event(&make_event(vec!["/site/.index.html.swp"], modify_kind())));
    assert!(!debouncer.add_event(&make_event(vec!["/site/index.html~"], modify_kind())));
    assert_eq!(debouncer.last_event.unwrap(), first_time);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_is_temp_file() {
    for path in [
        "a.swp",
        "a.swo",
        "a.tmp",
        "a.bak",
        "a.backup",
        "a~",
        ".index.html.swp",
        ".#index.html",
        "#index.html#",
        "/site/.git/index.lock",
        "/site/.hg/dirstate",
    ] {
        assert!(is_temp_file(&PathBuf::from(path)), "{path}");
    }
    for path in [
        "style.css",
        "index.html",
        "photo.png",
        ".htaccess",
        "/site/.well-known/security.txt",
        "/site/.gitignore",
    ] {
        assert!(!is_temp_file(&PathBuf::from(path)), "{path}");
    }
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(vec!["/site/a.html"], create_kind()));
    debouncer.add_event(&make_event(vec!["/site/a.html"], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(kind_of(&debouncer, "/site/a.html"), ChangeKind::Created);
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(vec!["/site/a.html"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/site/a.html"], create_kind()));
    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(kind_of(&debouncer, "/site/a.html"), ChangeKind::Created);
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(vec!["/site/a.html"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/site/a.html"], remove_kind()));
    assert_eq!(kind_of(&debouncer, "/site/a.html"), ChangeKind::Removed);
}

#[test]
fn test_create_then_remove_still_yields() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(vec!["/site/draft.html"], create_kind()));
    debouncer.add_event(&make_event(vec!["/site/draft.html"], remove_kind()));
    assert_eq!(kind_of(&debouncer, "/site/draft.html"), ChangeKind::Removed);

    std::thread::sleep(WINDOW + Duration::from_millis(10));
    let changes = debouncer.take_if_ready().expect("burst must yield");
    assert_eq!(changes.len(), 1);
    assert!(debouncer.is_idle());
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_take_waits_for_quiet_window() {
    let mut debouncer = Debouncer::new(WINDOW);

    debouncer.add_event(&make_event(vec!["/site/a.html"], modify_kind()));
    assert!(debouncer.take_if_ready().is_none());

    std::thread::sleep(WINDOW + Duration::from_millis(10));
    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(debouncer.is_idle());
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.last_event = Some(std::time::Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur <= WINDOW);
    assert!(dur >= WINDOW - Duration::from_millis(20));
}

#[test]
fn test_describe_changes() {
    let root = PathBuf::from("/site");
    let mut changes = ChangeSet::default();
    changes.insert(root.join("style.css"), ChangeKind::Modified);
    assert_eq!(describe_changes(&root, &changes), "style.css");

    for name in ["b.html", "a.html", "css/c.css", "d.js"] {
        changes.insert(root.join(name), ChangeKind::Created);
    }
    assert_eq!(describe_changes(&root, &changes), "a.html, b.html, css/c.css (+2 more)");
}

#[tokio::test]
async fn test_burst_produces_one_reload() {
    let (event_tx, mut ws_rx) = spawn_loop();

    for i in 0..5 {
        let path = format!("/site/page{i}.html");
        event_tx.send(make_event(vec![path.as_str()], modify_kind())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    let reasons = drain_reloads(&mut ws_rx);
    assert_eq!(reasons.len(), 1, "{reasons:?}");
    assert!(reasons[0].starts_with("page0.html, page1.html, page2.html"));
}

#[tokio::test]
async fn test_separate_bursts_reload_separately() {
    let (event_tx, mut ws_rx) = spawn_loop();

    event_tx.send(make_event(vec!["/site/a.css"], modify_kind())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    event_tx.send(make_event(vec!["/site/b.css"], modify_kind())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(drain_reloads(&mut ws_rx), vec!["a.css", "b.css"]);
}

#[tokio::test]
async fn test_ignored_events_do_not_reload() {
    let (event_tx, mut ws_rx) = spawn_loop();

    event_tx.send(make_event(vec!["/site/.index.html.swp"], modify_kind())).await.unwrap();
    event_tx.send(make_event(vec!["/site/.git/index"], modify_kind())).await.unwrap();
    let metadata = EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any));
    event_tx.send(make_event(vec!["/site/a.css"], metadata)).await.unwrap();
    let access = EventKind::Access(AccessKind::Any);
    event_tx.send(make_event(vec!["/site/a.css"], access)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(drain_reloads(&mut ws_rx).is_empty());
}

#[tokio::test]
async fn test_transient_file_reloads() {
    let (event_tx, mut ws_rx) = spawn_loop();

    event_tx.send(make_event(vec!["/site/draft.html"], create_kind())).await.unwrap();
    event_tx.send(make_event(vec!["/site/draft.html"], remove_kind())).await.unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(drain_reloads(&mut ws_rx), vec!["draft.html"]);
}

#[tokio::test]
async fn test_loop_stops_when_ws_actor_gone() {
    let (event_tx, event_rx) = mpsc::channel(8);
    let (ws_tx, ws_rx) = mpsc::channel(1);
    drop(ws_rx);

    let handle = tokio::spawn(async move {
        debounce_loop(event_rx, Debouncer::new(WINDOW), &PathBuf::from("/site"), &ws_tx, || None).await;
    });

    event_tx.send(make_event(vec!["/site/a.css"], modify_kind())).await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("loop should stop")
        .unwrap();
}

#[tokio::test]
async fn test_watcher_reports_file_change() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    std::fs::write(root.join("style.css"), "body {}").unwrap();

    let (ws_tx, mut ws_rx) = mpsc::channel(16);
    let actor = FsActor::new(root.clone(), WINDOW, ws_tx).unwrap();
    tokio::spawn(actor.run());

    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(root.join("style.css"), "body { color: red }").unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(5), ws_rx.recv())
        .await
        .expect("reload expected")
        .unwrap();
    match msg {
        WsMsg::Reload { reason } => assert!(reason.contains("style.css"), "{reason}"),
        other => panic!("unexpected message: {other:?}"),
    }
}

/// Wait for the first reload from a real watcher.
async fn expect_reload(ws_rx: &mut mpsc::Receiver<WsMsg>) -> String {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws_rx.recv())
        .await
        .expect("reload expected")
        .unwrap();
    match msg {
        WsMsg::Reload { reason } => reason,
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn test_watcher_reports_created_then_deleted_file() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();

    let (ws_tx, mut ws_rx) = mpsc::channel(16);
    let actor = FsActor::new(root.clone(), WINDOW, ws_tx).unwrap();
    tokio::spawn(actor.run());

    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(root.join("draft.html"), "<p>draft</p>").unwrap();
    std::fs::remove_file(root.join("draft.html")).unwrap();

    let reason = expect_reload(&mut ws_rx).await;
    assert!(reason.contains("draft.html"), "{reason}");
}

#[tokio::test]
async fn test_watcher_reports_dotfile_change() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    std::fs::write(root.join(".htaccess"), "Options -Indexes").unwrap();

    let (ws_tx, mut ws_rx) = mpsc::channel(16);
    let actor = FsActor::new(root.clone(), WINDOW, ws_tx).unwrap();
    tokio::spawn(actor.run());

    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(root.join(".htaccess"), "Options +Indexes").unwrap();

    let reason = expect_reload(&mut ws_rx).await;
    assert!(reason.contains(".htaccess"), "{reason}");
}
