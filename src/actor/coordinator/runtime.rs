use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::messages::WsMsg;
use crate::actor::ws::WsActor;

/// Interval between shutdown signal checks
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Grace period for WsActor to close its clients
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Run all actors concurrently.
pub(super) async fn run_actors(
    fs: Option<FsActor>,
    ws: WsActor,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) -> Result<()> {
    let ws_handle = tokio::spawn(ws.run());
    let fs_handle = fs.map(|fs| tokio::spawn(fs.run()));

    if let Some(rx) = shutdown_rx {
        // A dropped sender keeps the actors running
        while rx.try_recv().is_err() && !ws_handle.is_finished() {
            tokio::time::sleep(SHUTDOWN_POLL).await;
        }
        crate::debug!("actor"; "shutdown signal received");
    } else {
        let _ = ws_handle.await;
        if let Some(handle) = fs_handle {
            handle.abort();
        }
        return Ok(());
    }

    crate::debug!("actor"; "sending shutdown to ws");
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    drop(ws_tx);

    let _ = tokio::time::timeout(SHUTDOWN_GRACE, ws_handle).await;

    // Stops observation; nothing is sent after this point
    if let Some(handle) = fs_handle {
        handle.abort();
    }

    Ok(())
}
