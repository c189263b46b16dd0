//! Snapshot loader: the one-shot authoritative state fetch.
//!
//! Results are never applied directly — they are pushed into the serialized
//! event queue so the session loop can replace all three derived fields in
//! one committed mutation. A failed fetch surfaces as a single error log
//! entry and leaves state at its previous values; it never crashes the
//! client.

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use agentctl_core::types::ConnectionState;

use crate::api::ApiClient;
use crate::session::ClientEvent;

/// Fetch `/status` once and feed the outcome into the session queue.
pub async fn load_snapshot(api: &ApiClient, events_tx: &mpsc::Sender<ClientEvent>) {
    match api.status().await {
        Ok(snapshot) => {
            let _ = events_tx.send(ClientEvent::SnapshotLoaded(snapshot)).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "status fetch failed");
            let _ = events_tx
                .send(ClientEvent::SnapshotFailed(e.to_string()))
                .await;
        }
    }
}

/// Re-run the snapshot loader after every successful reconnect.
///
/// Events emitted by the backend while the push channel was down are lost,
/// not replayed; re-fetching on the `Reconnecting → Open` transition bounds
/// the staleness window. Runs until cancelled or until the supervisor drops
/// its side of the connection-state signal.
pub async fn reconnect_refresh(
    api: ApiClient,
    mut conn_rx: watch::Receiver<ConnectionState>,
    events_tx: mpsc::Sender<ClientEvent>,
    cancel: CancellationToken,
) {
    let mut prev = *conn_rx.borrow();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = conn_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                let current = *conn_rx.borrow_and_update();
                if current == ConnectionState::Open && prev == ConnectionState::Reconnecting {
                    tracing::info!("push channel recovered, re-fetching status snapshot");
                    load_snapshot(&api, &events_tx).await;
                }
                prev = current;
            }
        }
    }
}
