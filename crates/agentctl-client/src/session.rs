//! Session loop: the single writer.
//!
//! All three input paths — push events from the connection supervisor, the
//! snapshot loader, and command effects from the dispatcher — funnel into
//! one `mpsc` queue consumed here, so mutations of the reconciler are
//! strictly serialized. After each committed mutation the loop publishes a
//! complete [`ConsoleSnapshot`] over a `watch` channel; readers only ever
//! observe fully-settled state.

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use agentctl_core::reconcile::{Reconciler, StateVersion};
use agentctl_core::types::{
    AgentState, ConnectionState, InboundEvent, LogEntry, LogLevel, RunStatus, StatusSnapshot,
};

use crate::commands::{
    AUTH_FAILED_LOG, AUTH_STARTING_LOG, AUTH_SUCCESS_LOG, CommandEffect,
};

/// One item on the serialized mutation queue.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Normalized push-channel event.
    Push(InboundEvent),
    /// Authoritative snapshot fetched successfully.
    SnapshotLoaded(StatusSnapshot),
    /// Snapshot fetch failed; carries the error text for the log buffer.
    SnapshotFailed(String),
    /// Local consequence of a dispatched command.
    Command(CommandEffect),
}

/// Complete read model published to the presentation boundary after every
/// committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleSnapshot {
    pub agent: AgentState,
    pub connection: ConnectionState,
    pub log: Vec<LogEntry>,
    pub version: StateVersion,
}

impl Default for ConsoleSnapshot {
    fn default() -> Self {
        Self {
            agent: AgentState::default(),
            connection: ConnectionState::Connecting,
            log: Vec::new(),
            version: 0,
        }
    }
}

pub struct Session {
    events_rx: mpsc::Receiver<ClientEvent>,
    conn_rx: watch::Receiver<ConnectionState>,
    reconciler: Reconciler,
    snapshot_tx: watch::Sender<ConsoleSnapshot>,
    cancel: CancellationToken,
}

impl Session {
    /// Create the session loop and the presentation boundary's read side.
    pub fn new(
        log_capacity: usize,
        events_rx: mpsc::Receiver<ClientEvent>,
        conn_rx: watch::Receiver<ConnectionState>,
        cancel: CancellationToken,
    ) -> (Self, watch::Receiver<ConsoleSnapshot>) {
        let initial = ConsoleSnapshot {
            connection: *conn_rx.borrow(),
            ..ConsoleSnapshot::default()
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        (
            Self {
                events_rx,
                conn_rx,
                reconciler: Reconciler::new(log_capacity),
                snapshot_tx,
                cancel,
            },
            snapshot_rx,
        )
    }

    /// Run until cancelled or until every event producer is gone.
    pub async fn run(mut self) {
        tracing::info!("session: event loop started");
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("session: cancellation requested, shutting down");
                    break;
                }
                changed = self.conn_rx.changed() => {
                    if changed.is_err() {
                        tracing::info!("session: connection signal gone, shutting down");
                        break;
                    }
                    self.publish();
                }
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => {
                            self.handle(event);
                            self.publish();
                        }
                        None => {
                            tracing::info!("session: event queue closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn handle(&mut self, event: ClientEvent) {
        let now = Utc::now();
        match event {
            ClientEvent::Push(event) => {
                tracing::debug!(?event, "applying push event");
                self.reconciler.apply(event, now);
            }
            ClientEvent::SnapshotLoaded(snapshot) => {
                tracing::debug!(?snapshot, "applying status snapshot");
                self.reconciler.apply_snapshot(snapshot);
            }
            ClientEvent::SnapshotFailed(detail) => {
                self.reconciler
                    .push_log(LogLevel::Error, format!("status fetch failed: {detail}"), now);
            }
            ClientEvent::Command(effect) => self.handle_command(effect),
        }
    }

    fn handle_command(&mut self, effect: CommandEffect) {
        let now = Utc::now();
        match effect {
            CommandEffect::StartAcked => {
                self.reconciler.set_run_status(RunStatus::Running);
            }
            CommandEffect::StopAcked => {
                self.reconciler.set_run_status(RunStatus::Idle);
            }
            CommandEffect::AuthStarted => {
                self.reconciler.push_log(LogLevel::Info, AUTH_STARTING_LOG, now);
            }
            CommandEffect::AuthSucceeded => {
                self.reconciler.set_authenticated();
                self.reconciler.push_log(LogLevel::Info, AUTH_SUCCESS_LOG, now);
            }
            CommandEffect::AuthFailed => {
                self.reconciler.push_log(LogLevel::Error, AUTH_FAILED_LOG, now);
            }
            CommandEffect::RequestFailed { command, detail } => {
                self.reconciler.push_log(
                    LogLevel::Error,
                    format!("{command} request failed: {detail}"),
                    now,
                );
            }
        }
    }

    fn publish(&mut self) {
        let snapshot = ConsoleSnapshot {
            agent: self.reconciler.state().clone(),
            connection: *self.conn_rx.borrow(),
            log: self.reconciler.log().iter().cloned().collect(),
            version: self.reconciler.version(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}

// ─── Tests ────────────────────────────────────────────────────────
