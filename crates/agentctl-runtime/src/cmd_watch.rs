//! `agentctl watch` — live console over the presentation boundary.
//!
//! Wires up the full client (supervisor, session, snapshot loader, reconnect
//! refresh), then consumes the read-only `watch` subscription: prints the
//! connection badge and derived-state line on change, and streams new log
//! entries. Typed lines (`start`, `stop`, `auth`) go through the command
//! dispatcher; Ctrl-C cancels everything.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use agentctl_client::api::ApiClient;
use agentctl_client::commands::CommandDispatcher;
use agentctl_client::config::ClientConfig;
use agentctl_client::session::{ClientEvent, ConsoleSnapshot, Session};
use agentctl_client::snapshot::{load_snapshot, reconnect_refresh};
use agentctl_client::supervisor::ConnectionSupervisor;
use agentctl_core::types::{AgentState, ConnectionState, LogLevel};

use crate::cli::WatchOpts;

/// Entry point for `agentctl watch`.
pub async fn cmd_watch(base_url: &str, opts: WatchOpts) -> anyhow::Result<()> {
    let mut config = ClientConfig::new(base_url).context("invalid backend url")?;
    config.log_capacity = opts.log_capacity;
    config.refetch_on_reconnect = !opts.no_refetch;

    let api = ApiClient::new(&config)?;
    let cancel = CancellationToken::new();
    let (events_tx, events_rx) = mpsc::channel(256);

    let (supervisor, conn_rx) = ConnectionSupervisor::new(
        config.ws_url.clone(),
        config.backoff.clone(),
        events_tx.clone(),
        cancel.clone(),
    );
    let (session, mut snapshot_rx) =
        Session::new(config.log_capacity, events_rx, conn_rx.clone(), cancel.clone());

    tokio::spawn(supervisor.run());
    tokio::spawn(session.run());
    if config.refetch_on_reconnect {
        tokio::spawn(reconnect_refresh(
            api.clone(),
            conn_rx,
            events_tx.clone(),
            cancel.clone(),
        ));
    }

    // Initial authoritative fill. A failure leaves defaults in place and
    // shows up as one error entry in the stream below.
    {
        let api = api.clone();
        let events_tx = events_tx.clone();
        tokio::spawn(async move { load_snapshot(&api, &events_tx).await });
    }

    let dispatcher = CommandDispatcher::new(api.clone(), events_tx.clone());
    tokio::spawn(read_commands(dispatcher, api, events_tx, cancel.clone()));

    println!("type start | stop | auth | refresh \u{2014} Ctrl-C to quit");
    let mut view = ViewState::default();
    view.render(&snapshot_rx.borrow().clone());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                break;
            }
            changed = snapshot_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = snapshot_rx.borrow_and_update().clone();
                view.render(&snap);
            }
        }
    }

    println!("\nagentctl watch \u{2014} bye");
    Ok(())
}

/// Write surface of the presentation boundary: stdin lines become control
/// commands. Outcomes come back through the session's log buffer, not here.
async fn read_commands(
    dispatcher: CommandDispatcher,
    api: ApiClient,
    events_tx: mpsc::Sender<ClientEvent>,
    cancel: CancellationToken,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => match line.trim() {
                        "" => {}
                        "start" => dispatcher.start().await,
                        "stop" => dispatcher.stop().await,
                        "auth" => dispatcher.authenticate().await,
                        "refresh" => load_snapshot(&api, &events_tx).await,
                        other => {
                            eprintln!("unknown command: {other} (try start | stop | auth | refresh)");
                        }
                    },
                    Ok(None) | Err(_) => return,
                }
            }
        }
    }
}

/// Tracks what has already been printed so each change is shown once.
#[derive(Default)]
struct ViewState {
    last_connection: Option<ConnectionState>,
    last_agent: Option<AgentState>,
    next_sequence: u64,
}

impl ViewState {
    fn render(&mut self, snap: &ConsoleSnapshot) {
        if self.last_connection != Some(snap.connection) {
            println!("── {} ({})", badge(snap.connection), snap.connection);
            self.last_connection = Some(snap.connection);
        }

        if self.last_agent.as_ref() != Some(&snap.agent) {
            println!(
                "   run={} auth={} activity={:?}",
                snap.agent.run_status, snap.agent.auth_status, snap.agent.activity_label
            );
            self.last_agent = Some(snap.agent.clone());
        }

        let next_sequence = self.next_sequence;
        for entry in snap.log.iter().filter(|e| e.sequence >= next_sequence) {
            let time = entry.received_at.format("%H:%M:%S");
            match entry.level {
                LogLevel::Info => println!("{time} \u{279c} {}", entry.text),
                LogLevel::Error => println!("{time} \u{279c} \x1b[31m{}\x1b[0m", entry.text),
            }
            self.next_sequence = entry.sequence + 1;
        }
    }
}

/// Connection badge wording, matching the dashboard header.
fn badge(state: ConnectionState) -> &'static str {
    if state.is_open() { "System Online" } else { "Disconnected" }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_wording() {
        assert_eq!(badge(ConnectionState::Open), "System Online");
        assert_eq!(badge(ConnectionState::Closed), "Disconnected");
        assert_eq!(badge(ConnectionState::Connecting), "Disconnected");
        assert_eq!(badge(ConnectionState::Reconnecting), "Disconnected");
    }

    #[test]
    fn view_state_tracks_printed_sequences() {
        let mut view = ViewState::default();
        let snap = ConsoleSnapshot::default();
        view.render(&snap);
        assert_eq!(view.next_sequence, 0);
        assert_eq!(view.last_connection, Some(ConnectionState::Connecting));
    }
}
