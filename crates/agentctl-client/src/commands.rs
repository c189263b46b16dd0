//! Command dispatcher: start / stop / authenticate.
//!
//! Each operation is a single outbound request with no retry. Outcomes are
//! not applied to state here — they are emitted as [`CommandEffect`]s into
//! the serialized event queue so the session loop stays the only writer.

use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::session::ClientEvent;

/// Appended synchronously before the auth request is sent — the flow is
/// expected to be slow and may pop a browser window on the agent host.
pub const AUTH_STARTING_LOG: &str = "Starting Authentication... Check for browser window.";
pub const AUTH_SUCCESS_LOG: &str = "Authentication Successful!";
pub const AUTH_FAILED_LOG: &str = "Authentication Failed.";

/// Local consequence of a dispatched command, applied by the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEffect {
    /// `/start` acknowledged: optimistically mark the agent running.
    StartAcked,
    /// `/stop` acknowledged: optimistically mark the agent idle.
    StopAcked,
    /// Auth request is about to go out; append the starting log entry now.
    AuthStarted,
    /// Backend confirmed authentication.
    AuthSucceeded,
    /// Backend rejected authentication (`success: false`).
    AuthFailed,
    /// Transport-level failure; state stays unchanged, one error entry.
    RequestFailed {
        command: &'static str,
        detail: String,
    },
}

#[derive(Clone)]
pub struct CommandDispatcher {
    api: ApiClient,
    events_tx: mpsc::Sender<ClientEvent>,
}

impl CommandDispatcher {
    pub fn new(api: ApiClient, events_tx: mpsc::Sender<ClientEvent>) -> Self {
        Self { api, events_tx }
    }

    pub async fn start(&self) {
        match self.api.start().await {
            Ok(()) => self.emit(CommandEffect::StartAcked).await,
            Err(e) => {
                tracing::warn!(error = %e, "start command failed");
                self.emit(CommandEffect::RequestFailed {
                    command: "start",
                    detail: e.to_string(),
                })
                .await;
            }
        }
    }

    pub async fn stop(&self) {
        match self.api.stop().await {
            Ok(()) => self.emit(CommandEffect::StopAcked).await,
            Err(e) => {
                tracing::warn!(error = %e, "stop command failed");
                self.emit(CommandEffect::RequestFailed {
                    command: "stop",
                    detail: e.to_string(),
                })
                .await;
            }
        }
    }

    pub async fn authenticate(&self) {
        self.emit(CommandEffect::AuthStarted).await;
        match self.api.auth().await {
            Ok(true) => self.emit(CommandEffect::AuthSucceeded).await,
            Ok(false) => self.emit(CommandEffect::AuthFailed).await,
            Err(e) => {
                tracing::warn!(error = %e, "auth command failed");
                self.emit(CommandEffect::RequestFailed {
                    command: "auth",
                    detail: e.to_string(),
                })
                .await;
            }
        }
    }

    async fn emit(&self, effect: CommandEffect) {
        // Session gone means shutdown is in progress; nothing to do.
        let _ = self.events_tx.send(ClientEvent::Command(effect)).await;
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn unreachable_dispatcher() -> (CommandDispatcher, mpsc::Receiver<ClientEvent>) {
        // Nothing listens on this port; requests fail fast with a
        // connection error rather than timing out.
        let mut config = ClientConfig::new("http://127.0.0.1:1").unwrap();
        config.request_timeout = std::time::Duration::from_secs(2);
        let api = ApiClient::new(&config).unwrap();
        let (tx, rx) = mpsc::channel(16);
        (CommandDispatcher::new(api, tx), rx)
    }

    #[tokio::test]
    async fn start_failure_emits_request_failed() {
        let (dispatcher, mut rx) = unreachable_dispatcher();
        dispatcher.start().await;
        match rx.recv().await {
            Some(ClientEvent::Command(CommandEffect::RequestFailed { command, .. })) => {
                assert_eq!(command, "start");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn auth_emits_started_before_outcome() {
        let (dispatcher, mut rx) = unreachable_dispatcher();
        dispatcher.authenticate().await;
        assert_eq!(
            rx.recv().await,
            Some(ClientEvent::Command(CommandEffect::AuthStarted))
        );
        match rx.recv().await {
            Some(ClientEvent::Command(CommandEffect::RequestFailed { command, .. })) => {
                assert_eq!(command, "auth");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
