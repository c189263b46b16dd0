//! Connection supervisor for the push channel.
//!
//! Owns the single logical WebSocket connection and its perpetual retry
//! loop: the supervisor never gives up, it only backs off. Connection state
//! transitions are published over a `watch` channel; decoded events go into
//! the serialized session queue. Frames that fail normalization are dropped
//! with a debug trace and an internal counter — they never become
//! user-visible log entries.
//!
//! State cycle: `Connecting → Open → Closed → Reconnecting → Open → ...`
//! (`Reconnecting` covers the backoff wait and every retry attempt after
//! the first). Retries after a drop deliberately report `Reconnecting`, not
//! `Connecting`: the distinction is what lets the snapshot loader tell a
//! recovery apart from the initial connect and re-fetch only on recovery.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use agentctl_core::normalize::normalize;
use agentctl_core::types::ConnectionState;

use crate::error::ClientError;
use crate::session::ClientEvent;

// ─── Backoff Policy ──────────────────────────────────────────────

/// Capped exponential backoff for reconnect attempts.
///
/// The schedule below is pure and returns pre-jitter delays; the supervisor
/// applies jitter before sleeping so repeated client fleets do not
/// reconnect in lockstep.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub multiplier: f64,
    pub max: Duration,
    /// Jitter fraction applied around the computed delay (0.20 = ±20%).
    pub jitter_pct: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            multiplier: 2.0,
            max: Duration::from_secs(30),
            jitter_pct: 0.20,
        }
    }
}

/// Tracks consecutive failed attempts and yields the next delay.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    policy: BackoffPolicy,
    attempt: u32,
}

impl BackoffSchedule {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Delay before the next attempt, pre-jitter. Advances the attempt
    /// counter.
    pub fn next_delay(&mut self) -> Duration {
        let raw = self.policy.initial.as_millis() as f64
            * self.policy.multiplier.powi(self.attempt as i32);
        let capped = (raw as u64).min(self.policy.max.as_millis() as u64);
        self.attempt = self.attempt.saturating_add(1);
        Duration::from_millis(capped)
    }

    /// Reset after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Spread `delay` by ±`jitter_pct` using a cheap deterministic mix of the
/// seed. Good enough to de-synchronize reconnecting clients; not random.
pub fn apply_jitter(delay: Duration, jitter_pct: f64, seed: u64) -> Duration {
    if jitter_pct <= 0.0 {
        return delay;
    }
    let mut x = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    x ^= x >> 33;
    x = x.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    x ^= x >> 33;
    let frac = (x % 1000) as f64 / 1000.0;
    let factor = 1.0 - jitter_pct + 2.0 * jitter_pct * frac;
    delay.mul_f64(factor)
}

// ─── Supervisor ──────────────────────────────────────────────────

pub struct ConnectionSupervisor {
    ws_url: String,
    events_tx: mpsc::Sender<ClientEvent>,
    conn_tx: watch::Sender<ConnectionState>,
    backoff: BackoffSchedule,
    cancel: CancellationToken,
    /// Protocol-decode rejects. Internal diagnostic only.
    rejected: u64,
}

impl ConnectionSupervisor {
    /// Create a supervisor and the read side of its connection-state signal.
    pub fn new(
        ws_url: String,
        policy: BackoffPolicy,
        events_tx: mpsc::Sender<ClientEvent>,
        cancel: CancellationToken,
    ) -> (Self, watch::Receiver<ConnectionState>) {
        let (conn_tx, conn_rx) = watch::channel(ConnectionState::Connecting);
        (
            Self {
                ws_url,
                events_tx,
                conn_tx,
                backoff: BackoffSchedule::new(policy),
                cancel,
                rejected: 0,
            },
            conn_rx,
        )
    }

    /// Perpetual connect/listen/retry loop. Returns only on cancellation or
    /// when the session side of the event queue is gone.
    pub async fn run(mut self) {
        let mut first_attempt = true;
        loop {
            self.conn_tx.send_replace(if first_attempt {
                ConnectionState::Connecting
            } else {
                ConnectionState::Reconnecting
            });

            let cancel = self.cancel.clone();
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("push channel: cancellation requested, shutting down");
                    self.conn_tx.send_replace(ConnectionState::Closed);
                    return;
                }
                result = self.connect_and_listen() => {
                    match result {
                        Ok(ListenOutcome::QueueClosed) => {
                            tracing::info!("push channel: session gone, shutting down");
                            self.conn_tx.send_replace(ConnectionState::Closed);
                            return;
                        }
                        Ok(ListenOutcome::ConnectionClosed) => {
                            tracing::info!("push channel: connection closed");
                        }
                        Err(e) => {
                            tracing::warn!(
                                attempt = self.backoff.attempt(),
                                "push channel: connection error: {e}"
                            );
                        }
                    }
                }
            }

            self.conn_tx.send_replace(ConnectionState::Closed);
            first_attempt = false;

            let delay = apply_jitter(
                self.backoff.next_delay(),
                self.backoff.policy.jitter_pct,
                u64::from(self.backoff.attempt()) ^ (u64::from(std::process::id()) << 32),
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("push channel: cancellation during retry backoff");
                    return;
                }
                _ = tokio::time::sleep(delay) => {
                    tracing::info!(
                        url = %self.ws_url,
                        delay_ms = delay.as_millis() as u64,
                        "push channel: reconnecting..."
                    );
                }
            }
        }
    }

    /// Single connection attempt: connect, then read until close or error.
    async fn connect_and_listen(&mut self) -> Result<ListenOutcome, ClientError> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.ws_url).await?;
        tracing::info!(url = %self.ws_url, "push channel: connected");
        self.backoff.reset();
        self.conn_tx.send_replace(ConnectionState::Open);

        // Receive-only channel: nothing is ever written back.
        let (_write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Ok(ListenOutcome::ConnectionClosed);
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if !self.deliver(&text).await {
                                return Ok(ListenOutcome::QueueClosed);
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            return Ok(ListenOutcome::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Ping/pong handled by tungstenite; binary ignored.
                        }
                        Some(Err(e)) => {
                            return Err(e.into());
                        }
                    }
                }
            }
        }
    }

    /// Normalize one text frame and hand it to the session. Returns false
    /// when the session side of the queue has been dropped.
    async fn deliver(&mut self, text: &str) -> bool {
        match normalize(text) {
            Ok(event) => self
                .events_tx
                .send(ClientEvent::Push(event))
                .await
                .is_ok(),
            Err(reason) => {
                self.rejected += 1;
                tracing::debug!(
                    %reason,
                    rejected_total = self.rejected,
                    "push channel: dropping malformed frame"
                );
                true
            }
        }
    }
}

enum ListenOutcome {
    /// Server closed the connection or the stream ended.
    ConnectionClosed,
    /// The session receiver was dropped; no point reconnecting.
    QueueClosed,
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_cap() {
        let mut schedule = BackoffSchedule::new(BackoffPolicy::default());
        assert_eq!(schedule.next_delay(), Duration::from_secs(1));
        assert_eq!(schedule.next_delay(), Duration::from_secs(2));
        assert_eq!(schedule.next_delay(), Duration::from_secs(4));
        assert_eq!(schedule.next_delay(), Duration::from_secs(8));
        assert_eq!(schedule.next_delay(), Duration::from_secs(16));
        assert_eq!(schedule.next_delay(), Duration::from_secs(30));
        assert_eq!(schedule.next_delay(), Duration::from_secs(30));
    }

    #[test]
    fn backoff_resets_on_success() {
        let mut schedule = BackoffSchedule::new(BackoffPolicy::default());
        schedule.next_delay();
        schedule.next_delay();
        schedule.reset();
        assert_eq!(schedule.attempt(), 0);
        assert_eq!(schedule.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let base = Duration::from_secs(10);
        for seed in 0..500 {
            let jittered = apply_jitter(base, 0.20, seed);
            assert!(jittered >= Duration::from_secs(8), "seed {seed}: {jittered:?}");
            assert!(jittered <= Duration::from_secs(12), "seed {seed}: {jittered:?}");
        }
    }

    #[test]
    fn zero_jitter_is_identity() {
        let base = Duration::from_millis(1234);
        assert_eq!(apply_jitter(base, 0.0, 42), base);
    }
}
