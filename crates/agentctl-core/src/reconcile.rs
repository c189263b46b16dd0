//! State reconciler: the single-writer merge engine.
//!
//! Combines the one-shot authoritative snapshot with the ordered inbound
//! event stream into derived agent state plus an append-only, bounded log
//! buffer. Pure and synchronous — the async layer is responsible for
//! funneling all writers through one `Reconciler` instance.
//!
//! Every event reaching `apply` has already passed normalization, so
//! nothing is rejected here.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::types::{
    AgentState, AuthStatus, InboundEvent, LogEntry, LogLevel, RunStatus, StatusSnapshot,
};

/// Monotonic version counter for change tracking. Bumped on every committed
/// mutation so readers can tell "something changed" apart cheaply.
pub type StateVersion = u64;

/// Default log buffer capacity. Oldest entries are evicted first once the
/// buffer is full. `0` disables the cap.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

#[derive(Debug)]
pub struct Reconciler {
    state: AgentState,
    log: VecDeque<LogEntry>,
    log_capacity: usize,
    next_sequence: u64,
    version: StateVersion,
    evicted: u64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl Reconciler {
    /// Create a reconciler with default state (idle, "Idle", unauthenticated)
    /// and the given log capacity (`0` = unbounded).
    pub fn new(log_capacity: usize) -> Self {
        Self {
            state: AgentState::default(),
            log: VecDeque::new(),
            log_capacity,
            next_sequence: 0,
            version: 0,
            evicted: 0,
        }
    }

    /// Apply one normalized inbound event. Last write wins per field.
    pub fn apply(&mut self, event: InboundEvent, now: DateTime<Utc>) -> StateVersion {
        match event {
            InboundEvent::Log(text) => {
                self.append(LogLevel::Info, text, now);
            }
            InboundEvent::Status(label) => {
                self.state.activity_label = label;
            }
            InboundEvent::RunState(running) => {
                self.state.run_status = RunStatus::from_flag(running);
            }
            InboundEvent::Error(text) => {
                // Backend-reported errors share the log channel, prefixed.
                self.append(LogLevel::Error, format!("ERROR: {text}"), now);
            }
        }
        self.bump()
    }

    /// Replace all three derived fields from an authoritative snapshot.
    /// The three fields always change together under one version bump, so a
    /// reader can never observe a partially applied snapshot.
    pub fn apply_snapshot(&mut self, snapshot: StatusSnapshot) -> StateVersion {
        self.state = AgentState {
            run_status: RunStatus::from_flag(snapshot.is_running),
            activity_label: snapshot.current_action,
            auth_status: AuthStatus::from_flag(snapshot.is_authenticated),
        };
        self.bump()
    }

    /// Append a locally produced log entry (command feedback, transport
    /// failures). Goes through the same sequence counter and eviction as
    /// event-sourced entries.
    pub fn push_log(
        &mut self,
        level: LogLevel,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> StateVersion {
        self.append(level, text.into(), now);
        self.bump()
    }

    /// Optimistic run-status update after a command acknowledgement. The
    /// backend is expected to confirm via a later `RunState` event; until
    /// then the local value may diverge.
    pub fn set_run_status(&mut self, status: RunStatus) -> StateVersion {
        self.state.run_status = status;
        self.bump()
    }

    /// Mark authentication as completed successfully.
    pub fn set_authenticated(&mut self) -> StateVersion {
        self.state.auth_status = AuthStatus::Authenticated;
        self.bump()
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Ordered log buffer, oldest first.
    pub fn log(&self) -> &VecDeque<LogEntry> {
        &self.log
    }

    pub fn version(&self) -> StateVersion {
        self.version
    }

    /// Number of entries dropped to capacity pressure so far.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    fn append(&mut self, level: LogLevel, text: String, now: DateTime<Utc>) {
        if self.log_capacity > 0 && self.log.len() >= self.log_capacity {
            self.log.pop_front();
            self.evicted += 1;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.log.push_back(LogEntry {
            sequence,
            level,
            text,
            received_at: now,
        });
    }

    fn bump(&mut self) -> StateVersion {
        self.version += 1;
        self.version
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn last_write_wins_per_field() {
        let mut rec = Reconciler::default();
        rec.apply(InboundEvent::Status("Analyzing Trends...".into()), now());
        rec.apply(InboundEvent::RunState(true), now());
        rec.apply(InboundEvent::Status("Uploading...".into()), now());
        rec.apply(InboundEvent::RunState(false), now());

        assert_eq!(rec.state().activity_label, "Uploading...");
        assert_eq!(rec.state().run_status, RunStatus::Idle);
    }

    #[test]
    fn status_event_leaves_other_fields_alone() {
        let mut rec = Reconciler::default();
        rec.apply(InboundEvent::Status("Rendering video".into()), now());
        assert_eq!(rec.state().activity_label, "Rendering video");
        assert_eq!(rec.state().run_status, RunStatus::Idle);
        assert_eq!(rec.state().auth_status, AuthStatus::Unauthenticated);
    }

    #[test]
    fn log_events_append_in_order() {
        let mut rec = Reconciler::default();
        for i in 0..5 {
            rec.apply(InboundEvent::Log(format!("line {i}")), now());
        }
        assert_eq!(rec.log().len(), 5);
        let sequences: Vec<u64> = rec.log().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3, 4]);
        assert!(rec.log().iter().all(|e| e.level == LogLevel::Info));
    }

    #[test]
    fn error_event_is_prefixed_error_level_log() {
        let mut rec = Reconciler::default();
        rec.apply(InboundEvent::Error("No topic selected".into()), now());
        let entry = rec.log().back().expect("entry");
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.text, "ERROR: No topic selected");
        // An error event does not touch derived state.
        assert_eq!(rec.state(), &AgentState::default());
    }

    #[test]
    fn snapshot_replaces_all_three_fields() {
        let mut rec = Reconciler::default();
        let before = rec.version();
        let after = rec.apply_snapshot(StatusSnapshot {
            is_running: true,
            current_action: "Editing Video...".into(),
            is_authenticated: true,
        });
        assert_eq!(after, before + 1);
        assert_eq!(rec.state().run_status, RunStatus::Running);
        assert_eq!(rec.state().activity_label, "Editing Video...");
        assert_eq!(rec.state().auth_status, AuthStatus::Authenticated);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut rec = Reconciler::new(3);
        for i in 0..5 {
            rec.apply(InboundEvent::Log(format!("line {i}")), now());
        }
        assert_eq!(rec.log().len(), 3);
        assert_eq!(rec.evicted(), 2);
        let texts: Vec<&str> = rec.log().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["line 2", "line 3", "line 4"]);
        // Sequence numbers keep counting across evictions.
        assert_eq!(rec.log().back().expect("entry").sequence, 4);
    }

    #[test]
    fn zero_capacity_means_unbounded() {
        let mut rec = Reconciler::new(0);
        for i in 0..2000 {
            rec.apply(InboundEvent::Log(format!("line {i}")), now());
        }
        assert_eq!(rec.log().len(), 2000);
        assert_eq!(rec.evicted(), 0);
    }

    #[test]
    fn optimistic_run_status_overridden_by_event() {
        let mut rec = Reconciler::default();
        rec.set_run_status(RunStatus::Running);
        assert_eq!(rec.state().run_status, RunStatus::Running);
        rec.apply(InboundEvent::RunState(false), now());
        assert_eq!(rec.state().run_status, RunStatus::Idle);
    }

    #[test]
    fn version_bumps_on_every_mutation() {
        let mut rec = Reconciler::default();
        assert_eq!(rec.version(), 0);
        rec.apply(InboundEvent::Log("a".into()), now());
        rec.push_log(LogLevel::Error, "status fetch failed", now());
        rec.set_authenticated();
        assert_eq!(rec.version(), 3);
    }
}
