use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Run & Auth Status ────────────────────────────────────────────

/// Whether the agent is actively executing a cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
}

impl RunStatus {
    pub fn from_flag(is_running: bool) -> Self {
        if is_running { Self::Running } else { Self::Idle }
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    #[default]
    Unauthenticated,
    Authenticated,
}

impl AuthStatus {
    pub fn from_flag(is_authenticated: bool) -> Self {
        if is_authenticated {
            Self::Authenticated
        } else {
            Self::Unauthenticated
        }
    }

    pub fn is_authenticated(self) -> bool {
        self == Self::Authenticated
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Connection State ─────────────────────────────────────────────

/// Lifecycle of the push channel. Owned exclusively by the connection
/// supervisor; read-only everywhere else.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
    Reconnecting,
}

impl ConnectionState {
    pub fn is_open(self) -> bool {
        self == Self::Open
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Derived Agent State ──────────────────────────────────────────

/// The reconciled view of the agent: run status, free-text activity label,
/// and authentication status. Single instance, mutated only by the
/// reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub run_status: RunStatus,
    pub activity_label: String,
    pub auth_status: AuthStatus,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            run_status: RunStatus::Idle,
            activity_label: "Idle".to_owned(),
            auth_status: AuthStatus::Unauthenticated,
        }
    }
}

// ─── Status Snapshot ──────────────────────────────────────────────

/// Authoritative point-in-time state returned by `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub is_running: bool,
    pub current_action: String,
    pub is_authenticated: bool,
}

// ─── Log Buffer Entries ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable line in the log buffer. `sequence` is assigned locally in
/// arrival order and is strictly increasing for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub sequence: u64,
    pub level: LogLevel,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

// ─── Inbound Events ───────────────────────────────────────────────

/// A push-channel message decoded into its closed set of variants.
/// Produced once by the normalizer, consumed once by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A log line emitted by the agent.
    Log(String),
    /// New activity label ("Analyzing Trends...", "Uploading...", ...).
    Status(String),
    /// Authoritative running flag change.
    RunState(bool),
    /// Backend-reported error, surfaced through the log buffer.
    Error(String),
}

// ─── Tests ────────────────────────────────────────────────────────
