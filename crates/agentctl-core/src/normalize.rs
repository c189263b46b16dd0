//! Push-channel envelope decoding.
//!
//! The backend frames every push message as `{"type": ..., "data": ...}`.
//! This is the only place that touches the untyped envelope: everything
//! downstream works with [`InboundEvent`].
//!
//! Malformed traffic is rejected, never surfaced as a user-visible log
//! entry. The caller is expected to count rejects and log them at debug
//! level only — a backend-reported error (`type = "error"`) is the one
//! error shape that reaches the user, and it does so as a typed event.

use crate::types::InboundEvent;
use std::fmt;

/// Why an inbound message was dropped at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Payload was not valid JSON.
    InvalidJson,
    /// Envelope had no string `type` field.
    MissingType,
    /// `type` was a string but not one of the known discriminators.
    UnknownType(String),
    /// Known `type` whose `data` did not match the expected shape.
    MalformedData { msg_type: &'static str },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "invalid json"),
            Self::MissingType => write!(f, "missing type discriminator"),
            Self::UnknownType(t) => write!(f, "unknown message type: {t}"),
            Self::MalformedData { msg_type } => {
                write!(f, "malformed data for type {msg_type}")
            }
        }
    }
}

/// Decode one raw push message into a typed event.
///
/// Expected envelopes:
/// ```json
/// {"type": "log",    "data": "Selected Topic: ..."}
/// {"type": "status", "data": "Rendering video"}
/// {"type": "state",  "data": {"is_running": true}}
/// {"type": "error",  "data": "No topic selected"}
/// ```
pub fn normalize(raw: &str) -> Result<InboundEvent, RejectReason> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| RejectReason::InvalidJson)?;

    let msg_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(RejectReason::MissingType)?;

    let data = value.get("data");

    match msg_type {
        "log" => data
            .and_then(|d| d.as_str())
            .map(|s| InboundEvent::Log(s.to_owned()))
            .ok_or(RejectReason::MalformedData { msg_type: "log" }),
        "status" => data
            .and_then(|d| d.as_str())
            .map(|s| InboundEvent::Status(s.to_owned()))
            .ok_or(RejectReason::MalformedData { msg_type: "status" }),
        "state" => data
            .and_then(|d| d.get("is_running"))
            .and_then(|r| r.as_bool())
            .map(InboundEvent::RunState)
            .ok_or(RejectReason::MalformedData { msg_type: "state" }),
        "error" => data
            .and_then(|d| d.as_str())
            .map(|s| InboundEvent::Error(s.to_owned()))
            .ok_or(RejectReason::MalformedData { msg_type: "error" }),
        other => Err(RejectReason::UnknownType(other.to_owned())),
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_log() {
        let raw = r#"{"type": "log", "data": "Script generated."}"#;
        assert_eq!(
            normalize(raw),
            Ok(InboundEvent::Log("Script generated.".into()))
        );
    }

    #[test]
    fn decode_status() {
        let raw = r#"{"type": "status", "data": "Analyzing Trends..."}"#;
        assert_eq!(
            normalize(raw),
            Ok(InboundEvent::Status("Analyzing Trends...".into()))
        );
    }

    #[test]
    fn decode_state_running() {
        let raw = r#"{"type": "state", "data": {"is_running": true}}"#;
        assert_eq!(normalize(raw), Ok(InboundEvent::RunState(true)));
    }

    #[test]
    fn decode_state_stopped() {
        let raw = r#"{"type": "state", "data": {"is_running": false}}"#;
        assert_eq!(normalize(raw), Ok(InboundEvent::RunState(false)));
    }

    #[test]
    fn decode_error() {
        let raw = r#"{"type": "error", "data": "YouTube Auth failed."}"#;
        assert_eq!(
            normalize(raw),
            Ok(InboundEvent::Error("YouTube Auth failed.".into()))
        );
    }

    #[test]
    fn reject_non_string_log_data() {
        let raw = r#"{"type": "log", "data": 42}"#;
        assert_eq!(
            normalize(raw),
            Err(RejectReason::MalformedData { msg_type: "log" })
        );
    }

    #[test]
    fn reject_unknown_type() {
        let raw = r#"{"type": "bogus"}"#;
        assert_eq!(normalize(raw), Err(RejectReason::UnknownType("bogus".into())));
    }

    #[test]
    fn reject_missing_type() {
        let raw = r#"{"data": "orphan"}"#;
        assert_eq!(normalize(raw), Err(RejectReason::MissingType));
    }

    #[test]
    fn reject_non_string_type() {
        let raw = r#"{"type": 7, "data": "x"}"#;
        assert_eq!(normalize(raw), Err(RejectReason::MissingType));
    }

    #[test]
    fn reject_invalid_json() {
        assert_eq!(normalize("not json"), Err(RejectReason::InvalidJson));
    }

    #[test]
    fn reject_state_without_running_flag() {
        let raw = r#"{"type": "state", "data": {"paused": true}}"#;
        assert_eq!(
            normalize(raw),
            Err(RejectReason::MalformedData { msg_type: "state" })
        );
    }

    #[test]
    fn reject_state_with_non_bool_flag() {
        let raw = r#"{"type": "state", "data": {"is_running": "yes"}}"#;
        assert_eq!(
            normalize(raw),
            Err(RejectReason::MalformedData { msg_type: "state" })
        );
    }
}
