//! Client configuration.
//!
//! A single struct populated from CLI args / env vars by the binary; no
//! config-file persistence.

use std::time::Duration;

use agentctl_core::reconcile::DEFAULT_LOG_CAPACITY;

use crate::error::ClientError;
use crate::supervisor::BackoffPolicy;

/// Default backend base URL, matching the agent API's default bind.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Push channel URL, derived from `base_url` unless overridden.
    pub ws_url: String,
    /// Per-request timeout for snapshot and command calls.
    pub request_timeout: Duration,
    /// Log buffer capacity (`0` = unbounded).
    pub log_capacity: usize,
    /// Reconnect backoff policy for the push channel.
    pub backoff: BackoffPolicy,
    /// Re-run the snapshot loader after every successful reconnect to heal
    /// drift accumulated while the channel was down.
    pub refetch_on_reconnect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            ws_url: "ws://localhost:8000/ws".to_owned(),
            request_timeout: Duration::from_secs(10),
            log_capacity: DEFAULT_LOG_CAPACITY,
            backoff: BackoffPolicy::default(),
            refetch_on_reconnect: true,
        }
    }
}

impl ClientConfig {
    /// Build a config for the given base URL, deriving the push channel URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        let ws_url = derive_ws_url(&base_url)?;
        Ok(Self {
            base_url,
            ws_url,
            ..Self::default()
        })
    }
}

/// Derive the push channel URL from the REST base URL: scheme swap
/// (`http` → `ws`, `https` → `wss`) plus the `/ws` path.
pub fn derive_ws_url(base_url: &str) -> Result<String, ClientError> {
    let trimmed = base_url.trim_end_matches('/');
    let swapped = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(ClientError::InvalidBaseUrl(base_url.to_owned()));
    };
    Ok(format!("{swapped}/ws"))
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_ws_url_from_http() {
        assert_eq!(
            derive_ws_url("http://localhost:8000").unwrap(),
            "ws://localhost:8000/ws"
        );
    }

    #[test]
    fn derives_wss_url_from_https() {
        assert_eq!(
            derive_ws_url("https://agent.example.com").unwrap(),
            "wss://agent.example.com/ws"
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(
            derive_ws_url("http://localhost:8000/").unwrap(),
            "ws://localhost:8000/ws"
        );
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(matches!(
            derive_ws_url("ftp://localhost"),
            Err(ClientError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn default_config_is_consistent() {
        let config = ClientConfig::default();
        assert_eq!(derive_ws_url(&config.base_url).unwrap(), config.ws_url);
        assert!(config.refetch_on_reconnect);
        assert_eq!(config.log_capacity, DEFAULT_LOG_CAPACITY);
    }
}
