//! REST boundary: `GET /status`, `POST /start`, `POST /stop`, `POST /auth`.
//!
//! Thin typed wrapper over `reqwest`. Callers decide how failures feed back
//! into the session; nothing here retries.

use serde::Deserialize;

use agentctl_core::types::StatusSnapshot;

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct AuthResponse {
    success: bool,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// One-shot authoritative state fetch.
    pub async fn status(&self) -> Result<StatusSnapshot, ClientError> {
        let resp = self.http.get(self.url("/status")).send().await?;
        let resp = check(resp, "/status")?;
        Ok(resp.json().await?)
    }

    /// Ask the agent to start an automation cycle. Body is not load-bearing
    /// beyond the 2xx acknowledgement.
    pub async fn start(&self) -> Result<(), ClientError> {
        let resp = self.http.post(self.url("/start")).send().await?;
        check(resp, "/start")?;
        Ok(())
    }

    /// Ask the agent to stop.
    pub async fn stop(&self) -> Result<(), ClientError> {
        let resp = self.http.post(self.url("/stop")).send().await?;
        check(resp, "/stop")?;
        Ok(())
    }

    /// Trigger the backend's out-of-band authentication flow. Slow: may
    /// involve an interactive browser step on the agent host.
    pub async fn auth(&self) -> Result<bool, ClientError> {
        let resp = self.http.post(self.url("/auth")).send().await?;
        let resp = check(resp, "/auth")?;
        let body: AuthResponse = resp.json().await?;
        Ok(body.success)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(ClientError::Status {
            endpoint,
            status: status.as_u16(),
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────
