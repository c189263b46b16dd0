//! Error types for the transport layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {status} for {endpoint}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}
