//! HTTP clients for the external detection backend.

pub mod l293d;
pub mod vision;

pub use l293d::{L293dClient, ReadingSource};
pub use vision::{DetectionResponse, VisionClient};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend reported an error: {0}")]
    Flagged(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;

impl BackendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Request(e) if e.is_timeout())
    }

    /// Short reason suitable for showing to the user. Prefers a `message`
    /// field from a JSON error body when the backend sent one.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Status { status, body } => serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status)),
            other => other.to_string(),
        }
    }
}

/// Join the backend origin and an endpoint path without doubling slashes.
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(BackendError::Status { status: status.as_u16(), body });
    }
    Ok(response)
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value> {
    let response = ensure_success(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| BackendError::Malformed(e.to_string()))
}
