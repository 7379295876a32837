//! Coordinator errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

impl CoordinatorError {
    /// Build from a non-success backend reply, preferring a `detail` or
    /// `error` message from a JSON body.
    pub fn from_backend_response(status: u16, body: String) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("error"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or(body);
        CoordinatorError::Backend { status, message }
    }
}

impl From<reqwest::Error> for CoordinatorError {
    fn from(e: reqwest::Error) -> Self {
        CoordinatorError::Network(e.to_string())
    }
}
