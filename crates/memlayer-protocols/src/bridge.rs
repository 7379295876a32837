//! Background bridge protocol definitions.
//!
//! The bridge is the only way page-side code reaches the coordinator,
//! which owns authentication and talks to the persistence backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::BridgeError;
use crate::types::{ContextBundle, ProviderId, SavedRecord, SessionIdentity};

/// Typed request/response channel to the coordinator.
///
/// No retries are performed here; callers own any retry policy.
#[async_trait]
pub trait BackgroundBridge: Send + Sync {
    async fn get_auth_status(&self) -> Result<AuthStatus, BridgeError>;

    async fn save_prompt(
        &self,
        text: &str,
        provider: &ProviderId,
    ) -> Result<SavedRecord, BridgeError>;

    /// Best-effort: any failure degrades to an empty bundle.
    async fn get_context(&self, query: &str) -> ContextBundle;

    async fn save_response(
        &self,
        prompt: &str,
        response_text: &str,
        provider: &ProviderId,
    ) -> Result<SavedRecord, BridgeError>;
}

/// A request to the coordinator, tagged by its `type` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeRequest {
    GetAuthStatus,
    SavePrompt { data: SavePromptData },
    GetContext { query: String },
    SaveResponse { data: SaveResponseData },
}

impl BridgeRequest {
    pub fn save_prompt(prompt: impl Into<String>, provider: ProviderId) -> Self {
        BridgeRequest::SavePrompt {
            data: SavePromptData {
                prompt: prompt.into(),
                provider,
            },
        }
    }

    pub fn get_context(query: impl Into<String>) -> Self {
        BridgeRequest::GetContext {
            query: query.into(),
        }
    }

    pub fn save_response(
        prompt: impl Into<String>,
        response: impl Into<String>,
        provider: ProviderId,
    ) -> Self {
        BridgeRequest::SaveResponse {
            data: SaveResponseData {
                prompt: prompt.into(),
                response: response.into(),
                provider,
            },
        }
    }

    /// The wire `type` tag of this request.
    pub fn type_tag(&self) -> &'static str {
        match self {
            BridgeRequest::GetAuthStatus => "GET_AUTH_STATUS",
            BridgeRequest::SavePrompt { .. } => "SAVE_PROMPT",
            BridgeRequest::GetContext { .. } => "GET_CONTEXT",
            BridgeRequest::SaveResponse { .. } => "SAVE_RESPONSE",
        }
    }
}

/// One in-flight request travelling to the coordinator with its reply slot.
#[derive(Debug)]
pub struct BridgeCall {
    pub request: BridgeRequest,
    pub reply: oneshot::Sender<BridgeEnvelope>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePromptData {
    pub prompt: String,
    pub provider: ProviderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponseData {
    pub prompt: String,
    pub response: String,
    pub provider: ProviderId,
}

/// Uniform reply envelope for every request kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeEnvelope {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Unwrap the payload, turning `success: false` into `SaveRejected`.
    pub fn into_result(self, fallback: &str) -> Result<serde_json::Value, BridgeError> {
        if self.success {
            Ok(self.data.unwrap_or(serde_json::Value::Null))
        } else {
            Err(BridgeError::SaveRejected(
                self.error.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

/// Payload of a `GET_AUTH_STATUS` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

impl AuthStatus {
    pub fn into_identity(self) -> SessionIdentity {
        match (self.is_authenticated, self.user) {
            (true, Some(user)) => SessionIdentity::authenticated(user.id),
            _ => SessionIdentity::unauthenticated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
}

/// Payload of a `GET_CONTEXT` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPayload {
    #[serde(default)]
    pub contexts: Vec<String>,
}
