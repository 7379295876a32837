//! Coordinator request loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use memlayer_config::Config;
use memlayer_protocols::{
    AuthStatus, BridgeCall, BridgeEnvelope, BridgeRequest, ContextPayload, SessionIdentity,
    UserInfo,
};

use crate::backend::BackendClient;
use crate::error::CoordinatorError;

/// Answers bridge requests on behalf of every provider session.
pub struct Coordinator {
    identity: SessionIdentity,
    backend: BackendClient,
}

impl Coordinator {
    pub fn new(identity: SessionIdentity, backend: BackendClient) -> Self {
        Self { identity, backend }
    }

    /// Build from configuration: identity from `[auth]`, backend from
    /// `[backend]` and the context limit from `[settings]`.
    pub fn from_config(config: &Config) -> Result<Self, CoordinatorError> {
        let backend = BackendClient::new(
            &config.backend,
            config.auth.access_token.clone(),
            config.settings.context_limit,
        )?;
        Ok(Self::new(config.auth.identity(), backend))
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Serve calls until every sender is dropped. Each call runs on its
    /// own task.
    pub fn spawn(self: Arc<Self>, mut rx: mpsc::Receiver<BridgeCall>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(backend = %self.backend.base_url(), "Coordinator started");
            while let Some(call) = rx.recv().await {
                let coordinator = self.clone();
                tokio::spawn(async move {
                    let envelope = coordinator.handle(call.request).await;
                    if call.reply.send(envelope).is_err() {
                        debug!("Bridge caller went away before the reply");
                    }
                });
            }
            info!("Coordinator stopped");
        })
    }

    pub async fn handle(&self, request: BridgeRequest) -> BridgeEnvelope {
        let tag = request.type_tag();
        debug!("Handling {}", tag);

        if request == BridgeRequest::GetAuthStatus {
            return self.auth_status();
        }

        let Some(user_id) = self.authenticated_user() else {
            warn!("{} rejected: not authenticated", tag);
            return BridgeEnvelope::failure(CoordinatorError::NotAuthenticated.to_string());
        };

        match self.proxy(user_id, request).await {
            Ok(data) => BridgeEnvelope::ok(data),
            Err(e) => {
                warn!("{} failed: {}", tag, e);
                BridgeEnvelope::failure(e.to_string())
            }
        }
    }

    async fn proxy(
        &self,
        user_id: &str,
        request: BridgeRequest,
    ) -> Result<serde_json::Value, CoordinatorError> {
        match request {
            BridgeRequest::GetAuthStatus => Err(CoordinatorError::InvalidResponse(
                "auth status is answered locally".to_string(),
            )),
            BridgeRequest::SavePrompt { data } => {
                self.backend
                    .save_prompt(user_id, &data.prompt, &data.provider)
                    .await
            }
            BridgeRequest::GetContext { query } => {
                let contexts = self.backend.get_context(user_id, &query).await?;
                debug!("Backend returned {} context item(s)", contexts.len());
                serde_json::to_value(ContextPayload { contexts })
                    .map_err(|e| CoordinatorError::InvalidResponse(e.to_string()))
            }
            BridgeRequest::SaveResponse { data } => {
                self.backend
                    .save_response(user_id, &data.prompt, &data.response, &data.provider)
                    .await
            }
        }
    }

    fn authenticated_user(&self) -> Option<&str> {
        if self.identity.can_augment() {
            self.identity.user_id.as_deref()
        } else {
            None
        }
    }

    fn auth_status(&self) -> BridgeEnvelope {
        let status = AuthStatus {
            is_authenticated: self.identity.can_augment(),
            user: self.authenticated_user().map(|id| UserInfo { id: id.to_string() }),
        };
        match serde_json::to_value(status) {
            Ok(data) => BridgeEnvelope::ok(data),
            Err(e) => BridgeEnvelope::failure(e.to_string()),
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("identity", &self.identity)
            .field("backend", &self.backend.base_url())
            .finish()
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
