//! Background bridge client over a tokio channel.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use memlayer_protocols::{
    AuthStatus, BackgroundBridge, BridgeCall, BridgeEnvelope, BridgeError, BridgeRequest,
    ContextBundle, ContextPayload, ProviderId, SavedRecord,
};

/// Sends typed requests to the coordinator and waits for its envelope.
///
/// A closed channel, a dropped reply or a reply slower than `timeout`
/// surface as [`BridgeError::Communication`].
#[derive(Clone)]
pub struct ChannelBridge {
    tx: mpsc::Sender<BridgeCall>,
    timeout: Duration,
}

impl ChannelBridge {
    /// Create a bridge together with the receiving end for the coordinator.
    pub fn new(capacity: usize, timeout: Duration) -> (Self, mpsc::Receiver<BridgeCall>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, timeout }, rx)
    }

    pub fn from_sender(tx: mpsc::Sender<BridgeCall>, timeout: Duration) -> Self {
        Self { tx, timeout }
    }

    async fn send(&self, request: BridgeRequest) -> Result<BridgeEnvelope, BridgeError> {
        let tag = request.type_tag();
        let (reply_tx, reply_rx) = oneshot::channel();
        trace!("Bridge send: {}", tag);

        self.tx
            .send(BridgeCall {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| BridgeError::Communication("coordinator unreachable".to_string()))?;

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(envelope)) => Ok(envelope),
            Ok(Err(_)) => Err(BridgeError::Communication(format!(
                "{} dropped without a reply",
                tag
            ))),
            Err(_) => Err(BridgeError::Communication(format!("{} timed out", tag))),
        }
    }
}

#[async_trait]
impl BackgroundBridge for ChannelBridge {
    async fn get_auth_status(&self) -> Result<AuthStatus, BridgeError> {
        let data = self
            .send(BridgeRequest::GetAuthStatus)
            .await?
            .into_result("Auth check failed")?;
        serde_json::from_value(data)
            .map_err(|e| BridgeError::Communication(format!("Invalid auth payload: {}", e)))
    }

    async fn save_prompt(
        &self,
        text: &str,
        provider: &ProviderId,
    ) -> Result<SavedRecord, BridgeError> {
        let data = self
            .send(BridgeRequest::save_prompt(text, provider.clone()))
            .await?
            .into_result("Save prompt failed")?;
        Ok(SavedRecord(data))
    }

    async fn get_context(&self, query: &str) -> ContextBundle {
        let envelope = match self.send(BridgeRequest::get_context(query)).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Context retrieval failed: {}", e);
                return ContextBundle::empty();
            }
        };

        let data = match envelope.into_result("Context retrieval failed") {
            Ok(data) => data,
            Err(e) => {
                warn!("Context retrieval rejected: {}", e);
                return ContextBundle::empty();
            }
        };

        match serde_json::from_value::<ContextPayload>(data) {
            Ok(payload) => {
                debug!("Retrieved {} context item(s)", payload.contexts.len());
                ContextBundle::new(payload.contexts)
            }
            Err(e) => {
                warn!("Invalid context payload: {}", e);
                ContextBundle::empty()
            }
        }
    }

    async fn save_response(
        &self,
        prompt: &str,
        response_text: &str,
        provider: &ProviderId,
    ) -> Result<SavedRecord, BridgeError> {
        let data = self
            .send(BridgeRequest::save_response(
                prompt,
                response_text,
                provider.clone(),
            ))
            .await?
            .into_result("Save response failed")?;
        Ok(SavedRecord(data))
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
