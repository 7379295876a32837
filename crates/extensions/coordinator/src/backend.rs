//! HTTP client for the persistence backend.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use memlayer_config::{BackendConfig, EndpointsConfig};
use memlayer_protocols::{ContextPayload, ProviderId};

use crate::error::CoordinatorError;

#[derive(Debug, Serialize)]
struct SavePromptBody<'a> {
    user_id: &'a str,
    prompt: &'a str,
    provider: &'a str,
}

#[derive(Debug, Serialize)]
struct SaveResponseBody<'a> {
    user_id: &'a str,
    prompt: &'a str,
    response: &'a str,
    provider: &'a str,
}

#[derive(Debug, Serialize)]
struct ContextQueryBody<'a> {
    user_id: &'a str,
    query: &'a str,
    limit: usize,
}

/// Persistence backend client.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    endpoints: EndpointsConfig,
    access_token: Option<String>,
    context_limit: usize,
}

impl BackendClient {
    pub fn new(
        config: &BackendConfig,
        access_token: Option<String>,
        context_limit: usize,
    ) -> Result<Self, CoordinatorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
            access_token,
            context_limit,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn save_prompt(
        &self,
        user_id: &str,
        prompt: &str,
        provider: &ProviderId,
    ) -> Result<serde_json::Value, CoordinatorError> {
        let body = SavePromptBody {
            user_id,
            prompt,
            provider: provider.as_str(),
        };
        self.post(&self.endpoints.save_prompt, &body).await
    }

    pub async fn save_response(
        &self,
        user_id: &str,
        prompt: &str,
        response: &str,
        provider: &ProviderId,
    ) -> Result<serde_json::Value, CoordinatorError> {
        let body = SaveResponseBody {
            user_id,
            prompt,
            response,
            provider: provider.as_str(),
        };
        self.post(&self.endpoints.save_response, &body).await
    }

    /// Up to `context_limit` context items, most relevant first.
    pub async fn get_context(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<String>, CoordinatorError> {
        let body = ContextQueryBody {
            user_id,
            query,
            limit: self.context_limit,
        };
        let value = self.post(&self.endpoints.get_context, &body).await?;
        let mut payload: ContextPayload = serde_json::from_value(value)
            .map_err(|e| CoordinatorError::InvalidResponse(e.to_string()))?;
        payload.contexts.truncate(self.context_limit);
        Ok(payload.contexts)
    }

    async fn post<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<serde_json::Value, CoordinatorError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CoordinatorError::from_backend_response(status, body));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| CoordinatorError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
