//! Data model shared by every memlayer component.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CycleError;

/// Identifier of a supported chat surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderId {
    Claude,
    Grok,
    /// A provider contributed purely through configuration.
    Other(String),
}

impl ProviderId {
    pub fn as_str(&self) -> &str {
        match self {
            ProviderId::Claude => "claude",
            ProviderId::Grok => "grok",
            ProviderId::Other(id) => id,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "claude" => ProviderId::Claude,
            "grok" => ProviderId::Grok,
            other => ProviderId::Other(other.to_string()),
        })
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

impl Serialize for ProviderId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ProviderId::from(raw.as_str()))
    }
}

/// Who is using the page, as reported by the coordinator.
///
/// Set once when a provider session initializes and never refreshed
/// until the page is reloaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: Option<String>,
    pub is_authenticated: bool,
}

impl SessionIdentity {
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_authenticated: true,
        }
    }

    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// Whether an augmentation cycle may proceed.
    pub fn can_augment(&self) -> bool {
        self.is_authenticated && self.user_id.is_some()
    }
}

/// A user message captured from the live input surface at trigger time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentationRequest {
    original_text: String,
    provider_id: ProviderId,
}

impl AugmentationRequest {
    /// Capture the request; whitespace-only input is rejected.
    pub fn new(text: &str, provider_id: ProviderId) -> Result<Self, CycleError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CycleError::EmptyInput);
        }
        Ok(Self {
            original_text: trimmed.to_string(),
            provider_id,
        })
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn provider_id(&self) -> &ProviderId {
        &self.provider_id
    }
}

/// Ordered prior-knowledge snippets for one request. Empty means no
/// augmentation is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextBundle(Vec<String>);

impl ContextBundle {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for ContextBundle {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

impl<'a> From<Vec<&'a str>> for ContextBundle {
    fn from(items: Vec<&'a str>) -> Self {
        Self(items.into_iter().map(str::to_string).collect())
    }
}

/// The in-flight record awaiting the assistant's completed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCapture {
    /// The user's text before augmentation.
    pub original_text: String,
    pub armed_at: DateTime<Utc>,
}

impl PendingCapture {
    pub fn new(original_text: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            armed_at: Utc::now(),
        }
    }
}

/// The assistant reply paired with the prompt that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub prompt: String,
    pub response_text: String,
    pub provider_id: ProviderId,
}

/// Opaque descriptor of a record stored by the persistence backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedRecord(pub serde_json::Value);
