//! Host page protocol definitions.
//!
//! A [`PageDriver`] is the boundary with the provider's page: it finds
//! elements, reads and writes text, clicks, inserts the trigger control and
//! reports structural changes. Provider-specific knowledge lives in the
//! adapter, never here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::PageError;

/// Opaque reference to an element in the host page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where an input surface keeps its text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// `value` for form controls, text content otherwise.
    #[default]
    Auto,
    Value,
    TextContent,
}

impl TextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSource::Auto => "auto",
            TextSource::Value => "value",
            TextSource::TextContent => "text_content",
        }
    }
}

/// Appearance of the trigger control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub id: String,
    pub title: String,
    pub class_name: String,
}

impl Default for TriggerSpec {
    fn default() -> Self {
        Self {
            id: "memory-layer-btn".to_string(),
            title: "Memory Layer - Save & Enhance".to_string(),
            class_name: "memory-layer-button".to_string(),
        }
    }
}

/// Events raised by the page outside any request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// The user activated the trigger control.
    Clicked,
    /// The page navigated or reloaded; installed controls are gone.
    PageReloaded,
}

/// One batched structural-change notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub records: usize,
}

/// A live subscription to the page's structural-change stream.
///
/// Notifications stop once the subscription is passed back to
/// [`PageDriver::unsubscribe_mutations`] or the receiver is dropped.
#[derive(Debug)]
pub struct MutationSubscription {
    pub id: u64,
    pub receiver: mpsc::UnboundedReceiver<MutationBatch>,
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// First element matching any selector, tried in order.
    async fn query_first(&self, selectors: &[String]) -> Result<Option<ElementHandle>, PageError>;

    /// Every element matching the selector, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError>;

    /// Whether any selector matches.
    async fn exists(&self, selectors: &[String]) -> Result<bool, PageError> {
        Ok(self.query_first(selectors).await?.is_some())
    }

    async fn read_text(&self, element: &ElementHandle, source: TextSource)
        -> Result<String, PageError>;

    /// Replace the element's text and dispatch a bubbling `input` event so
    /// the page's own bindings observe the change.
    async fn write_text(
        &self,
        element: &ElementHandle,
        text: &str,
        source: TextSource,
    ) -> Result<(), PageError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError>;

    /// Insert the trigger control immediately before `anchor`.
    async fn install_trigger(
        &self,
        anchor: &ElementHandle,
        spec: &TriggerSpec,
    ) -> Result<ElementHandle, PageError>;

    /// Disable and dim (or restore) the trigger control.
    async fn set_trigger_enabled(&self, enabled: bool) -> Result<(), PageError>;

    /// Take the trigger event stream. Only one consumer may hold it.
    fn take_trigger_events(&self) -> Result<mpsc::UnboundedReceiver<TriggerEvent>, PageError>;

    /// Observe the whole document subtree for structural changes.
    async fn subscribe_mutations(&self) -> Result<MutationSubscription, PageError>;

    async fn unsubscribe_mutations(&self, id: u64) -> Result<(), PageError>;
}
