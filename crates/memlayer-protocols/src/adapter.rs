//! Provider adapter protocol definitions.
//!
//! Providers differ only in which page structures satisfy these
//! capabilities; orchestration code is written against this trait alone.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PageError;
use crate::page::ElementHandle;
use crate::types::ProviderId;

/// Capability set implemented once per supported chat surface.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider_id(&self) -> &ProviderId;

    /// Delay between injecting text and activating the send control.
    fn settle_delay(&self) -> Duration;

    /// The text input, if it has rendered yet.
    async fn locate_input_surface(&self) -> Result<Option<ElementHandle>, PageError>;

    /// Current input text, trimmed. Empty means "no input".
    async fn extract_current_text(&self, surface: &ElementHandle) -> Result<String, PageError>;

    /// Replace the input's content so the provider's own bindings see it.
    async fn inject_text(&self, surface: &ElementHandle, text: &str) -> Result<(), PageError>;

    async fn locate_send_control(&self) -> Result<Option<ElementHandle>, PageError>;

    /// Message elements, most recent last. Empty is valid.
    async fn locate_message_stream(&self) -> Result<Vec<ElementHandle>, PageError>;

    async fn message_text(&self, message: &ElementHandle) -> Result<String, PageError>;

    /// True while the provider shows an in-progress/stop affordance.
    async fn is_generating(&self) -> Result<bool, PageError>;
}
