//! Provider adapter driven by a selector profile.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use memlayer_config::ProviderProfile;
use memlayer_protocols::{
    ElementHandle, PageDriver, PageError, ProviderAdapter, ProviderId, TextSource,
};

/// Satisfies every adapter capability by querying the page with the
/// selectors of one [`ProviderProfile`].
pub struct SelectorAdapter {
    profile: ProviderProfile,
    page: Arc<dyn PageDriver>,
}

impl SelectorAdapter {
    pub fn new(profile: ProviderProfile, page: Arc<dyn PageDriver>) -> Self {
        Self { profile, page }
    }
}

#[async_trait]
impl ProviderAdapter for SelectorAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.profile.id
    }

    fn settle_delay(&self) -> Duration {
        self.profile.settle_delay()
    }

    async fn locate_input_surface(&self) -> Result<Option<ElementHandle>, PageError> {
        self.page.query_first(&self.profile.input_selectors).await
    }

    async fn extract_current_text(&self, surface: &ElementHandle) -> Result<String, PageError> {
        let raw = self
            .page
            .read_text(surface, self.profile.text_source)
            .await?;
        Ok(raw.trim().to_string())
    }

    async fn inject_text(&self, surface: &ElementHandle, text: &str) -> Result<(), PageError> {
        self.page
            .write_text(surface, text, self.profile.text_source)
            .await
    }

    async fn locate_send_control(&self) -> Result<Option<ElementHandle>, PageError> {
        self.page.query_first(&self.profile.send_selectors).await
    }

    async fn locate_message_stream(&self) -> Result<Vec<ElementHandle>, PageError> {
        if self.profile.message_selector.is_empty() {
            return Ok(Vec::new());
        }
        self.page.query_all(&self.profile.message_selector).await
    }

    async fn message_text(&self, message: &ElementHandle) -> Result<String, PageError> {
        self.page
            .read_text(message, TextSource::TextContent)
            .await
    }

    async fn is_generating(&self) -> Result<bool, PageError> {
        if self.profile.generating_selectors.is_empty() {
            return Ok(false);
        }
        self.page.exists(&self.profile.generating_selectors).await
    }
}
