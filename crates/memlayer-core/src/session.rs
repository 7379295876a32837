//! Provider session runtime.
//!
//! One session serves one provider page: it resolves the Session Identity,
//! installs the trigger and runs an augmentation cycle per click. A page
//! reload starts everything over.

use std::sync::Arc;

use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use memlayer_protocols::{
    BackgroundBridge, CycleError, Notifier, PageDriver, ProviderAdapter, SessionIdentity,
    TriggerEvent, TriggerSpec,
};

use crate::capture::ResponseCapture;
use crate::injector::{RetryPolicy, UiInjector};
use crate::pipeline::{AugmentationPipeline, CycleReport};

/// Ask the coordinator who is signed in. Any failure counts as signed out.
pub async fn initialize_identity(bridge: &dyn BackgroundBridge) -> SessionIdentity {
    match bridge.get_auth_status().await {
        Ok(status) => {
            let identity = status.into_identity();
            match &identity.user_id {
                Some(user) if identity.is_authenticated => info!(user = %user, "Authenticated"),
                _ => warn!("Not authenticated"),
            }
            identity
        }
        Err(e) => {
            warn!("Auth check failed: {}", e);
            SessionIdentity::unauthenticated()
        }
    }
}

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub trigger: TriggerSpec,
    pub retry: RetryPolicy,
    pub auto_enhance: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            trigger: TriggerSpec::default(),
            retry: RetryPolicy::default(),
            auto_enhance: true,
        }
    }
}

pub struct ProviderSession {
    adapter: Arc<dyn ProviderAdapter>,
    page: Arc<dyn PageDriver>,
    bridge: Arc<dyn BackgroundBridge>,
    injector: UiInjector,
    pipeline: AugmentationPipeline,
}

impl ProviderSession {
    pub fn new(
        adapter: Arc<dyn ProviderAdapter>,
        page: Arc<dyn PageDriver>,
        bridge: Arc<dyn BackgroundBridge>,
        notifier: Arc<dyn Notifier>,
        options: SessionOptions,
    ) -> Self {
        let capture = ResponseCapture::new(
            adapter.clone(),
            page.clone(),
            bridge.clone(),
            notifier.clone(),
        );
        let pipeline = AugmentationPipeline::new(
            adapter.clone(),
            page.clone(),
            bridge.clone(),
            notifier,
            capture,
        )
        .with_auto_enhance(options.auto_enhance);
        let injector = UiInjector::new(adapter.clone(), page.clone(), options.trigger, options.retry);

        Self {
            adapter,
            page,
            bridge,
            injector,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &AugmentationPipeline {
        &self.pipeline
    }

    pub fn injector(&self) -> &UiInjector {
        &self.injector
    }

    /// Resolve identity, then wait for the provider UI and install the trigger.
    pub async fn initialize(&self) -> Result<SessionIdentity, CycleError> {
        info!(provider = %self.adapter.provider_id(), "Initializing provider session");
        let identity = initialize_identity(self.bridge.as_ref()).await;
        self.injector.install().await?;
        Ok(identity)
    }

    /// Serve trigger events until the page goes away.
    pub async fn run(&self) -> Result<(), CycleError> {
        let mut events = self.page.take_trigger_events()?;
        let mut identity = self.initialize().await?;

        while let Some(event) = events.recv().await {
            let mut reloaded = event == TriggerEvent::PageReloaded;

            if event == TriggerEvent::Clicked {
                if let Err(e) = self.handle_click(&identity).await {
                    debug!("Cycle ended without submitting: {}", e);
                }

                // Clicks queued while the cycle ran are stale.
                loop {
                    match events.try_recv() {
                        Ok(TriggerEvent::Clicked) => debug!("Ignoring click during active cycle"),
                        Ok(TriggerEvent::PageReloaded) => reloaded = true,
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => return Ok(()),
                    }
                }
            }

            if reloaded {
                info!("Page reloaded, re-initializing");
                self.pipeline.capture().supersede().await;
                identity = self.initialize().await?;
            }
        }

        info!("Trigger event stream closed, session ending");
        Ok(())
    }

    /// One trigger activation.
    pub async fn handle_click(
        &self,
        identity: &SessionIdentity,
    ) -> Result<CycleReport, CycleError> {
        debug!("Trigger clicked");
        self.pipeline.run_cycle(identity).await
    }
}
