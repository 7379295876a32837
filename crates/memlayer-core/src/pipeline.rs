//! Augmentation pipeline.
//!
//! One user-initiated cycle:
//!
//! ```text
//! Idle ─► Reading ─► Dispatching ─► Composing ─► Submitting ─► Armed
//!            │            │                          │
//!            └────────────┴──────────► Failed ◄──────┘
//! ```
//!
//! `save_prompt` and `get_context` are issued together and joined; the
//! cycle continues only once both have resolved. A rejected save ends the
//! cycle, a failed context lookup just means no augmentation.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use memlayer_protocols::{
    AugmentationRequest, BackgroundBridge, ContextBundle, CycleError, ElementHandle, Notice,
    Notifier, PageDriver, PendingCapture, ProviderAdapter, SessionIdentity,
};

use crate::capture::{CaptureTicket, ResponseCapture};
use crate::compose::compose_augmented;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Reading,
    Dispatching,
    Composing,
    Submitting,
    Armed,
    Failed,
}

/// Result of a cycle that reached `Armed`.
#[derive(Debug)]
pub struct CycleReport {
    pub request: AugmentationRequest,
    pub augmented_text: String,
    pub context_items: usize,
    pub ticket: CaptureTicket,
}

pub struct AugmentationPipeline {
    adapter: Arc<dyn ProviderAdapter>,
    page: Arc<dyn PageDriver>,
    bridge: Arc<dyn BackgroundBridge>,
    notifier: Arc<dyn Notifier>,
    capture: ResponseCapture,
    auto_enhance: bool,
    state: Mutex<CycleState>,
}

impl AugmentationPipeline {
    pub fn new(
        adapter: Arc<dyn ProviderAdapter>,
        page: Arc<dyn PageDriver>,
        bridge: Arc<dyn BackgroundBridge>,
        notifier: Arc<dyn Notifier>,
        capture: ResponseCapture,
    ) -> Self {
        Self {
            adapter,
            page,
            bridge,
            notifier,
            capture,
            auto_enhance: true,
            state: Mutex::new(CycleState::Idle),
        }
    }

    /// When disabled the prompt is still saved and the reply captured, but
    /// the message is submitted unaugmented.
    pub fn with_auto_enhance(mut self, enabled: bool) -> Self {
        self.auto_enhance = enabled;
        self
    }

    pub fn state(&self) -> CycleState {
        *self.state.lock()
    }

    pub fn capture(&self) -> &ResponseCapture {
        &self.capture
    }

    fn transition(&self, next: CycleState) {
        let mut state = self.state.lock();
        debug!("Cycle {:?} -> {:?}", *state, next);
        *state = next;
    }

    /// Run one cycle. The trigger control is disabled for its duration and
    /// failures are reported to the user before being returned.
    pub async fn run_cycle(&self, identity: &SessionIdentity) -> Result<CycleReport, CycleError> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("cycle", id = %cycle_id, provider = %self.adapter.provider_id());

        async {
            self.transition(CycleState::Reading);
            if let Err(e) = self.page.set_trigger_enabled(false).await {
                warn!("Could not disable trigger: {}", e);
            }

            let result = self.execute(identity).await;

            match &result {
                Ok(report) => {
                    info!(
                        context_items = report.context_items,
                        generation = report.ticket.generation(),
                        "Cycle armed"
                    );
                }
                Err(e) => {
                    self.transition(CycleState::Failed);
                    error!("Cycle failed: {}", e);
                    self.notifier.notify(Notice::error(e.user_message())).await;
                }
            }

            if let Err(e) = self.page.set_trigger_enabled(true).await {
                warn!("Could not re-enable trigger: {}", e);
            }
            if result.is_err() {
                self.transition(CycleState::Idle);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, identity: &SessionIdentity) -> Result<CycleReport, CycleError> {
        let (request, surface) = self.read(identity).await?;

        self.notifier.notify(Notice::progress("Processing...")).await;
        if self.capture.supersede().await {
            debug!("Discarded unresolved capture from the previous cycle");
        }

        self.transition(CycleState::Dispatching);
        let context = self.dispatch(&request).await?;

        self.transition(CycleState::Composing);
        let augmented_text = compose_augmented(request.original_text(), &context);

        self.transition(CycleState::Submitting);
        self.submit(&surface, &augmented_text).await?;

        // Notify before arming so the notice itself is not observed as a
        // change in the conversation.
        self.notifier.notify(Notice::success("Sent with memory!")).await;
        let ticket = self
            .capture
            .arm(PendingCapture::new(request.original_text()))
            .await?;
        self.transition(CycleState::Armed);

        Ok(CycleReport {
            context_items: context.len(),
            request,
            augmented_text,
            ticket,
        })
    }

    async fn read(
        &self,
        identity: &SessionIdentity,
    ) -> Result<(AugmentationRequest, ElementHandle), CycleError> {
        if !identity.can_augment() {
            return Err(CycleError::NotAuthenticated);
        }

        let surface = self
            .adapter
            .locate_input_surface()
            .await?
            .ok_or_else(|| CycleError::MissingUiElement("text input".to_string()))?;
        let text = self.adapter.extract_current_text(&surface).await?;
        let request = AugmentationRequest::new(&text, self.adapter.provider_id().clone())?;

        Ok((request, surface))
    }

    async fn dispatch(&self, request: &AugmentationRequest) -> Result<ContextBundle, CycleError> {
        let save = self
            .bridge
            .save_prompt(request.original_text(), request.provider_id());
        let context = async {
            if self.auto_enhance {
                self.bridge.get_context(request.original_text()).await
            } else {
                ContextBundle::empty()
            }
        };

        let (saved, context) = tokio::join!(save, context);
        saved?;
        info!(context_items = context.len(), "Prompt saved, context retrieved");
        Ok(context)
    }

    async fn submit(&self, surface: &ElementHandle, text: &str) -> Result<(), CycleError> {
        self.adapter.inject_text(surface, text).await?;
        let settle = self.adapter.settle_delay();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        let send = self
            .adapter
            .locate_send_control()
            .await?
            .ok_or_else(|| CycleError::MissingUiElement("send button".to_string()))?;
        self.page.click(&send).await?;
        Ok(())
    }
}
