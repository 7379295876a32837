//! Response capture state machine.
//!
//! After submission the page streams the assistant's reply with no explicit
//! "done" signal. Completion is inferred on every structural-change
//! notification: the newest message has text and the provider no longer
//! shows its generating indicator.
//!
//! ```text
//! Idle ──arm──► Watching ──last message settled──► Captured
//!                  │
//!                  └──────arm / supersede─────────► Superseded
//! ```
//!
//! Only one capture is live at a time. Each armed capture carries a
//! generation number; the watcher claims the slot for its generation before
//! emitting, so a superseded or already-captured generation can never save.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use memlayer_protocols::{
    BackgroundBridge, BridgeError, CapturedResponse, MutationBatch, Notice, Notifier, PageDriver,
    PageError, PendingCapture, ProviderAdapter, SavedRecord,
};

/// Lifecycle of the most recent capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Watching,
    Captured,
    Superseded,
}

/// How an armed capture ended.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// The response was captured and handed to the bridge.
    Captured {
        response: CapturedResponse,
        saved: Result<SavedRecord, BridgeError>,
    },
    /// A newer capture replaced this one before completion.
    Superseded,
    /// The mutation stream closed before completion.
    Abandoned,
}

/// Handle to one armed capture.
#[derive(Debug)]
pub struct CaptureTicket {
    generation: u64,
    outcome: oneshot::Receiver<CaptureOutcome>,
}

impl CaptureTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the capture to end.
    pub async fn outcome(self) -> CaptureOutcome {
        self.outcome.await.unwrap_or(CaptureOutcome::Superseded)
    }
}

struct ActiveCapture {
    generation: u64,
    pending: PendingCapture,
    subscription_id: u64,
    task: Option<JoinHandle<()>>,
    outcome_tx: oneshot::Sender<CaptureOutcome>,
}

struct Slot {
    active: Option<ActiveCapture>,
    state: CaptureState,
}

enum Evaluation {
    /// This generation no longer owns the slot.
    Stale,
    Continue,
    Complete(String),
}

struct CaptureInner {
    adapter: Arc<dyn ProviderAdapter>,
    page: Arc<dyn PageDriver>,
    bridge: Arc<dyn BackgroundBridge>,
    notifier: Arc<dyn Notifier>,
    slot: Mutex<Slot>,
    next_generation: AtomicU64,
}

/// Owner of the single Pending Capture slot.
#[derive(Clone)]
pub struct ResponseCapture {
    inner: Arc<CaptureInner>,
}

impl ResponseCapture {
    pub fn new(
        adapter: Arc<dyn ProviderAdapter>,
        page: Arc<dyn PageDriver>,
        bridge: Arc<dyn BackgroundBridge>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(CaptureInner {
                adapter,
                page,
                bridge,
                notifier,
                slot: Mutex::new(Slot {
                    active: None,
                    state: CaptureState::Idle,
                }),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.inner.slot.lock().state
    }

    /// The live Pending Capture, if any.
    pub fn pending(&self) -> Option<PendingCapture> {
        self.inner
            .slot
            .lock()
            .active
            .as_ref()
            .map(|a| a.pending.clone())
    }

    /// Start watching for the response to `pending`, superseding any
    /// capture that is still watching.
    pub async fn arm(&self, pending: PendingCapture) -> Result<CaptureTicket, PageError> {
        self.supersede().await;

        let subscription = self.inner.page.subscribe_mutations().await?;
        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let displaced = {
            let mut slot = self.inner.slot.lock();
            let displaced = slot.active.take();
            slot.active = Some(ActiveCapture {
                generation,
                pending,
                subscription_id: subscription.id,
                task: None,
                outcome_tx,
            });
            slot.state = CaptureState::Watching;
            displaced
        };
        if let Some(prev) = displaced {
            let id = self.inner.retire(prev);
            self.inner.unsubscribe(id).await;
        }

        info!(generation, subscription = subscription.id, "Watching for response");

        let inner = self.inner.clone();
        let task = tokio::spawn(inner.watch(generation, subscription.receiver));

        let mut slot = self.inner.slot.lock();
        match slot.active.as_mut() {
            Some(active) if active.generation == generation => active.task = Some(task),
            // Already finished or replaced; the task ends on its own.
            _ => {}
        }

        Ok(CaptureTicket {
            generation,
            outcome: outcome_rx,
        })
    }

    /// Discard the live capture, if any. Returns whether one was discarded.
    pub async fn supersede(&self) -> bool {
        let prev = {
            let mut slot = self.inner.slot.lock();
            let prev = slot.active.take();
            if prev.is_some() {
                slot.state = CaptureState::Superseded;
            }
            prev
        };

        match prev {
            Some(prev) => {
                let id = self.inner.retire(prev);
                self.inner.unsubscribe(id).await;
                true
            }
            None => false,
        }
    }
}

impl CaptureInner {
    /// Stop a displaced capture. Returns its subscription id.
    fn retire(&self, prev: ActiveCapture) -> u64 {
        if let Some(task) = prev.task {
            task.abort();
        }
        let _ = prev.outcome_tx.send(CaptureOutcome::Superseded);
        info!(generation = prev.generation, "Pending capture superseded");
        prev.subscription_id
    }

    async fn unsubscribe(&self, id: u64) {
        if let Err(e) = self.page.unsubscribe_mutations(id).await {
            warn!(subscription = id, "Failed to unsubscribe mutations: {}", e);
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        matches!(&self.slot.lock().active, Some(a) if a.generation == generation)
    }

    async fn watch(
        self: Arc<Self>,
        generation: u64,
        mut receiver: mpsc::UnboundedReceiver<MutationBatch>,
    ) {
        while let Some(batch) = receiver.recv().await {
            trace!(generation, records = batch.records, "Mutation batch");
            match self.evaluate(generation).await {
                Evaluation::Stale => return,
                Evaluation::Continue => continue,
                Evaluation::Complete(text) => {
                    self.complete(generation, text).await;
                    return;
                }
            }
        }

        self.abandon(generation);
    }

    async fn evaluate(&self, generation: u64) -> Evaluation {
        if !self.is_current(generation) {
            return Evaluation::Stale;
        }

        let messages = match self.adapter.locate_message_stream().await {
            Ok(messages) => messages,
            Err(e) => {
                debug!("Message stream lookup failed: {}", e);
                return Evaluation::Continue;
            }
        };
        let Some(last) = messages.last() else {
            return Evaluation::Continue;
        };

        let text = match self.adapter.message_text(last).await {
            Ok(text) => text,
            Err(e) => {
                debug!("Reading latest message failed: {}", e);
                return Evaluation::Continue;
            }
        };
        let text = text.trim();
        if text.is_empty() {
            return Evaluation::Continue;
        }

        match self.adapter.is_generating().await {
            Ok(false) => Evaluation::Complete(text.to_string()),
            Ok(true) => Evaluation::Continue,
            Err(e) => {
                debug!("Generating probe failed: {}", e);
                Evaluation::Continue
            }
        }
    }

    async fn complete(&self, generation: u64, response_text: String) {
        let active = {
            let mut slot = self.slot.lock();
            match &slot.active {
                Some(a) if a.generation == generation => {
                    slot.state = CaptureState::Captured;
                    slot.active.take()
                }
                _ => None,
            }
        };
        let Some(active) = active else {
            debug!(generation, "Capture superseded during evaluation");
            return;
        };

        self.unsubscribe(active.subscription_id).await;

        let response = CapturedResponse {
            prompt: active.pending.original_text,
            response_text,
            provider_id: self.adapter.provider_id().clone(),
        };
        info!(
            generation,
            provider = %response.provider_id,
            chars = response.response_text.len(),
            "Response received"
        );

        let saved = self
            .bridge
            .save_response(&response.prompt, &response.response_text, &response.provider_id)
            .await;
        match &saved {
            Ok(_) => {
                info!(generation, "Response saved");
                self.notifier.notify(Notice::success("Memory saved!")).await;
            }
            Err(e) => {
                error!(generation, "Save response failed: {}", e);
                self.notifier.notify(Notice::error("Save failed")).await;
            }
        }

        let _ = active.outcome_tx.send(CaptureOutcome::Captured { response, saved });
    }

    fn abandon(&self, generation: u64) {
        let active = {
            let mut slot = self.slot.lock();
            match &slot.active {
                Some(a) if a.generation == generation => {
                    slot.state = CaptureState::Idle;
                    slot.active.take()
                }
                _ => None,
            }
        };
        if let Some(active) = active {
            warn!(generation, "Mutation stream closed before the response completed");
            let _ = active.outcome_tx.send(CaptureOutcome::Abandoned);
        }
    }
}
