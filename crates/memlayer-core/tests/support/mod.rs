//! In-memory page, bridge and notifier used by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::mpsc;

use memlayer_config::ProviderProfile;
use memlayer_core::{AugmentationPipeline, ResponseCapture, SelectorAdapter};
use memlayer_protocols::{
    AuthStatus, BackgroundBridge, BridgeError, ContextBundle, ElementHandle, MutationBatch,
    MutationSubscription, Notice, NoticeLevel, Notifier, PageDriver, PageError, ProviderAdapter,
    ProviderId, SavedRecord, TextSource, TriggerEvent, TriggerSpec, UserInfo,
};

// ============================================================================
// Fake page
// ============================================================================

#[derive(Default)]
pub struct PageState {
    /// `None` while the input surface is not rendered.
    pub input: Option<String>,
    pub send_present: bool,
    pub messages: Vec<String>,
    pub generating: bool,
    /// Input contents at each send click.
    pub submitted: Vec<String>,
    pub clicks: Vec<String>,
    pub trigger: Option<TriggerSpec>,
    pub trigger_enabled: bool,
    pub enable_history: Vec<bool>,
    pub install_count: usize,
    /// Installs that fail as if the send button re-rendered mid-insert.
    pub failing_installs: usize,
    pub subscribers: HashMap<u64, mpsc::UnboundedSender<MutationBatch>>,
    pub next_subscription: u64,
    pub unsubscribed: Vec<u64>,
}

/// Understands the selectors of [`test_profile`].
pub struct FakePage {
    pub state: Mutex<PageState>,
    trigger_tx: mpsc::UnboundedSender<TriggerEvent>,
    trigger_rx: Mutex<Option<mpsc::UnboundedReceiver<TriggerEvent>>>,
}

impl FakePage {
    /// A page with the input surface and send control already rendered.
    pub fn ready() -> Arc<Self> {
        let page = Self::blank();
        {
            let mut state = page.state.lock();
            state.input = Some(String::new());
            state.send_present = true;
        }
        page
    }

    /// A page whose provider UI has not rendered yet.
    pub fn blank() -> Arc<Self> {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            state: Mutex::new(PageState::default()),
            trigger_tx,
            trigger_rx: Mutex::new(Some(trigger_rx)),
        })
    }

    pub fn type_text(&self, text: &str) {
        self.state.lock().input = Some(text.to_string());
    }

    pub fn input_text(&self) -> Option<String> {
        self.state.lock().input.clone()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.state.lock().submitted.clone()
    }

    pub fn set_generating(&self, generating: bool) {
        self.state.lock().generating = generating;
    }

    pub fn push_message(&self, text: &str) {
        self.state.lock().messages.push(text.to_string());
    }

    /// Replace the newest message, as streaming does.
    pub fn update_last_message(&self, text: &str) {
        let mut state = self.state.lock();
        match state.messages.last_mut() {
            Some(last) => *last = text.to_string(),
            None => state.messages.push(text.to_string()),
        }
    }

    /// Deliver one structural-change notification to every subscriber.
    pub fn mutate(&self) {
        let state = self.state.lock();
        for tx in state.subscribers.values() {
            let _ = tx.send(MutationBatch { records: 1 });
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    pub fn fire(&self, event: TriggerEvent) {
        let _ = self.trigger_tx.send(event);
    }

    /// Simulate a reload: the DOM is gone until re-rendered.
    pub fn reload(&self) {
        {
            let mut state = self.state.lock();
            state.trigger = None;
            state.subscribers.clear();
        }
        self.fire(TriggerEvent::PageReloaded);
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn query_first(&self, selectors: &[String]) -> Result<Option<ElementHandle>, PageError> {
        let state = self.state.lock();
        for selector in selectors {
            let found = match selector.as_str() {
                "#input" => state.input.is_some(),
                "#send" => state.send_present,
                "#stop" => state.generating,
                _ => false,
            };
            if found {
                return Ok(Some(ElementHandle::new(selector.trim_start_matches('#'))));
            }
        }
        Ok(None)
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        if selector != ".msg" {
            return Ok(Vec::new());
        }
        let state = self.state.lock();
        Ok((0..state.messages.len())
            .map(|i| ElementHandle::new(format!("msg-{}", i)))
            .collect())
    }

    async fn read_text(
        &self,
        element: &ElementHandle,
        _source: TextSource,
    ) -> Result<String, PageError> {
        let state = self.state.lock();
        let id = element.as_str();
        if id == "input" {
            return state
                .input
                .clone()
                .ok_or_else(|| PageError::StaleElement(id.to_string()));
        }
        id.strip_prefix("msg-")
            .and_then(|i| i.parse::<usize>().ok())
            .and_then(|i| state.messages.get(i).cloned())
            .ok_or_else(|| PageError::StaleElement(id.to_string()))
    }

    async fn write_text(
        &self,
        element: &ElementHandle,
        text: &str,
        _source: TextSource,
    ) -> Result<(), PageError> {
        let mut state = self.state.lock();
        match (element.as_str(), state.input.as_mut()) {
            ("input", Some(input)) => {
                *input = text.to_string();
                Ok(())
            }
            (id, _) => Err(PageError::StaleElement(id.to_string())),
        }
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        let mut state = self.state.lock();
        state.clicks.push(element.as_str().to_string());
        if element.as_str() == "send" {
            let sent = state.input.replace(String::new()).unwrap_or_default();
            state.submitted.push(sent);
        }
        Ok(())
    }

    async fn install_trigger(
        &self,
        anchor: &ElementHandle,
        spec: &TriggerSpec,
    ) -> Result<ElementHandle, PageError> {
        if anchor.as_str() != "send" {
            return Err(PageError::StaleElement(anchor.as_str().to_string()));
        }
        let mut state = self.state.lock();
        if state.failing_installs > 0 {
            state.failing_installs -= 1;
            return Err(PageError::StaleElement(anchor.as_str().to_string()));
        }
        state.trigger = Some(spec.clone());
        state.trigger_enabled = true;
        state.install_count += 1;
        Ok(ElementHandle::new(spec.id.clone()))
    }

    async fn set_trigger_enabled(&self, enabled: bool) -> Result<(), PageError> {
        let mut state = self.state.lock();
        state.trigger_enabled = enabled;
        state.enable_history.push(enabled);
        Ok(())
    }

    fn take_trigger_events(&self) -> Result<mpsc::UnboundedReceiver<TriggerEvent>, PageError> {
        self.trigger_rx
            .lock()
            .take()
            .ok_or(PageError::TriggerEventsTaken)
    }

    async fn subscribe_mutations(&self) -> Result<MutationSubscription, PageError> {
        let (tx, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.lock();
        state.next_subscription += 1;
        let id = state.next_subscription;
        state.subscribers.insert(id, tx);
        Ok(MutationSubscription { id, receiver })
    }

    async fn unsubscribe_mutations(&self, id: u64) -> Result<(), PageError> {
        let mut state = self.state.lock();
        state.subscribers.remove(&id);
        state.unsubscribed.push(id);
        Ok(())
    }
}

// ============================================================================
// Recording bridge
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeLog {
    AuthStatus,
    SavePrompt { prompt: String, provider: String },
    GetContext { query: String },
    SaveResponse { prompt: String, response: String, provider: String },
}

pub struct RecordingBridge {
    pub calls: Mutex<Vec<BridgeLog>>,
    pub user: Mutex<Option<String>>,
    pub contexts: Mutex<Vec<String>>,
    pub reject_prompt: Mutex<Option<BridgeError>>,
    pub reject_response: Mutex<Option<BridgeError>>,
    pub auth_error: Mutex<Option<BridgeError>>,
}

impl RecordingBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            user: Mutex::new(Some("u-1".to_string())),
            contexts: Mutex::new(Vec::new()),
            reject_prompt: Mutex::new(None),
            reject_response: Mutex::new(None),
            auth_error: Mutex::new(None),
        })
    }

    pub fn with_contexts(self: Arc<Self>, items: &[&str]) -> Arc<Self> {
        *self.contexts.lock() = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<BridgeLog> {
        self.calls.lock().clone()
    }

    pub fn saved_responses(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                BridgeLog::SaveResponse { prompt, response, .. } => {
                    Some((prompt.clone(), response.clone()))
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BackgroundBridge for RecordingBridge {
    async fn get_auth_status(&self) -> Result<AuthStatus, BridgeError> {
        self.calls.lock().push(BridgeLog::AuthStatus);
        if let Some(e) = self.auth_error.lock().clone() {
            return Err(e);
        }
        let user = self.user.lock().clone();
        Ok(AuthStatus {
            is_authenticated: user.is_some(),
            user: user.map(|id| UserInfo { id }),
        })
    }

    async fn save_prompt(
        &self,
        prompt: &str,
        provider: &ProviderId,
    ) -> Result<SavedRecord, BridgeError> {
        self.calls.lock().push(BridgeLog::SavePrompt {
            prompt: prompt.to_string(),
            provider: provider.to_string(),
        });
        tokio::task::yield_now().await;
        match self.reject_prompt.lock().clone() {
            Some(e) => Err(e),
            None => Ok(SavedRecord(json!({"prompt": prompt}))),
        }
    }

    async fn get_context(&self, query: &str) -> ContextBundle {
        self.calls.lock().push(BridgeLog::GetContext {
            query: query.to_string(),
        });
        tokio::task::yield_now().await;
        ContextBundle::new(self.contexts.lock().clone())
    }

    async fn save_response(
        &self,
        prompt: &str,
        response: &str,
        provider: &ProviderId,
    ) -> Result<SavedRecord, BridgeError> {
        self.calls.lock().push(BridgeLog::SaveResponse {
            prompt: prompt.to_string(),
            response: response.to_string(),
            provider: provider.to_string(),
        });
        match self.reject_response.lock().clone() {
            Some(e) => Err(e),
            None => Ok(SavedRecord(json!({"response": response}))),
        }
    }
}

// ============================================================================
// Recording notifier
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
    /// Page whose subscribers see every notice, as a notification element
    /// appended to the document would.
    pub renders_on: Mutex<Option<Arc<FakePage>>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rendering_on(page: &Arc<FakePage>) -> Arc<Self> {
        let notifier = Self::new();
        *notifier.renders_on.lock() = Some(page.clone());
        notifier
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices.lock().iter().map(|n| n.message.clone()).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
        let page = self.renders_on.lock().clone();
        if let Some(page) = page {
            page.mutate();
        }
    }
}

// ============================================================================
// Wiring
// ============================================================================

pub fn test_profile() -> ProviderProfile {
    let mut profile = ProviderProfile::empty(ProviderId::Claude);
    profile.url_patterns = vec!["claude.ai".to_string()];
    profile.input_selectors = vec!["#missing".to_string(), "#input".to_string()];
    profile.send_selectors = vec!["#send".to_string()];
    profile.message_selector = ".msg".to_string();
    profile.generating_selectors = vec!["#stop".to_string()];
    profile.settle_delay_ms = 0;
    profile
}

pub fn adapter_for(page: &Arc<FakePage>) -> Arc<dyn ProviderAdapter> {
    Arc::new(SelectorAdapter::new(test_profile(), page.clone()))
}

pub struct Harness {
    pub page: Arc<FakePage>,
    pub bridge: Arc<RecordingBridge>,
    pub notifier: Arc<RecordingNotifier>,
    pub adapter: Arc<dyn ProviderAdapter>,
}

impl Harness {
    pub fn new(page: Arc<FakePage>, bridge: Arc<RecordingBridge>) -> Self {
        Self::with_notifier(page, bridge, RecordingNotifier::new())
    }

    pub fn with_notifier(
        page: Arc<FakePage>,
        bridge: Arc<RecordingBridge>,
        notifier: Arc<RecordingNotifier>,
    ) -> Self {
        let adapter = adapter_for(&page);
        Self {
            page,
            bridge,
            notifier,
            adapter,
        }
    }

    pub fn capture(&self) -> ResponseCapture {
        ResponseCapture::new(
            self.adapter.clone(),
            self.page.clone(),
            self.bridge.clone(),
            self.notifier.clone(),
        )
    }

    pub fn pipeline(&self) -> AugmentationPipeline {
        AugmentationPipeline::new(
            self.adapter.clone(),
            self.page.clone(),
            self.bridge.clone(),
            self.notifier.clone(),
            self.capture(),
        )
    }
}

/// Let spawned watcher tasks drain their queues.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
