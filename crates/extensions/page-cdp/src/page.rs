//! [`PageDriver`] and [`Notifier`] over a CDP page session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use memlayer_config::ProviderProfile;
use memlayer_protocols::{
    ElementHandle, MutationBatch, MutationSubscription, Notice, Notifier, PageDriver, PageError,
    TextSource, TriggerEvent, TriggerSpec,
};

use crate::cdp::{BindingCalled, CdpClient, CdpError, CdpResponse, PageSession};
use crate::script::{
    call_expression, decode_reply, MutationPayload, MUTATION_BINDING, PAGE_SCRIPT,
    TRIGGER_BINDING,
};

type Subscribers = Arc<Mutex<HashMap<u64, mpsc::UnboundedSender<MutationBatch>>>>;

/// Page events the driver cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageEvent {
    TriggerClicked,
    Mutation(MutationPayload),
    Loaded,
}

/// Classify a raw CDP event.
pub(crate) fn route_event(event: &CdpResponse) -> Option<PageEvent> {
    match event.method.as_deref()? {
        "Page.loadEventFired" => Some(PageEvent::Loaded),
        "Runtime.bindingCalled" => {
            let binding: BindingCalled = serde_json::from_value(event.params.clone()?).ok()?;
            match binding.name.as_str() {
                TRIGGER_BINDING => Some(PageEvent::TriggerClicked),
                MUTATION_BINDING => serde_json::from_str(&binding.payload)
                    .ok()
                    .map(PageEvent::Mutation),
                _ => None,
            }
        }
        _ => None,
    }
}

/// A provider tab driven over CDP.
pub struct CdpPage {
    session: Arc<PageSession>,
    notification_duration: Duration,
    trigger_rx: Mutex<Option<mpsc::UnboundedReceiver<TriggerEvent>>>,
    subscribers: Subscribers,
    next_subscription: AtomicU64,
    event_task: JoinHandle<()>,
}

impl CdpPage {
    /// Find the provider's tab and attach to it.
    pub async fn attach(
        client: &CdpClient,
        profile: &ProviderProfile,
        notification_duration: Duration,
    ) -> Result<Self, CdpError> {
        let info = client.find_page(&profile.url_patterns).await?;
        info!(provider = %profile.id, url = %info.url, "Attaching to provider tab");
        let session = client.attach_page(&info.id).await?;
        Self::new(session, notification_duration).await
    }

    /// Install bindings and the helper script, then start routing events.
    pub async fn new(
        session: PageSession,
        notification_duration: Duration,
    ) -> Result<Self, CdpError> {
        let events = session
            .take_events()
            .ok_or_else(|| CdpError::InvalidResponse("session events already taken".to_string()))?;

        session.add_binding(TRIGGER_BINDING).await?;
        session.add_binding(MUTATION_BINDING).await?;
        session.add_script_on_new_document(PAGE_SCRIPT).await?;
        session.evaluate(PAGE_SCRIPT).await?;
        debug!(target_id = %session.target_id(), "Page helper installed");

        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let subscribers: Subscribers = Arc::new(Mutex::new(HashMap::new()));
        let event_task = tokio::spawn(Self::event_loop(events, trigger_tx, subscribers.clone()));

        Ok(Self {
            session: Arc::new(session),
            notification_duration,
            trigger_rx: Mutex::new(Some(trigger_rx)),
            subscribers,
            next_subscription: AtomicU64::new(1),
            event_task,
        })
    }

    async fn event_loop(
        mut events: mpsc::UnboundedReceiver<CdpResponse>,
        trigger_tx: mpsc::UnboundedSender<TriggerEvent>,
        subscribers: Subscribers,
    ) {
        while let Some(event) = events.recv().await {
            match route_event(&event) {
                Some(PageEvent::TriggerClicked) => {
                    let _ = trigger_tx.send(TriggerEvent::Clicked);
                }
                Some(PageEvent::Mutation(payload)) => {
                    trace!(subscription = payload.id, records = payload.records, "Mutation batch");
                    let subscribers = subscribers.lock();
                    if let Some(tx) = subscribers.get(&payload.id) {
                        let _ = tx.send(MutationBatch {
                            records: payload.records,
                        });
                    }
                }
                Some(PageEvent::Loaded) => {
                    info!("Provider page loaded");
                    // Observers died with the old document.
                    subscribers.lock().clear();
                    let _ = trigger_tx.send(TriggerEvent::PageReloaded);
                }
                None => {}
            }
        }
        debug!("Page event stream closed");
        subscribers.lock().clear();
    }

    async fn invoke(
        &self,
        method: &str,
        args: &[Value],
        element: Option<&ElementHandle>,
    ) -> Result<Value, PageError> {
        let reply = self
            .session
            .evaluate(&call_expression(method, args))
            .await?;
        decode_reply(reply, element.map(ElementHandle::as_str))
    }
}

impl Drop for CdpPage {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

fn handle_from(value: Value) -> Result<Option<ElementHandle>, PageError> {
    match value {
        Value::Null => Ok(None),
        Value::String(id) => Ok(Some(ElementHandle::new(id))),
        other => Err(PageError::Script(format!("expected element id, got {}", other))),
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn query_first(&self, selectors: &[String]) -> Result<Option<ElementHandle>, PageError> {
        let value = self.invoke("queryFirst", &[json!(selectors)], None).await?;
        handle_from(value)
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        let value = self.invoke("queryAll", &[json!(selector)], None).await?;
        serde_json::from_value::<Vec<String>>(value)
            .map(|ids| ids.into_iter().map(ElementHandle::new).collect())
            .map_err(|e| PageError::Script(format!("expected element ids: {}", e)))
    }

    async fn read_text(
        &self,
        element: &ElementHandle,
        source: TextSource,
    ) -> Result<String, PageError> {
        let value = self
            .invoke(
                "readText",
                &[json!(element.as_str()), json!(source.as_str())],
                Some(element),
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn write_text(
        &self,
        element: &ElementHandle,
        text: &str,
        source: TextSource,
    ) -> Result<(), PageError> {
        self.invoke(
            "writeText",
            &[json!(element.as_str()), json!(text), json!(source.as_str())],
            Some(element),
        )
        .await?;
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.invoke("click", &[json!(element.as_str())], Some(element))
            .await?;
        Ok(())
    }

    async fn install_trigger(
        &self,
        anchor: &ElementHandle,
        spec: &TriggerSpec,
    ) -> Result<ElementHandle, PageError> {
        let spec = serde_json::to_value(spec)
            .map_err(|e| PageError::Script(e.to_string()))?;
        let value = self
            .invoke("installTrigger", &[json!(anchor.as_str()), spec], Some(anchor))
            .await?;
        handle_from(value)?
            .ok_or_else(|| PageError::Script("trigger was not created".to_string()))
    }

    async fn set_trigger_enabled(&self, enabled: bool) -> Result<(), PageError> {
        let applied = self
            .invoke("setTriggerEnabled", &[json!(enabled)], None)
            .await?;
        if applied != Value::Bool(true) {
            warn!("Trigger not present, cannot set enabled={}", enabled);
        }
        Ok(())
    }

    fn take_trigger_events(&self) -> Result<mpsc::UnboundedReceiver<TriggerEvent>, PageError> {
        self.trigger_rx
            .lock()
            .take()
            .ok_or(PageError::TriggerEventsTaken)
    }

    async fn subscribe_mutations(&self) -> Result<MutationSubscription, PageError> {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        let (tx, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().insert(id, tx);

        if let Err(e) = self.invoke("observe", &[json!(id)], None).await {
            self.subscribers.lock().remove(&id);
            return Err(e);
        }
        debug!(subscription = id, "Observing page mutations");
        Ok(MutationSubscription { id, receiver })
    }

    async fn unsubscribe_mutations(&self, id: u64) -> Result<(), PageError> {
        self.subscribers.lock().remove(&id);
        self.invoke("disconnect", &[json!(id)], None).await?;
        debug!(subscription = id, "Stopped observing page mutations");
        Ok(())
    }
}

/// Milliseconds for the page timer, saturating at `u64::MAX`.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl Notifier for CdpPage {
    async fn notify(&self, notice: Notice) {
        let args = [
            json!(notice.display_text()),
            json!(duration_ms(self.notification_duration)),
        ];
        if let Err(e) = self.invoke("notify", &args, None).await {
            debug!("Notification not shown: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;
