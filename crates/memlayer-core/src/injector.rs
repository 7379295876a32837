//! Trigger control installation.
//!
//! Provider UIs render asynchronously, so the injector polls: first for the
//! input surface, then for the send control, and finally inserts the
//! trigger immediately before the send control.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use memlayer_protocols::{
    CycleError, ElementHandle, PageDriver, PageError, ProviderAdapter, TriggerSpec,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectorState {
    WaitingForSurface,
    WaitingForControl,
    Installed,
}

/// Polling cadence and give-up policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    /// `None` retries for as long as the page lives.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn indefinite(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::indefinite(Duration::from_secs(1))
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    InputSurface,
    SendControl,
}

impl Target {
    fn describe(&self) -> &'static str {
        match self {
            Target::InputSurface => "text input",
            Target::SendControl => "send button",
        }
    }
}

pub struct UiInjector {
    adapter: Arc<dyn ProviderAdapter>,
    page: Arc<dyn PageDriver>,
    spec: TriggerSpec,
    policy: RetryPolicy,
    state: Mutex<InjectorState>,
}

impl UiInjector {
    pub fn new(
        adapter: Arc<dyn ProviderAdapter>,
        page: Arc<dyn PageDriver>,
        spec: TriggerSpec,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            adapter,
            page,
            spec,
            policy,
            state: Mutex::new(InjectorState::WaitingForSurface),
        }
    }

    pub fn state(&self) -> InjectorState {
        *self.state.lock()
    }

    /// Start over, e.g. after the page reloaded.
    pub fn reset(&self) {
        *self.state.lock() = InjectorState::WaitingForSurface;
    }

    /// Poll until the trigger is installed. Fails with
    /// [`CycleError::MissingUiElement`] only under a bounded policy.
    pub async fn install(&self) -> Result<ElementHandle, CycleError> {
        let provider = self.adapter.provider_id().clone();
        self.reset();

        self.poll(Target::InputSurface, &mut 0).await?;
        info!(provider = %provider, "Provider UI detected");
        *self.state.lock() = InjectorState::WaitingForControl;

        // Install failures count as send control attempts: the control can
        // re-render between lookup and insertion.
        let mut attempts = 0u32;
        loop {
            let send = self.poll(Target::SendControl, &mut attempts).await?;
            match self.page.install_trigger(&send, &self.spec).await {
                Ok(trigger) => {
                    *self.state.lock() = InjectorState::Installed;
                    info!(provider = %provider, trigger = %trigger.as_str(), "Trigger installed");
                    return Ok(trigger);
                }
                Err(e) => {
                    warn!(attempts, "Installing trigger failed: {}", e);
                    if self.policy.exhausted(attempts) {
                        return Err(CycleError::MissingUiElement(
                            Target::SendControl.describe().to_string(),
                        ));
                    }
                    tokio::time::sleep(self.policy.interval).await;
                }
            }
        }
    }

    async fn locate(&self, target: Target) -> Result<Option<ElementHandle>, PageError> {
        match target {
            Target::InputSurface => self.adapter.locate_input_surface().await,
            Target::SendControl => self.adapter.locate_send_control().await,
        }
    }

    /// Poll for `target`, counting lookups into `attempts`.
    async fn poll(&self, target: Target, attempts: &mut u32) -> Result<ElementHandle, CycleError> {
        let what = target.describe();
        loop {
            *attempts += 1;
            let attempt = *attempts;
            match self.locate(target).await {
                Ok(Some(element)) => return Ok(element),
                Ok(None) => debug!(attempt, "{} not found, retrying...", what),
                Err(e) => warn!(attempt, "Looking up {} failed: {}", what, e),
            }

            if self.policy.exhausted(attempt) {
                return Err(CycleError::MissingUiElement(what.to_string()));
            }
            tokio::time::sleep(self.policy.interval).await;
        }
    }
}
