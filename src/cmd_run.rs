//! `memlayer run`: coordinator, provider tab and session wiring.

use std::sync::Arc;

use tracing::{error, info, warn};

use memlayer_config::{Config, ConfigValidator, UiConfig};
use memlayer_coordinator::Coordinator;
use memlayer_core::{ChannelBridge, ProviderSession, RetryPolicy, SelectorAdapter, SessionOptions};
use memlayer_page_cdp::{CdpClient, CdpPage};

/// Pending bridge calls buffered between the page side and the coordinator.
const BRIDGE_CAPACITY: usize = 32;

/// Attach to the provider's tab and serve trigger clicks until the tab
/// goes away or the process is interrupted.
pub(crate) async fn run_provider(
    config: Config,
    provider: &str,
    cdp_endpoint: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting memlayer v{}", env!("CARGO_PKG_VERSION"));

    let profile = config.resolve_provider(provider)?;

    let validation = ConfigValidator::validate(&config)?;
    for warning in &validation.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    if !validation.is_valid() {
        for err in &validation.errors {
            error!(path = %err.path, "{}", err.message);
        }
        return Err(format!("{} configuration error(s)", validation.errors.len()).into());
    }

    let coordinator = Arc::new(Coordinator::from_config(&config)?);
    let (bridge, rx) = ChannelBridge::new(BRIDGE_CAPACITY, config.ui.bridge_timeout());
    let coordinator_task = coordinator.clone().spawn(rx);
    if let Some(user) = &coordinator.identity().user_id {
        info!(user = %user, "Serving bridge calls");
    }

    let endpoint = cdp_endpoint.unwrap_or_else(|| config.browser.cdp_endpoint.clone());
    let client = CdpClient::connect(&endpoint).await?;
    let page = Arc::new(
        CdpPage::attach(&client, &profile, config.ui.notification_duration()).await?,
    );

    let adapter = Arc::new(SelectorAdapter::new(profile, page.clone()));
    let options = SessionOptions {
        retry: retry_policy(&config.ui),
        auto_enhance: config.settings.auto_enhance,
        ..SessionOptions::default()
    };
    let session = ProviderSession::new(adapter, page.clone(), Arc::new(bridge), page, options);

    let result = tokio::select! {
        result = session.run() => {
            info!("Provider tab detached");
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    };

    coordinator_task.abort();
    result?;
    Ok(())
}

fn retry_policy(ui: &UiConfig) -> RetryPolicy {
    match ui.max_poll_attempts {
        Some(attempts) => RetryPolicy::bounded(ui.poll_interval(), attempts),
        None => RetryPolicy::indefinite(ui.poll_interval()),
    }
}
