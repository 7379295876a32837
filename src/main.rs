//! memlayer - Memory layer for hosted chat providers
//!
//! Main entry point for the memlayer CLI.

mod cli;
mod cmd_inspect;
mod cmd_run;

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use memlayer_config::{ConfigLoader, SettingsConfig};

use crate::cli::{Cli, Commands, ConfigAction};

fn init_tracing(settings: &SettingsConfig) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&settings.log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("memlayer")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&settings.log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The worker guard must outlive the subscriber.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let default_level = if settings.enable_logging { "info" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(ConfigLoader::default_path);

    match cli.command {
        Commands::Run { provider, cdp_endpoint } => {
            let config = ConfigLoader::load_or_default(&config_path)?;
            init_tracing(&config.settings)?;
            cmd_run::run_provider(config, &provider, cdp_endpoint).await
        }
        Commands::Providers => {
            let config = ConfigLoader::load_or_default(&config_path)?;
            cmd_inspect::list_providers(&config)
        }
        Commands::Config { action: ConfigAction::Check } => {
            cmd_inspect::check_config(&config_path)
        }
        Commands::Compose { context, text } => {
            cmd_inspect::compose(context, &text);
            Ok(())
        }
    }
}
