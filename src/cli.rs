//! CLI definitions for memlayer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// memlayer CLI.
#[derive(Parser)]
#[command(name = "memlayer")]
#[command(about = "Memory layer for hosted chat providers")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.memlayer/config.toml)
    #[arg(short, long, global = true, env = "MEMLAYER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Attach to a provider tab and serve the memory trigger
    Run {
        /// Provider id (e.g. claude, grok)
        #[arg(short, long)]
        provider: String,

        /// Chrome remote debugging endpoint, overrides [browser].cdp_endpoint
        #[arg(long)]
        cdp_endpoint: Option<String>,
    },

    /// List configured provider profiles
    Providers,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print the augmented text for a message and context items
    Compose {
        /// Context item (repeatable)
        #[arg(short = 'x', long = "context")]
        context: Vec<String>,

        /// The message as typed
        text: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Load and validate the configuration file
    Check,
}
