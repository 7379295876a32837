//! Inspection subcommands: providers, config check and compose.

use std::path::Path;

use memlayer_config::{Config, ConfigError, ConfigLoader, ConfigValidator};
use memlayer_core::compose_augmented;
use memlayer_protocols::{ContextBundle, ProviderId};

/// List every provider profile the configuration resolves.
pub(crate) fn list_providers(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{:<12} {:<10} {}", "PROVIDER", "SOURCE", "URL PATTERNS");
    for id in config.provider_ids() {
        let profile = config.resolve_provider(&id)?;
        let overridden = config
            .providers
            .keys()
            .any(|key| ProviderId::from(key.as_str()) == profile.id);
        let source = if overridden {
            "config"
        } else {
            "builtin"
        };
        println!(
            "{:<12} {:<10} {}",
            profile.id,
            source,
            profile.url_patterns.join(", ")
        );
    }
    Ok(())
}

/// Load and validate the configuration at `path`.
pub(crate) fn check_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = match ConfigLoader::load(path) {
        Ok(config) => {
            println!("Loaded {}", path.display());
            config
        }
        Err(ConfigError::NotFound(_)) => {
            println!("No config at {}, checking defaults", path.display());
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    let result = ConfigValidator::validate(&config)?;
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for err in &result.errors {
        println!("error: {}: {}", err.path, err.message);
    }

    if result.is_valid() {
        println!("Configuration OK");
        Ok(())
    } else {
        Err(format!("{} configuration error(s)", result.errors.len()).into())
    }
}

/// Print the text that would be submitted for `text` given `context`.
pub(crate) fn compose(context: Vec<String>, text: &str) {
    println!("{}", compose_augmented(text.trim(), &ContextBundle::new(context)));
}
