//! Configuration schema definitions.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use memlayer_protocols::{ProviderId, SessionIdentity, TextSource};

use crate::error::ConfigError;
use crate::providers::builtin_profiles;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub ui: UiConfig,

    /// Per-provider overrides layered on top of the built-in profiles.
    #[serde(default)]
    pub providers: HashMap<String, ProviderOverride>,
}

impl Config {
    /// Built-in profile for `id` with any configured override applied.
    pub fn resolve_provider(&self, id: &str) -> Result<ProviderProfile, ConfigError> {
        let provider_id = ProviderId::from(id);
        let builtin = builtin_profiles()
            .into_iter()
            .find(|p| p.id == provider_id);
        let overrides = self.providers.get(provider_id.as_str());

        match (builtin, overrides) {
            (Some(profile), Some(o)) => Ok(o.apply(profile)),
            (Some(profile), None) => Ok(profile),
            (None, Some(o)) => Ok(o.apply(ProviderProfile::empty(provider_id))),
            (None, None) => Err(ConfigError::UnknownProvider(id.to_string())),
        }
    }

    /// Every provider id known through built-ins or configuration, sorted.
    pub fn provider_ids(&self) -> Vec<String> {
        let mut ids: BTreeSet<String> = builtin_profiles()
            .into_iter()
            .map(|p| p.id.to_string())
            .collect();
        ids.extend(self.providers.keys().map(|k| ProviderId::from(k.as_str()).to_string()));
        ids.into_iter().collect()
    }
}

/// Persistence backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub endpoints: EndpointsConfig,

    #[serde(default = "default_backend_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoints: EndpointsConfig::default(),
            timeout_seconds: default_backend_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_backend_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_save_prompt")]
    pub save_prompt: String,

    #[serde(default = "default_save_response")]
    pub save_response: String,

    #[serde(default = "default_get_context")]
    pub get_context: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            save_prompt: default_save_prompt(),
            save_response: default_save_response(),
            get_context: default_get_context(),
        }
    }
}

fn default_save_prompt() -> String {
    "/save-prompt".to_string()
}

fn default_save_response() -> String {
    "/save-response".to_string()
}

fn default_get_context() -> String {
    "/context".to_string()
}

/// Credentials the coordinator holds on behalf of the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl AuthConfig {
    /// Authenticated only when both a user id and a token are present.
    pub fn identity(&self) -> SessionIdentity {
        match (&self.user_id, &self.access_token) {
            (Some(user), Some(token)) if !user.is_empty() && !token.is_empty() => {
                SessionIdentity::authenticated(user.clone())
            }
            _ => SessionIdentity::unauthenticated(),
        }
    }
}

/// Behavioural switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_true")]
    pub enable_logging: bool,

    /// Maximum number of context items requested from the backend.
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,

    /// When false, prompts are saved and responses captured, but the
    /// message is submitted without augmentation.
    #[serde(default = "default_true")]
    pub auto_enhance: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            context_limit: default_context_limit(),
            auto_enhance: true,
            log_dir: default_log_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_context_limit() -> usize {
    5
}

fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".memlayer")
        .join("logs")
}

/// Browser connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_cdp_endpoint")]
    pub cdp_endpoint: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            cdp_endpoint: default_cdp_endpoint(),
        }
    }
}

fn default_cdp_endpoint() -> String {
    "http://localhost:9222".to_string()
}

/// Timing of page-side behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Give up locating the input/send control after this many polls.
    /// Absent means retry for the lifetime of the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_poll_attempts: Option<u32>,

    #[serde(default = "default_notification_ms")]
    pub notification_ms: u64,

    #[serde(default = "default_bridge_timeout")]
    pub bridge_timeout_seconds: u64,
}

impl UiConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn bridge_timeout(&self) -> Duration {
        Duration::from_secs(self.bridge_timeout_seconds)
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            max_poll_attempts: None,
            notification_ms: default_notification_ms(),
            bridge_timeout_seconds: default_bridge_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_notification_ms() -> u64 {
    2500
}

fn default_bridge_timeout() -> u64 {
    30
}

/// Selector data describing one chat surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: ProviderId,

    /// Substrings identifying the provider's tab by URL.
    pub url_patterns: Vec<String>,

    /// Tried in order; the first match is the input surface.
    pub input_selectors: Vec<String>,

    pub send_selectors: Vec<String>,

    /// Matches every message element; the last is the newest.
    pub message_selector: String,

    /// Any match means a response is still streaming.
    pub generating_selectors: Vec<String>,

    pub text_source: TextSource,

    pub settle_delay_ms: u64,
}

impl ProviderProfile {
    pub fn empty(id: ProviderId) -> Self {
        Self {
            id,
            url_patterns: Vec::new(),
            input_selectors: Vec::new(),
            send_selectors: Vec::new(),
            message_selector: String::new(),
            generating_selectors: Vec::new(),
            text_source: TextSource::Auto,
            settle_delay_ms: 200,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Optional per-field override of a provider profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_patterns: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_selectors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_selectors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_selector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generating_selectors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_source: Option<TextSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_delay_ms: Option<u64>,
}

impl ProviderOverride {
    pub fn apply(&self, mut profile: ProviderProfile) -> ProviderProfile {
        if let Some(v) = &self.url_patterns {
            profile.url_patterns = v.clone();
        }
        if let Some(v) = &self.input_selectors {
            profile.input_selectors = v.clone();
        }
        if let Some(v) = &self.send_selectors {
            profile.send_selectors = v.clone();
        }
        if let Some(v) = &self.message_selector {
            profile.message_selector = v.clone();
        }
        if let Some(v) = &self.generating_selectors {
            profile.generating_selectors = v.clone();
        }
        if let Some(v) = self.text_source {
            profile.text_source = v;
        }
        if let Some(v) = self.settle_delay_ms {
            profile.settle_delay_ms = v;
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.endpoints.save_prompt, "/save-prompt");
        assert_eq!(config.backend.endpoints.save_response, "/save-response");
        assert_eq!(config.backend.endpoints.get_context, "/context");
        assert_eq!(config.settings.context_limit, 5);
        assert!(config.settings.auto_enhance);
        assert_eq!(config.ui.poll_interval(), Duration::from_secs(1));
        assert!(config.ui.max_poll_attempts.is_none());
        assert_eq!(config.browser.cdp_endpoint, "http://localhost:9222");
    }

    #[test]
    fn test_auth_identity() {
        let auth = AuthConfig {
            user_id: Some("u-1".to_string()),
            access_token: Some("tok".to_string()),
        };
        assert!(auth.identity().can_augment());

        let auth = AuthConfig {
            user_id: Some("u-1".to_string()),
            access_token: None,
        };
        assert!(!auth.identity().is_authenticated);

        let auth = AuthConfig {
            user_id: Some(String::new()),
            access_token: Some("tok".to_string()),
        };
        assert!(!auth.identity().is_authenticated);
    }

    #[test]
    fn test_resolve_builtin_provider() {
        let config = Config::default();
        let claude = config.resolve_provider("claude").unwrap();
        assert_eq!(claude.id, ProviderId::Claude);
        assert!(!claude.input_selectors.is_empty());
        assert_eq!(claude.settle_delay_ms, 200);
    }

    #[test]
    fn test_resolve_override_is_partial() {
        let mut config = Config::default();
        config.providers.insert(
            "grok".to_string(),
            ProviderOverride {
                settle_delay_ms: Some(500),
                ..Default::default()
            },
        );

        let grok = config.resolve_provider("grok").unwrap();
        assert_eq!(grok.settle_delay_ms, 500);
        assert_eq!(grok.message_selector, "[data-testid=\"message\"]");
    }

    #[test]
    fn test_resolve_custom_provider() {
        let mut config = Config::default();
        config.providers.insert(
            "chatgpt".to_string(),
            ProviderOverride {
                input_selectors: Some(vec!["#prompt-textarea".to_string()]),
                ..Default::default()
            },
        );

        let profile = config.resolve_provider("chatgpt").unwrap();
        assert_eq!(profile.id, ProviderId::Other("chatgpt".to_string()));
        assert_eq!(profile.input_selectors, vec!["#prompt-textarea"]);
        assert!(config.provider_ids().contains(&"chatgpt".to_string()));
    }

    #[test]
    fn test_resolve_unknown_provider() {
        let config = Config::default();
        let err = config.resolve_provider("bard").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider(_)));
    }
}
