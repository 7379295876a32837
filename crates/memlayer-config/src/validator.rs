//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_backend(config, &mut result);
        Self::validate_auth(config, &mut result);
        Self::validate_settings(config, &mut result);
        Self::validate_ui(config, &mut result);
        Self::validate_providers(config, &mut result)?;

        Ok(result)
    }

    fn validate_backend(config: &Config, result: &mut ValidationResult) {
        let url = &config.backend.base_url;
        if url.is_empty() {
            result.add_error(ValidationError::new(
                "backend.base_url",
                "Backend URL cannot be empty",
            ));
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "backend.base_url",
                "base_url must start with http:// or https://",
            ));
        } else if url.contains("your-") {
            result.add_warning(ValidationWarning::new(
                "backend.base_url",
                "base_url still looks like a placeholder",
            ));
        }

        let endpoints = [
            ("save_prompt", &config.backend.endpoints.save_prompt),
            ("save_response", &config.backend.endpoints.save_response),
            ("get_context", &config.backend.endpoints.get_context),
        ];
        for (name, path) in endpoints {
            if !path.starts_with('/') {
                result.add_error(ValidationError::new(
                    format!("backend.endpoints.{}", name),
                    "Endpoint path must start with '/'",
                ));
            }
        }

        if config.backend.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "backend.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }
    }

    fn validate_auth(config: &Config, result: &mut ValidationResult) {
        if !config.auth.identity().is_authenticated {
            result.add_warning(ValidationWarning::new(
                "auth",
                "user_id/access_token not set; augmentation will be refused until signed in",
            ));
        }
    }

    fn validate_settings(config: &Config, result: &mut ValidationResult) {
        if config.settings.context_limit == 0 {
            result.add_error(ValidationError::new(
                "settings.context_limit",
                "context_limit must be greater than 0",
            ));
        }

        if config.settings.context_limit > 50 {
            result.add_warning(ValidationWarning::new(
                "settings.context_limit",
                "context_limit is very high (>50), augmented messages may get long",
            ));
        }
    }

    fn validate_ui(config: &Config, result: &mut ValidationResult) {
        if config.ui.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "ui.poll_interval_ms",
                "poll_interval_ms must be greater than 0",
            ));
        }

        if config.ui.max_poll_attempts == Some(0) {
            result.add_error(ValidationError::new(
                "ui.max_poll_attempts",
                "max_poll_attempts must be greater than 0 when set",
            ));
        }

        if config.ui.bridge_timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "ui.bridge_timeout_seconds",
                "bridge_timeout_seconds must be greater than 0",
            ));
        }
    }

    fn validate_providers(config: &Config, result: &mut ValidationResult) -> Result<(), ConfigError> {
        for id in config.provider_ids() {
            let profile = config.resolve_provider(&id)?;
            let path = format!("providers.{}", id);

            if profile.input_selectors.is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.input_selectors", path),
                    "At least one input selector is required",
                ));
            }
            if profile.send_selectors.is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.send_selectors", path),
                    "At least one send selector is required",
                ));
            }
            if profile.message_selector.is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.message_selector", path),
                    "message_selector cannot be empty",
                ));
            }
            if profile.generating_selectors.is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.generating_selectors", path),
                    "Without a generating indicator responses are captured mid-stream",
                ));
            }
            if profile.url_patterns.is_empty() {
                result.add_warning(ValidationWarning::new(
                    format!("{}.url_patterns", path),
                    "No url_patterns; the tab must be chosen explicitly",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
