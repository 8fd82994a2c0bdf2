//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
///
/// The provider API key is not checked: a missing key only surfaces when a
/// completion request is made.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.gateway.host.trim().is_empty() {
        errors.push("gateway.host must not be empty".to_string());
    }
    if config.gateway.port == 0 {
        errors.push("gateway.port must be > 0".to_string());
    }

    if config.history.max_context_messages == Some(0) {
        errors.push("history.max_context_messages must be > 0 when set".to_string());
    }

    if config.assistant.max_tokens == Some(0) {
        errors.push("assistant.max_tokens must be > 0 when set".to_string());
    }
    if let Some(temperature) = config.assistant.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            errors.push("assistant.temperature must be in [0.0, 2.0]".to_string());
        }
    }

    let format = config.logging.format.to_lowercase();
    if format != "text" && format != "json" {
        errors.push(format!(
            "logging.format must be 'text' or 'json', got '{}'",
            config.logging.format
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
