use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Debrid API key is set
/// - Per-tier quota, stream cap and repeat interval are non-zero
/// - Server port is not 0 when the control API is enabled
///
/// `min_resolution` is checked while parsing.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.debrid.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "debrid.api_key is required".to_string(),
        ));
    }

    if config.warmer.max_per_quality == 0 {
        return Err(ConfigError::ValidationError(
            "warmer.max_per_quality must be at least 1".to_string(),
        ));
    }

    if config.warmer.max_streams_per_item == 0 {
        return Err(ConfigError::ValidationError(
            "warmer.max_streams_per_item must be at least 1".to_string(),
        ));
    }

    if config.schedule.repeat_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "schedule.repeat_minutes must be at least 1".to_string(),
        ));
    }

    if config.server.enabled && config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}
