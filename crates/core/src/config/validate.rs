use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Remote api key is not empty
/// - Loader batch size is not 0
/// - Server port is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.remote.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "remote.api_key cannot be empty".to_string(),
        ));
    }

    if config.loader.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "loader.batch_size cannot be 0".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}
