use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Encoder and store timeouts are not 0
/// - The rendition catalog is usable (non-empty, unique names, sane sizes and bitrates)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_upload_bytes cannot be 0".to_string(),
        ));
    }

    if config.encoder.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "encoder.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.store.pinata.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "store.pinata.timeout_secs cannot be 0".to_string(),
        ));
    }

    // Ladder validation
    config
        .rendition_catalog()
        .map_err(|e| ConfigError::ValidationError(format!("ladder: {}", e)))?;

    Ok(())
}
