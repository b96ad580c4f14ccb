use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Auth and storage sections exist (enforced by serde)
/// - Server port is not 0
/// - At least one backend node is configured
/// - Node pool tuning values are usable
/// - Transcoder size ceilings are ordered
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.nodes.addresses.is_empty() {
        return Err(ConfigError::ValidationError(
            "nodes.addresses must contain at least one node".to_string(),
        ));
    }

    if config.nodes.max_active == 0 {
        return Err(ConfigError::ValidationError(
            "nodes.max_active cannot be 0".to_string(),
        ));
    }

    if config.nodes.sample_window == 0 {
        return Err(ConfigError::ValidationError(
            "nodes.sample_window cannot be 0".to_string(),
        ));
    }

    if config.transcoder.video_target_bytes > config.transcoder.video_ceiling_bytes {
        return Err(ConfigError::ValidationError(
            "transcoder.video_target_bytes cannot exceed transcoder.video_ceiling_bytes"
                .to_string(),
        ));
    }

    if config.storage.bucket.is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.bucket cannot be empty".to_string(),
        ));
    }

    Ok(())
}
