use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Tool timeouts are not 0
/// - At least one conversion may run at a time
/// - Sweeper interval is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.downloader.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.transcoder.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.workspace.max_concurrent_tasks == 0 {
        return Err(ConfigError::ValidationError(
            "workspace.max_concurrent_tasks cannot be 0".to_string(),
        ));
    }

    if config.retention.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "retention.sweep_interval_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.transcoder.timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.downloader.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = Config::default();
        config.workspace.max_concurrent_tasks = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_concurrent_tasks"));
    }

    #[test]
    fn test_validate_zero_sweep_interval_fails() {
        let mut config = Config::default();
        config.retention.sweep_interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
