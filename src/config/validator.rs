use crate::config::SupervisorConfig;
use crate::error::{Error, Result};

/// Validates the interpreter setting.
pub fn validate_interpreter(config: &SupervisorConfig) -> Result<()> {
    if config.interpreter.trim().is_empty() {
        return Err(Error::ConfigInvalid(
            "Interpreter must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the buffering and retention limits.
pub fn validate_limits(config: &SupervisorConfig) -> Result<()> {
    if config.log_buffer_cap == 0 {
        return Err(Error::ConfigInvalid(
            "Log buffer capacity must be at least 1".to_string(),
        ));
    }

    if config.retention_ms == 0 {
        return Err(Error::ConfigInvalid(
            "Retention window must be at least 1ms".to_string(),
        ));
    }

    if config.stop_timeout_ms == 0 {
        return Err(Error::ConfigInvalid(
            "Stop timeout must be at least 1ms".to_string(),
        ));
    }

    if config.list_tail == 0 || config.detail_tail == 0 {
        return Err(Error::ConfigInvalid(
            "Log tail lengths must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Full configuration validation
pub fn validate_config(config: &SupervisorConfig) -> Result<()> {
    validate_interpreter(config)?;
    validate_limits(config)?;

    Ok(())
}
