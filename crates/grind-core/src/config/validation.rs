//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_server(config)?;
    validate_tools(config)?;
    validate_timeouts(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    let parsed = url::Url::parse(&config.isolate_server).map_err(|e| {
        ConfigError::InvalidValue {
            field: "isolate_server".to_string(),
            message: e.to_string(),
        }
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            field: "isolate_server".to_string(),
            message: format!("unsupported scheme '{}', expected http or https", parsed.scheme()),
        }
        .into());
    }

    Ok(())
}

fn validate_tools(config: &Config) -> Result<()> {
    let fields = [
        ("isolate_path", &config.isolate_path),
        ("dist_test_client_path", &config.dist_test_client_path),
        ("java", &config.java),
        ("junit_runner", &config.junit_runner),
    ];

    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: "cannot be empty".to_string(),
            }
            .into());
        }
    }

    Ok(())
}

fn validate_timeouts(config: &Config) -> Result<()> {
    if config.task_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "task_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into());
    }

    if config.process_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "process_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into());
    }

    Ok(())
}
