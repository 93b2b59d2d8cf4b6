use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunable settings for the supervisor.
///
/// This structure controls how processes are launched and how their records
/// are retained: the default interpreter, the size of each per-server log
/// buffer, how long exited records stay visible, and how long a graceful
/// stop waits before the caller is offered escalation.
///
/// All fields have defaults, so a partial configuration (or none at all)
/// is accepted.
///
/// # JSON Schema
///
/// The configuration follows this JSON schema:
///
/// ```json
/// {
///   "interpreter": "node",
///   "logBufferCap": 1000,
///   "retentionMs": 3600000,
///   "stopTimeoutMs": 5000,
///   "listTail": 10,
///   "detailTail": 50
/// }
/// ```
///
/// # Examples
///
/// Loading a configuration from a file:
///
/// ```no_run
/// use script_supervisor::config::SupervisorConfig;
///
/// let config = SupervisorConfig::from_file("supervisor.json").unwrap();
/// ```
///
/// Creating a configuration programmatically:
///
/// ```
/// use script_supervisor::config::SupervisorConfig;
///
/// let config = SupervisorConfig {
///     stop_timeout_ms: 2_000,
///     ..SupervisorConfig::default()
/// };
/// assert_eq!(config.stop_timeout().as_secs(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupervisorConfig {
    /// Interpreter used to run scripts when the caller does not select one.
    /// This can be an absolute path or a command available in the PATH.
    pub interpreter: String,

    /// Maximum number of log entries kept per server.
    /// Once the cap is reached the oldest entries are evicted first.
    pub log_buffer_cap: usize,

    /// How long an exited server's record stays in the registry, in
    /// milliseconds, before it is purged.
    pub retention_ms: u64,

    /// How long a stop waits for the process to exit after signalling,
    /// in milliseconds, before reporting a timeout.
    pub stop_timeout_ms: u64,

    /// Number of recent log entries included per server in listings.
    pub list_tail: usize,

    /// Number of recent log entries included in a single-server detail view.
    pub detail_tail: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            interpreter: "node".to_string(),
            log_buffer_cap: 1000,
            retention_ms: 3_600_000,
            stop_timeout_ms: 5_000,
            list_tail: 10,
            detail_tail: 50,
        }
    }
}

impl SupervisorConfig {
    /// Loads a configuration from a file path.
    ///
    /// This method reads the file at the specified path and parses its contents
    /// as a JSON configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the configuration file
    ///
    /// # Returns
    ///
    /// A `Result<SupervisorConfig>` that contains the parsed configuration or an error
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be read
    /// * The file contents are not valid JSON
    /// * The JSON does not conform to the expected schema
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read config file: {}", e)))?;

        Self::parse_from_str(&content)
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Arguments
    ///
    /// * `content` - A string containing JSON configuration
    ///
    /// # Returns
    ///
    /// A `Result<SupervisorConfig>` that contains the parsed configuration or an error
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The string is not valid JSON
    /// * The JSON does not conform to the expected schema
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))
    }

    /// Retention window for exited records as a [`Duration`].
    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention_ms)
    }

    /// Graceful-stop wait as a [`Duration`].
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config_str = r#"{
            "interpreter": "python3",
            "stopTimeoutMs": 250
        }"#;

        let config = SupervisorConfig::parse_from_str(config_str).unwrap();

        assert_eq!(config.interpreter, "python3");
        assert_eq!(config.stop_timeout_ms, 250);
        assert_eq!(config.log_buffer_cap, 1000);
        assert_eq!(config.retention_ms, 3_600_000);
    }

    #[test]
    fn test_parse_empty_object_uses_defaults() {
        let config = SupervisorConfig::parse_from_str("{}").unwrap();

        assert_eq!(config, SupervisorConfig::default());
    }
}
