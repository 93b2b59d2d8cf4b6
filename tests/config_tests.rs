use assert_fs::prelude::*;
use script_supervisor::ScriptSupervisor;
use script_supervisor::config::{SupervisorConfig, validate_config};
use script_supervisor::error::Error;
use std::time::Duration;

#[test]
fn test_parse_full_config() -> Result<(), Box<dyn std::error::Error>> {
    let config_str = r#"{
        "interpreter": "python3",
        "logBufferCap": 250,
        "retentionMs": 60000,
        "stopTimeoutMs": 1500,
        "listTail": 5,
        "detailTail": 20
    }"#;

    let config = SupervisorConfig::parse_from_str(config_str)?;

    assert_eq!(config.interpreter, "python3");
    assert_eq!(config.log_buffer_cap, 250);
    assert_eq!(config.retention_ms, 60_000);
    assert_eq!(config.stop_timeout_ms, 1_500);
    assert_eq!(config.list_tail, 5);
    assert_eq!(config.detail_tail, 20);
    assert_eq!(config.retention(), Duration::from_secs(60));
    assert_eq!(config.stop_timeout(), Duration::from_millis(1_500));

    Ok(())
}

#[test]
fn test_defaults() {
    let config = SupervisorConfig::default();

    assert_eq!(config.interpreter, "node");
    assert_eq!(config.log_buffer_cap, 1000);
    assert_eq!(config.retention(), Duration::from_secs(3600));
    assert_eq!(config.stop_timeout(), Duration::from_secs(5));
    assert_eq!(config.list_tail, 10);
    assert_eq!(config.detail_tail, 50);

    // Omitted fields fall back to the same defaults
    let parsed = SupervisorConfig::parse_from_str(r#"{"interpreter": "deno"}"#).unwrap();
    assert_eq!(parsed.log_buffer_cap, 1000);
    assert_eq!(parsed.interpreter, "deno");
}

#[test]
fn test_validate_config() {
    assert!(validate_config(&SupervisorConfig::default()).is_ok());

    let empty_interpreter = SupervisorConfig {
        interpreter: "   ".to_string(),
        ..SupervisorConfig::default()
    };
    assert!(matches!(
        validate_config(&empty_interpreter),
        Err(Error::ConfigInvalid(_))
    ));

    let zero_cap = SupervisorConfig {
        log_buffer_cap: 0,
        ..SupervisorConfig::default()
    };
    assert!(matches!(
        validate_config(&zero_cap),
        Err(Error::ConfigInvalid(_))
    ));

    let zero_timeout = SupervisorConfig {
        stop_timeout_ms: 0,
        ..SupervisorConfig::default()
    };
    assert!(matches!(
        validate_config(&zero_timeout),
        Err(Error::ConfigInvalid(_))
    ));

    let zero_retention = SupervisorConfig {
        retention_ms: 0,
        ..SupervisorConfig::default()
    };
    assert!(matches!(
        validate_config(&zero_retention),
        Err(Error::ConfigInvalid(_))
    ));

    let zero_tail = SupervisorConfig {
        list_tail: 0,
        ..SupervisorConfig::default()
    };
    assert!(matches!(
        validate_config(&zero_tail),
        Err(Error::ConfigInvalid(_))
    ));
}

#[test]
fn test_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let file = assert_fs::NamedTempFile::new("supervisor.json")?;
    file.write_str(r#"{"interpreter": "/usr/bin/node", "stopTimeoutMs": 750}"#)?;

    let config = SupervisorConfig::from_file(file.path())?;

    assert_eq!(config.interpreter, "/usr/bin/node");
    assert_eq!(config.stop_timeout(), Duration::from_millis(750));

    file.close()?;
    Ok(())
}

#[test]
fn test_missing_file_is_a_parse_error() {
    let result = SupervisorConfig::from_file("/does/not/exist/supervisor.json");
    assert!(matches!(result, Err(Error::ConfigParse(_))));
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    let result = SupervisorConfig::parse_from_str("{ not json");
    assert!(matches!(result, Err(Error::ConfigParse(_))));
}

#[test]
fn test_supervisor_rejects_invalid_config_values() {
    // Parsing succeeds but validation refuses the zero cap
    let result = ScriptSupervisor::from_config_str(r#"{"logBufferCap": 0}"#);
    assert!(matches!(result, Err(Error::ConfigInvalid(_))));
}
