//! Loading configuration from files on disk.

use lintel_config::{ConfigError, ConfigLoader, LogFormat};
use lintel_telemetry::MemoryPublisher;
use std::io::Write;
use std::sync::Arc;
use tempfile::{Builder, NamedTempFile};

fn write_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_toml_file() {
    let file = write_file(
        ".toml",
        r#"
        [exception_handler]
        status_code = 503
        include_stack_trace = true

        [telemetry]
        service_name = "inventory"

        [telemetry.metrics]
        enabled = true
        addr = "127.0.0.1:9464"

        [telemetry.logging]
        format = "pretty"
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert_eq!(config.exception_handler.status_code, 503);
    assert!(config.exception_handler.include_stack_trace);
    assert_eq!(config.telemetry.service_name, "inventory");
    assert_eq!(config.telemetry.metrics.addr.as_deref(), Some("127.0.0.1:9464"));
    assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);

    let telemetry = config.telemetry.to_telemetry_config();
    assert!(telemetry.metrics.enabled);
    assert_eq!(telemetry.metrics.service_name, "inventory");
    assert!(!telemetry.logging.json_format);
}

#[test]
fn test_load_json_file_over_toml_file() {
    let base = write_file(".toml", "[telemetry]\nservice_name = \"base\"\nenvironment = \"staging\"\n");
    let overlay = write_file(".json", r#"{"telemetry": {"service_name": "overlay"}}"#);

    let config = ConfigLoader::new()
        .with_file(base.path())
        .unwrap()
        .with_file(overlay.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.telemetry.service_name, "overlay");
    assert_eq!(config.telemetry.environment, "staging");
}

#[test]
fn test_unsupported_extension() {
    let file = write_file(".yaml", "exception_handler: {}");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_invalid_toml_file() {
    let file = write_file(".toml", "[exception_handler\nstatus_code = ");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn test_dotenv_file_overrides_file_layer() {
    let file = write_file(".toml", "[exception_handler]\nstatus_code = 503\n");
    let dotenv = write_file(
        ".env",
        "LINTEL_TEST_DOTENV__EXCEPTION_HANDLER__STATUS_CODE=504\n\
         LINTEL_TEST_DOTENV__TELEMETRY__LOGGING__LEVEL=warn\n\
         UNRELATED=value\n",
    );

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .with_dotenv_file(dotenv.path())
        .unwrap()
        .with_env_prefix("lintel_test_dotenv")
        .load()
        .unwrap();

    assert_eq!(config.exception_handler.status_code, 504);
    assert_eq!(config.telemetry.logging.level, "warn");
}

#[test]
fn test_dotenv_file_ignored_without_prefix() {
    let dotenv = write_file(".env", "LINTEL__EXCEPTION_HANDLER__STATUS_CODE=504\n");

    let config = ConfigLoader::new()
        .with_dotenv_file(dotenv.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.exception_handler.status_code, 500);
}

#[test]
fn test_invalid_dotenv_value_fails_load() {
    let dotenv = write_file(".env", "LINTEL_TEST_BAD__TELEMETRY__METRICS__ENABLED=perhaps\n");

    let result = ConfigLoader::new()
        .with_dotenv_file(dotenv.path())
        .unwrap()
        .with_env_prefix("LINTEL_TEST_BAD")
        .load();

    assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
}

#[test]
fn test_build_exception_handler_from_file() {
    let file = write_file(".toml", "[exception_handler]\nstatus_code = 502\n");
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    let handler = config
        .exception_handler
        .build(Arc::new(MemoryPublisher::new()))
        .unwrap();

    assert_eq!(handler.configured_status(), 502);
    assert!(!handler.includes_stack_trace());
}
