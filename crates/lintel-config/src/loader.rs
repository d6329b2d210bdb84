//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, strings, `.env` files and environment
//! variables.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, LintelConfig, LogFormat};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values or a preset
/// 2. Configuration files and strings (TOML or JSON), in the order given
/// 3. `.env` file variables
/// 4. Environment variables
///
/// Each file or string layer only overrides the keys it sets, so a preset
/// followed by a partial file keeps the preset's other values.
///
/// # Example
///
/// ```no_run
/// use lintel_config::ConfigLoader;
///
/// # fn main() -> Result<(), lintel_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_file("lintel.toml")?
///     .with_env_prefix("LINTEL")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: LintelConfig,
    env_prefix: Option<String>,
    dotenv_vars: Vec<(String, String)>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: LintelConfig::default(),
            env_prefix: None,
            dotenv_vars: Vec::new(),
        }
    }

    /// Reset to default configuration values, discarding any preset or
    /// file layered so far. The env prefix and `.env` values are kept.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = LintelConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use lintel_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = LintelConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = LintelConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats.
    /// The file format is determined by the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                ConfigError::validation_error(format!(
                    "unsupported configuration file format: {}",
                    path.display()
                ))
            })?;

        tracing::debug!(path = %path.display(), "Loading configuration file");
        self.with_string(&content, &format)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content as a string
    /// * `format` - File format ("toml" or "json")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use lintel_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [exception_handler]
    ///     status_code = 503
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.exception_handler.status_code, 503);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer = match format.to_lowercase().as_str() {
            "toml" => {
                // Strict parse first so unknown keys report a TOML position.
                toml::from_str::<LintelConfig>(content)?;
                serde_json::to_value(toml::from_str::<toml::Table>(content)?)?
            }
            "json" => {
                serde_json::from_str::<LintelConfig>(content)?;
                serde_json::from_str::<Value>(content)?
            }
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        self.merge_layer(layer)?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "LINTEL":
    /// - `LINTEL__EXCEPTION_HANDLER__STATUS_CODE=503`
    /// - `LINTEL__TELEMETRY__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory or its parents into the
    /// process environment.
    ///
    /// A missing file is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Ok(self)
    }

    /// Read variables from a `.env` file without touching the process
    /// environment.
    ///
    /// The variables are applied with the env prefix on [`load`](Self::load),
    /// before real environment variables, which win on conflict.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn with_dotenv_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        for item in dotenvy::from_path_iter(path.as_ref())? {
            self.dotenv_vars.push(item?);
        }
        Ok(self)
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Environment variable parsing fails
    /// - Configuration validation fails
    pub fn load(self) -> Result<LintelConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Finalize without validation.
    ///
    /// Environment overrides are still applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be parsed.
    pub fn load_unvalidated(mut self) -> Result<LintelConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let dotenv_vars = std::mem::take(&mut self.dotenv_vars);
            let process_vars = env::vars_os().filter_map(|(key, value)| {
                Some((key.into_string().ok()?, value.into_string().ok()?))
            });
            self.apply_env_overrides(&prefix, dotenv_vars.into_iter().chain(process_vars))?;
        }

        Ok(self.config)
    }

    // Deep-merge a parsed layer over the current configuration
    fn merge_layer(&mut self, layer: Value) -> Result<(), ConfigError> {
        let mut base = serde_json::to_value(&self.config)?;
        merge_values(&mut base, layer);
        self.config = serde_json::from_value(base)?;
        Ok(())
    }

    // Apply environment variable overrides
    fn apply_env_overrides(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        for (key, value) in vars {
            if key.starts_with(&marker) {
                self.apply_env_var(&key, &value, prefix)?;
            }
        }
        Ok(())
    }

    // Apply a single environment variable
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            // Exception handler section
            ["EXCEPTION_HANDLER", "STATUS_CODE"] => {
                self.config.exception_handler.status_code = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["EXCEPTION_HANDLER", "INCLUDE_STACK_TRACE"] => {
                self.config.exception_handler.include_stack_trace = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Telemetry section
            ["TELEMETRY", "SERVICE_NAME"] => {
                self.config.telemetry.service_name = value.to_string();
            }
            ["TELEMETRY", "ENVIRONMENT"] => {
                self.config.telemetry.environment = value.to_string();
            }

            // Telemetry metrics
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                self.config.telemetry.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["TELEMETRY", "METRICS", "ADDR"] => {
                self.config.telemetry.metrics.addr = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }

            // Telemetry logging
            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                self.config.telemetry.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                self.config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                self.config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "LOGGING", "SPAN_EVENTS"] => {
                self.config.telemetry.logging.span_events = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                self.config.telemetry.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            _ => {
                tracing::debug!(var = %key, "Ignoring unknown configuration variable");
            }
        }

        Ok(())
    }
}

/// Recursively merges `layer` into `base`, object by object.
fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, LintelConfig::default());
    }

    #[test]
    fn test_loader_with_defaults_discards_earlier_layers() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string(r#"{"exception_handler": {"status_code": 503}}"#, "json")
            .unwrap()
            .with_defaults()
            .load()
            .unwrap();
        assert_eq!(config, LintelConfig::default());
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.telemetry.logging.format, LogFormat::Json);
        assert!(config.telemetry.metrics.enabled);
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            [telemetry]
            service_name = "checkout"

            [telemetry.logging]
            level = "warn"
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.telemetry.service_name, "checkout");
        assert_eq!(config.telemetry.logging.level, "warn");
        assert_eq!(config.exception_handler.status_code, 500);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"exception_handler": {"status_code": 502, "include_stack_trace": true}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.exception_handler.status_code, 502);
        assert!(config.exception_handler.include_stack_trace);
    }

    #[test]
    fn test_partial_layer_keeps_preset_values() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[exception_handler]\nstatus_code = 503", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.exception_handler.status_code, 503);
        assert!(config.exception_handler.include_stack_trace);
        assert_eq!(config.telemetry.logging.level, "debug");
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_later_layers_win() {
        let config = ConfigLoader::new()
            .with_string(r#"{"telemetry": {"service_name": "first"}}"#, "json")
            .unwrap()
            .with_string(r#"{"telemetry": {"service_name": "second"}}"#, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.telemetry.service_name, "second");
    }

    #[test]
    fn test_loader_rejects_unknown_fields() {
        let result = ConfigLoader::new().with_string("[exception_handler]\nstatus = 500", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));

        let result = ConfigLoader::new().with_string(r#"{"handler": {}}"#, "json");
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_loader_rejects_unknown_format() {
        let result = ConfigLoader::new().with_string("status_code: 500", "yaml");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/lintel.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/lintel.toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config, LintelConfig::default());
    }

    #[test]
    fn test_load_validates() {
        let result = ConfigLoader::new()
            .with_string("[exception_handler]\nstatus_code = 200", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_unvalidated() {
        let config = ConfigLoader::new()
            .with_string("[exception_handler]\nstatus_code = 200", "toml")
            .unwrap()
            .load_unvalidated()
            .unwrap();
        assert_eq!(config.exception_handler.status_code, 200);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));

        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    // Environment overrides are exercised through `apply_env_overrides`
    // directly, since setting process variables requires unsafe code.

    #[test]
    fn test_apply_env_var_exception_handler() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__EXCEPTION_HANDLER__STATUS_CODE", "503", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__EXCEPTION_HANDLER__INCLUDE_STACK_TRACE", "yes", "TEST")
            .unwrap();
        assert_eq!(loader.config.exception_handler.status_code, 503);
        assert!(loader.config.exception_handler.include_stack_trace);
    }

    #[test]
    fn test_apply_env_var_telemetry() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__TELEMETRY__SERVICE_NAME", "payments", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__TELEMETRY__LOGGING__FORMAT", "Pretty", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__TELEMETRY__METRICS__ADDR", "0.0.0.0:9100", "TEST")
            .unwrap();
        assert_eq!(loader.config.telemetry.service_name, "payments");
        assert_eq!(loader.config.telemetry.logging.format, LogFormat::Pretty);
        assert_eq!(loader.config.telemetry.metrics.addr.as_deref(), Some("0.0.0.0:9100"));
    }

    #[test]
    fn test_apply_env_var_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("TEST__EXCEPTION_HANDLER__STATUS_CODE", "five hundred", "TEST")
            .is_err());
        assert!(loader
            .apply_env_var("TEST__TELEMETRY__METRICS__ENABLED", "maybe", "TEST")
            .is_err());
        assert!(loader
            .apply_env_var("TEST__TELEMETRY__LOGGING__FORMAT", "xml", "TEST")
            .is_err());
    }

    #[test]
    fn test_apply_env_overrides_filters_prefix_and_keeps_order() {
        let mut loader = ConfigLoader::new();
        let vars = [
            ("TEST__TELEMETRY__SERVICE_NAME", "from-dotenv"),
            ("OTHER__TELEMETRY__SERVICE_NAME", "ignored"),
            ("TESTING__TELEMETRY__ENVIRONMENT", "ignored"),
            ("TEST__TELEMETRY__SERVICE_NAME", "from-env"),
            ("TEST__UNKNOWN__KEY", "ignored"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));

        loader.apply_env_overrides("TEST", vars).unwrap();

        assert_eq!(loader.config.telemetry.service_name, "from-env");
        assert_eq!(loader.config.telemetry.environment, "development");
    }

    #[test]
    fn test_merge_values() {
        let mut base = serde_json::json!({"a": {"b": 1, "c": 2}, "d": 3});
        merge_values(&mut base, serde_json::json!({"a": {"b": 10}, "e": 4}));
        assert_eq!(base, serde_json::json!({"a": {"b": 10, "c": 2}, "d": 3, "e": 4}));
    }
}
