//! Configuration loader with layered approach.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, MoneyflowConfig};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables, optionally seeded from a `.env` file
///
/// # Example
///
/// ```no_run
/// use moneyflow_config::ConfigLoader;
///
/// # fn main() -> Result<(), moneyflow_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()
///     .with_file("moneyflow.toml")?
///     .with_env_prefix("MONEYFLOW")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: MoneyflowConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Create a loader holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file.
    ///
    /// The format follows the extension: `.toml` or `.json`. Sections and
    /// keys the file leaves out keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        self.config = match extension.as_deref() {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        Ok(self)
    }

    /// Load configuration from a file if it exists.
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

    /// Load configuration from a string in `format` ("toml" or "json").
    ///
    /// ```
    /// use moneyflow_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[auth]\nsecret = \"s3cret\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.auth.secret.as_deref(), Some("s3cret"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => return Err(ConfigError::UnsupportedFormat(format.to_string())),
        };
        Ok(self)
    }

    /// Set the prefix of environment variable overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `MONEYFLOW__SERVER__HTTP_ADDR=0.0.0.0:9000`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file, if there is one, into the
    /// process environment. Variables already set are not replaced.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Apply environment overrides, validate, and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override names an unknown key or does
    /// not fit its field, or if validation fails.
    pub fn load(mut self) -> Result<MoneyflowConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> MoneyflowConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> =
            env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    /// Sets the field `key` names to `value`.
    ///
    /// The value is tried as a bool, an integer, a float, and finally as
    /// a plain string, whichever the field accepts first.
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let path = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let pointer = path
            .split("__")
            .fold(String::new(), |acc, part| acc + "/" + &part.to_lowercase());

        let tree = serde_json::to_value(&self.config)?;
        if tree.pointer(&pointer).is_none() {
            return Err(ConfigError::env_parse_error(key, "unknown configuration key"));
        }

        let mut candidates = vec![parse_scalar(value)];
        if !candidates[0].is_string() {
            candidates.push(Value::String(value.to_string()));
        }

        let mut last_error = None;
        for candidate in candidates {
            let mut tree = tree.clone();
            if let Some(slot) = tree.pointer_mut(&pointer) {
                *slot = candidate;
            }
            match serde_json::from_value(tree) {
                Ok(config) => {
                    self.config = config;
                    return Ok(());
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(ConfigError::env_parse_error(
            key,
            last_error.map_or_else(|| "invalid value".to_string(), |e| e.to_string()),
        ))
    }
}

fn parse_scalar(value: &str) -> Value {
    if let Some(b) = parse_bool(value) {
        return Value::Bool(b);
    }
    if let Ok(n) = value.parse::<u64>() {
        return Value::from(n);
    }
    if let Ok(n) = value.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = value.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(value.to_string())
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Algorithm, LogFormat};
    use std::io::Write;

    const MINIMAL: &str = "[auth]\nsecret = \"s3cret\"\n";

    fn loader() -> ConfigLoader {
        ConfigLoader::new().with_string(MINIMAL, "toml").unwrap()
    }

    #[test]
    fn test_load_defaults_need_a_secret() {
        assert!(matches!(
            ConfigLoader::new().load(),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(
            ConfigLoader::new().load_unvalidated().server.http_addr,
            "0.0.0.0:3000"
        );
    }

    #[test]
    fn test_with_string_toml_and_json() {
        let config = loader().load().unwrap();
        assert_eq!(config.auth.secret.as_deref(), Some("s3cret"));
        assert_eq!(config.server.request_timeout_secs, 10);

        let json = r#"{"server": {"http_addr": "127.0.0.1:8000"}, "auth": {"secret": "x"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:8000");

        assert!(matches!(
            ConfigLoader::new().with_string("", "yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = ConfigLoader::new().with_string("[server]\nworkers = 4\n", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));

        let result = ConfigLoader::new().with_string("[database]\nurl = \"x\"\n", "toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nhttp_addr = \"127.0.0.1:4000\"\n\n[auth]\nsecret = \"s\"\n\n[telemetry]\nlog_format = \"pretty\""
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:4000");
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_with_file_errors() {
        assert!(matches!(
            ConfigLoader::new().with_file("/nonexistent/moneyflow.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));

        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            ConfigLoader::new().with_file(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/moneyflow.toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.server.http_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar("TRUE"), Value::Bool(true));
        assert_eq!(parse_scalar("false"), Value::Bool(false));
        assert_eq!(parse_scalar("42"), Value::from(42_u64));
        assert_eq!(parse_scalar("-3"), Value::from(-3_i64));
        assert_eq!(parse_scalar("0.5"), Value::from(0.5));
        assert_eq!(parse_scalar("0.0.0.0:80"), Value::from("0.0.0.0:80"));
    }

    // Overrides are applied through apply_env_var directly so the tests
    // never mutate the process environment.

    #[test]
    fn test_apply_env_var_typed_values() {
        let mut loader = loader();
        loader
            .apply_env_var("TEST__SERVER__HTTP_ADDR", "192.168.1.1:9000", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__SERVER__REQUEST_TIMEOUT_SECS", "3", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__TELEMETRY__METRICS_ENABLED", "true", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__AUTH__ALGORITHM", "RS256", "TEST")
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.server.http_addr, "192.168.1.1:9000");
        assert_eq!(config.server.request_timeout_secs, 3);
        assert!(config.telemetry.metrics_enabled);
        assert_eq!(config.auth.algorithm, Algorithm::Rs256);
    }

    #[test]
    fn test_apply_env_var_sets_unset_db_url() {
        let mut loader = loader();
        loader
            .apply_env_var("TEST__DB__URL", "postgres://db/moneyflow", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__SERVER__MAX_BODY_BYTES", "2048", "TEST")
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.db.url(), Some("postgres://db/moneyflow"));
        assert_eq!(config.server.max_body_bytes, 2048);
    }

    #[test]
    fn test_apply_env_var_numeric_string_field() {
        let mut loader = loader();
        loader
            .apply_env_var("TEST__AUTH__SECRET", "123456", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__AUTH__PUBLIC_KEY_PATH", "/keys/pub.pem", "TEST")
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.auth.secret.as_deref(), Some("123456"));
        assert_eq!(
            config.auth.public_key_path.as_deref(),
            Some(Path::new("/keys/pub.pem"))
        );
    }

    #[test]
    fn test_apply_env_var_errors() {
        let mut loader = loader();
        assert!(matches!(
            loader.apply_env_var("TEST__SERVER__WORKERS", "4", "TEST"),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert!(matches!(
            loader.apply_env_var("TEST__SERVER__REQUEST_TIMEOUT_SECS", "soon", "TEST"),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert!(matches!(
            loader.apply_env_var("TEST__", "x", "TEST"),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert_eq!(loader.load_unvalidated().server.request_timeout_secs, 10);
    }
}
