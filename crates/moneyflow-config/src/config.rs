//! The root configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{Algorithm, AuthSection, ConfigError, DbSection, ServerSection, TelemetrySection};

/// Complete moneyflow service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// ```
/// use moneyflow_config::MoneyflowConfig;
///
/// let config = MoneyflowConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:3000");
/// assert_eq!(config.auth.issuer, "moneyflow");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct MoneyflowConfig {
    /// HTTP server.
    pub server: ServerSection,

    /// Token authentication.
    pub auth: AuthSection,

    /// Record storage.
    pub db: DbSection,

    /// Logging and metrics.
    pub telemetry: TelemetrySection,
}

impl MoneyflowConfig {
    /// Checks values that deserialize but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_addr("server.http_addr", &self.server.http_addr)?;

        if self.server.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.shutdown_timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.auth.issuer.trim().is_empty() {
            return Err(ConfigError::invalid_value("auth.issuer", "must not be empty"));
        }
        if self.auth.active_kid.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "auth.active_kid",
                "must not be empty",
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::invalid_value(
                "auth.token_ttl_secs",
                "must be greater than zero",
            ));
        }
        match self.auth.algorithm {
            Algorithm::Hs256 => {
                if self.auth.secret.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::invalid_value(
                        "auth.secret",
                        "required when algorithm is HS256",
                    ));
                }
            }
            Algorithm::Rs256 => {
                if self.auth.private_key_path.is_none() {
                    return Err(ConfigError::invalid_value(
                        "auth.private_key_path",
                        "required when algorithm is RS256",
                    ));
                }
                if self.auth.public_key_path.is_none() {
                    return Err(ConfigError::invalid_value(
                        "auth.public_key_path",
                        "required when algorithm is RS256",
                    ));
                }
            }
        }

        if let Some(url) = self.db.url() {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(ConfigError::invalid_value(
                    "db.url",
                    "must be a postgres:// URL",
                ));
            }
            if self.db.max_connections == 0 {
                return Err(ConfigError::invalid_value(
                    "db.max_connections",
                    "must be greater than zero",
                ));
            }
        }

        if self.telemetry.metrics_enabled {
            parse_addr("telemetry.metrics_addr", &self.telemetry.metrics_addr)?;
        }

        Ok(())
    }

    /// The bind address, once [`validate`](Self::validate) has passed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the address does not parse.
    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_addr("server.http_addr", &self.server.http_addr)
    }
}

fn parse_addr(field: &str, value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid_value(field, format!("invalid socket address: {value}")))
}
