//! Configuration schema types.
//!
//! Every section rejects unknown keys and falls back to its defaults for
//! keys it does not mention.

use std::path::PathBuf;
use std::time::Duration;

use moneyflow_telemetry::{LogConfig, LogFormat, MetricsConfig, TelemetryConfig};
use serde::{Deserialize, Serialize};

/// HTTP server section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub http_addr: String,

    /// How long graceful shutdown waits for in-flight requests.
    pub shutdown_timeout_secs: u64,

    /// Deadline for a single request.
    pub request_timeout_secs: u64,

    /// How long a handler may unwind after its deadline cancelled it.
    pub cancel_grace_millis: u64,

    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:3000".to_string(),
            shutdown_timeout_secs: 20,
            request_timeout_secs: 10,
            cancel_grace_millis: 500,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServerSection {
    /// Graceful shutdown timeout.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Per-request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Unwind time after a deadline.
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_millis)
    }
}

/// Database section. Without a URL the service keeps its records in
/// memory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DbSection {
    /// Postgres connection URL.
    pub url: Option<String>,

    /// Pool size.
    pub max_connections: u32,

    /// How long to wait for a pooled connection.
    pub acquire_timeout_secs: u64,
}

impl Default for DbSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

impl DbSection {
    /// The configured URL, if it is not blank.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// Pool acquire timeout.
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Token signing algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// HMAC-SHA256 with a shared secret.
    #[default]
    #[serde(rename = "HS256", alias = "hs256")]
    Hs256,
    /// RSA-SHA256 with a PEM key pair.
    #[serde(rename = "RS256", alias = "rs256")]
    Rs256,
}

/// Token authentication section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSection {
    /// Key id stamped into issued tokens.
    pub active_kid: String,

    /// Signing algorithm of the active key.
    pub algorithm: Algorithm,

    /// Shared secret, for HS256.
    pub secret: Option<String>,

    /// PEM private key, for RS256.
    pub private_key_path: Option<PathBuf>,

    /// PEM public key, for RS256.
    pub public_key_path: Option<PathBuf>,

    /// Expected `iss` claim.
    pub issuer: String,

    /// Lifetime of issued tokens.
    pub token_ttl_secs: u64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            active_kid: "moneyflow-1".to_string(),
            algorithm: Algorithm::Hs256,
            secret: None,
            private_key_path: None,
            public_key_path: None,
            issuer: "moneyflow".to_string(),
            token_ttl_secs: 3600,
        }
    }
}

impl AuthSection {
    /// Lifetime of issued tokens.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// Logging and metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name reported in logs.
    pub service_name: String,

    /// Default log filter directive.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Whether to run the Prometheus scrape listener.
    pub metrics_enabled: bool,

    /// Scrape listener address.
    pub metrics_addr: String,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: "moneyflow".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_addr: "0.0.0.0:9090".to_string(),
        }
    }
}

impl TelemetrySection {
    /// The telemetry installer configuration this section describes.
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            logging: LogConfig {
                level: self.log_level.clone(),
                format: self.log_format,
                file_line_info: self.log_format == LogFormat::Pretty,
                service_name: self.service_name.clone(),
                ..LogConfig::default()
            },
            metrics: MetricsConfig {
                enabled: self.metrics_enabled,
                addr: self.metrics_addr.clone(),
                ..MetricsConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerSection::default();
        assert_eq!(server.http_addr, "0.0.0.0:3000");
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(20));
        assert_eq!(server.request_timeout(), Duration::from_secs(10));
        assert_eq!(server.cancel_grace(), Duration::from_millis(500));
        assert_eq!(server.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_db_section() {
        assert_eq!(DbSection::default().url(), None);

        let db: DbSection = toml::from_str("url = \"postgres://localhost/moneyflow\"").unwrap();
        assert_eq!(db.url(), Some("postgres://localhost/moneyflow"));
        assert_eq!(db.max_connections, 10);
        assert_eq!(db.acquire_timeout(), Duration::from_secs(5));

        let blank: DbSection = toml::from_str("url = \" \"").unwrap();
        assert_eq!(blank.url(), None);
    }

    #[test]
    fn test_algorithm_names() {
        let alg: Algorithm = toml::from_str::<AuthSection>("algorithm = \"RS256\"")
            .unwrap()
            .algorithm;
        assert_eq!(alg, Algorithm::Rs256);
        assert!(toml::from_str::<AuthSection>("algorithm = \"ES256\"").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<ServerSection>("max_connections = 5").is_err());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let auth: AuthSection = toml::from_str("secret = \"s3cret\"").unwrap();
        assert_eq!(auth.secret.as_deref(), Some("s3cret"));
        assert_eq!(auth.issuer, "moneyflow");
        assert_eq!(auth.token_ttl_secs, 3600);
    }

    #[test]
    fn test_to_telemetry_config() {
        let section = TelemetrySection {
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            ..TelemetrySection::default()
        };
        let config = section.to_telemetry_config();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.file_line_info);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.addr, "0.0.0.0:9090");
    }
}
