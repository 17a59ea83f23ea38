//! Typed configuration for the moneyflow service.
//!
//! - TOML and JSON configuration files
//! - `.env` files and environment variable overrides
//! - Strict parsing (fails on unknown fields)
//! - Validation of values that parse but cannot work
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:3000"
//! shutdown_timeout_secs = 20
//! request_timeout_secs = 10
//!
//! [auth]
//! active_kid = "moneyflow-1"
//! algorithm = "HS256"
//! secret = "change-me"
//! issuer = "moneyflow"
//! token_ttl_secs = 3600
//!
//! [telemetry]
//! service_name = "moneyflow"
//! log_level = "info"
//! log_format = "json"
//! metrics_enabled = true
//! metrics_addr = "0.0.0.0:9090"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Any key can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `MONEYFLOW__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `MONEYFLOW__AUTH__SECRET=...`
//! - `MONEYFLOW__TELEMETRY__METRICS_ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::MoneyflowConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use moneyflow_telemetry::LogFormat;
pub use schema::{Algorithm, AuthSection, DbSection, ServerSection, TelemetrySection};
