//! Prometheus metrics.
//!
//! The request interceptors emit through the `metrics` facade; this module
//! installs the Prometheus recorder that receives those emissions and
//! serves them on a scrape listener.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `moneyflow_requests_total` | Counter | `method` |
//! | `moneyflow_errors_total` | Counter | `kind` |
//! | `moneyflow_request_duration_seconds` | Histogram | `method` |

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

use crate::error::TelemetryError;
use crate::TelemetryResult;

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address of the scrape listener (e.g., "0.0.0.0:9090").
    pub addr: String,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Parses [`addr`](Self::addr).
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidAddress`] if it is not `host:port`.
    pub fn socket_addr(&self) -> TelemetryResult<SocketAddr> {
        self.addr
            .parse()
            .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", self.addr)))
    }
}

/// Installs the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime; the listener runs on it.
///
/// # Errors
///
/// Returns [`TelemetryError::AlreadyInitialized`] on a second call and
/// [`TelemetryError::MetricsInit`] if the exporter cannot be built.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr = config.socket_addr()?;

    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Err(TelemetryError::AlreadyInitialized("metrics"));
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full("moneyflow_request_duration_seconds".to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();
    tracing::info!(%addr, "metrics listener started");
    Ok(())
}

fn register_metric_descriptions() {
    describe_counter!(
        "moneyflow_requests_total",
        "Total number of HTTP requests processed"
    );
    describe_counter!(
        "moneyflow_errors_total",
        "HTTP requests that ended in an error, by kind"
    );
    describe_histogram!(
        "moneyflow_request_duration_seconds",
        "HTTP request duration in seconds"
    );
}
