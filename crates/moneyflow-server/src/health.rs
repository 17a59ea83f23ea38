//! Liveness and readiness probes.
//!
//! Both are answered by the server before routing, so they never pass
//! through the interceptor chain:
//!
//! - `GET /liveness` - the process is up
//! - `GET /readiness` - the process accepts traffic; 503 once shutdown
//!   has begun

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::StatusCode;
use moneyflow_middleware::{Response, ResponseExt};
use serde::{Deserialize, Serialize};

/// Path of the liveness probe.
pub const LIVENESS_PATH: &str = "/liveness";

/// Path of the readiness probe.
pub const READINESS_PATH: &str = "/readiness";

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    /// Always `"up"` while the process answers.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Build version.
    pub version: String,
    /// Seconds since the server was built.
    pub uptime_seconds: u64,
}

/// Answers the liveness probe.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
    start_time: Instant,
}

impl HealthCheck {
    /// Creates a health check starting its uptime clock now.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            start_time: Instant::now(),
        }
    }

    /// Time since creation.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            status: "up".to_string(),
            service: self.service.clone(),
            version: self.version.clone(),
            uptime_seconds: self.uptime().as_secs(),
        }
    }

    /// The probe response: always 200.
    #[must_use]
    pub fn respond(&self) -> Response {
        Response::json(StatusCode::OK, &self.status())
    }
}

/// Readiness probe body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessStatus {
    /// Whether the server accepts traffic.
    pub ready: bool,
}

/// Answers the readiness probe. Clones share one flag.
#[derive(Debug, Clone)]
pub struct ReadinessCheck {
    ready: Arc<AtomicBool>,
}

impl Default for ReadinessCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessCheck {
    /// Creates a ready check.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns whether the server accepts traffic.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Sets the readiness flag.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// The probe response: 200 when ready, 503 otherwise.
    #[must_use]
    pub fn respond(&self) -> Response {
        let ready = self.is_ready();
        let status = if ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        Response::json(status, &ReadinessStatus { ready })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_liveness_body() {
        let health = HealthCheck::new("moneyflow", "1.2.3");
        let response = health.respond();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let status: HealthStatus = serde_json::from_slice(&body).unwrap();
        assert_eq!(status.status, "up");
        assert_eq!(status.service, "moneyflow");
        assert_eq!(status.version, "1.2.3");
    }

    #[test]
    fn test_readiness_flips() {
        let readiness = ReadinessCheck::new();
        assert_eq!(readiness.respond().status(), StatusCode::OK);

        readiness.clone().set_ready(false);
        assert!(!readiness.is_ready());
        assert_eq!(readiness.respond().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
