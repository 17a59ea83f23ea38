//! Request context types.
//!
//! The [`RequestContext`] carries all per-request state through the
//! interceptor chain and into handlers. It is created by the server for a
//! matched route and owned by that request alone.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use http::{Method, StatusCode};
use moneyflow_router::Params;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::claims::Claims;
use crate::error::{ApiError, ApiResult};

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for neighbouring
/// requests close together when sorted by trace id.
///
/// # Example
///
/// ```
/// use moneyflow_core::TraceId;
///
/// let a = TraceId::new();
/// let b = TraceId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Creates a new trace id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TraceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request state.
///
/// - trace id and start time, fixed at creation
/// - the status slot, written once by the error-translation interceptor
/// - claims, absent until the authenticate interceptor runs
/// - path parameters bound by the router
/// - a cancellation token tied to client disconnect and the deadline
///
/// # Example
///
/// ```
/// use http::{Method, StatusCode};
/// use moneyflow_core::RequestContext;
///
/// let mut ctx = RequestContext::new(Method::GET, "/v1/users/1/10");
/// assert!(ctx.claims().is_none());
/// assert!(ctx.set_status(StatusCode::OK));
/// assert!(!ctx.set_status(StatusCode::INTERNAL_SERVER_ERROR));
/// assert_eq!(ctx.status(), Some(StatusCode::OK));
/// ```
#[derive(Debug)]
pub struct RequestContext {
    trace_id: TraceId,
    method: Method,
    path: String,
    started_at: Instant,
    now: DateTime<Utc>,
    status: Option<StatusCode>,
    claims: Option<Claims>,
    params: Params,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Creates a context with a fresh trace id.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            trace_id: TraceId::new(),
            method,
            path: path.into(),
            started_at: Instant::now(),
            now: Utc::now(),
            status: None,
            claims: None,
            params: Params::new(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Sets the bound path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Sets the trace id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = trace_id;
        self
    }

    /// Returns the trace id.
    #[must_use]
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the wall-clock time the request started.
    ///
    /// Handlers stamp `date_created` / `date_updated` with this value.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns the time elapsed since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Records the response status.
    ///
    /// Only the first write is kept; returns `false` if a status was
    /// already recorded.
    pub fn set_status(&mut self, status: StatusCode) -> bool {
        if self.status.is_some() {
            tracing::warn!(
                trace_id = %self.trace_id,
                status = status.as_u16(),
                "response status already recorded"
            );
            return false;
        }
        self.status = Some(status);
        true
    }

    /// Returns the recorded response status.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Stores verified claims.
    pub fn set_claims(&mut self, claims: Claims) {
        self.claims = Some(claims);
    }

    /// Returns the claims, if the request was authenticated.
    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Returns the claims of a route that must be authenticated.
    ///
    /// A missing value means the route was registered without the
    /// authenticate interceptor, which is a wiring bug and therefore an
    /// internal error.
    pub fn require_claims(&self) -> ApiResult<&Claims> {
        self.claims
            .as_ref()
            .ok_or_else(|| ApiError::internal("claims missing from request context"))
    }

    /// Returns the bound path parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the value bound to the path parameter `name`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns the request's cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once the client went away or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
