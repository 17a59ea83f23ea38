//! The HTTP/1.1 server.
//!
//! One task per connection; each request is buffered up to the body limit,
//! given a cancellation token and a deadline, and handed to
//! [`App::dispatch`]. The token is cancelled when the deadline passes or
//! the connection goes away mid-request. On a deadline the handler keeps
//! being polled for the cancel grace period so it can unwind.

use std::net::SocketAddr;
use std::sync::Arc;

use http::StatusCode;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body as _, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use moneyflow_core::{ApiError, ErrorEnvelope};
use moneyflow_middleware::{Request, Response, ResponseExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::health::{HealthCheck, ReadinessCheck, LIVENESS_PATH, READINESS_PATH};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Message of the response to a request that ran past its deadline.
pub const TIMEOUT_MESSAGE: &str = "request timed out";

/// Message of the response to a request whose body exceeds the limit.
pub const BODY_TOO_LARGE_MESSAGE: &str = "request body too large";

/// Serves an [`App`] over HTTP/1.1.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    app: Arc<App>,
    health: HealthCheck,
    readiness: ReadinessCheck,
}

impl Server {
    /// Creates a server for `app`.
    #[must_use]
    pub fn new(config: ServerConfig, app: App) -> Self {
        let health = HealthCheck::new(config.service_name(), env!("CARGO_PKG_VERSION"));
        Self {
            config,
            app: Arc::new(app),
            health,
            readiness: ReadinessCheck::new(),
        }
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The readiness flag; cleared once shutdown begins.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessCheck {
        &self.readiness
    }

    /// The shutdown signal shared with the app.
    #[must_use]
    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        self.app.shutdown_signal()
    }

    /// Binds the configured address and serves until SIGTERM, SIGINT or a
    /// handler-requested shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is invalid or taken.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::Bind(format!("invalid address '{}': {e}", self.config.http_addr()))
        })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind to {addr}: {e}")))?;

        self.shutdown_signal().listen_for_os_signals();
        self.serve(listener).await
    }

    /// Serves connections from `listener` until the shutdown signal fires,
    /// then waits up to the shutdown timeout for open connections.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the listener has no local address.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "server listening");

        let shutdown = self.shutdown_signal().clone();
        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(err) = server.handle_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(%remote_addr, error = %err, "connection closed with error");
                            }
                            drop(token);
                        });
                    }
                    Err(err) => tracing::error!(error = %err, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        server.readiness.set_ready(false);

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            timeout_secs = timeout.as_secs(),
            active = tracker.active_connections(),
            "waiting for open connections"
        );
        tokio::select! {
            () = tracker.wait_for_shutdown() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached, abandoning open connections"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { server.handle_request(request).await }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(%remote_addr, "finishing in-flight request before close");
                conn.as_mut().graceful_shutdown();
                conn.as_mut().await
            }
        }
    }

    async fn handle_request(
        &self,
        request: http::Request<Incoming>,
    ) -> Result<Response, ServerError> {
        if request.method() == http::Method::GET {
            match request.uri().path() {
                LIVENESS_PATH => return Ok(self.health.respond()),
                READINESS_PATH => return Ok(self.readiness.respond()),
                _ => {}
            }
        }

        let cancel = CancellationToken::new();
        let _disconnected = cancel.clone().drop_guard();

        let (parts, body) = request.into_parts();
        let limit = self.config.max_body_bytes();
        if body.size_hint().lower() > u64::try_from(limit).unwrap_or(u64::MAX) {
            return Ok(body_too_large());
        }
        let work = async {
            let body = match Limited::new(body, limit).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => return Some(body_error(err.as_ref())),
            };
            self.app
                .dispatch(Request::from_parts(parts, body), cancel.clone())
                .await
        };
        tokio::pin!(work);

        match tokio::time::timeout(self.config.request_timeout(), work.as_mut()).await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(ServerError::ShutdownRequested),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.config.request_timeout().as_secs(),
                    "request deadline exceeded"
                );
                // The handler must see the cancellation while still polled,
                // so open transactions roll back before the 504 goes out.
                cancel.cancel();
                if tokio::time::timeout(self.config.cancel_grace(), work.as_mut())
                    .await
                    .is_err()
                {
                    tracing::warn!("handler ignored cancellation, abandoning it");
                }
                Ok(Response::envelope(
                    StatusCode::GATEWAY_TIMEOUT,
                    &ErrorEnvelope {
                        error: TIMEOUT_MESSAGE.to_string(),
                        fields: None,
                    },
                ))
            }
        }
    }
}

fn body_too_large() -> Response {
    Response::envelope(
        StatusCode::PAYLOAD_TOO_LARGE,
        &ErrorEnvelope {
            error: BODY_TOO_LARGE_MESSAGE.to_string(),
            fields: None,
        },
    )
}

fn body_error(err: &(dyn std::error::Error + Send + Sync + 'static)) -> Response {
    if err.downcast_ref::<LengthLimitError>().is_some() {
        return body_too_large();
    }
    tracing::debug!(error = %err, "failed to read request body");
    let err = ApiError::bad_request("failed to read request body");
    Response::envelope(StatusCode::BAD_REQUEST, &err.to_envelope())
}
