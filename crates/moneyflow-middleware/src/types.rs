//! Request and response types used throughout the chain.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use moneyflow_core::{ApiError, ErrorEnvelope, INTERNAL_MESSAGE};
use serde::Serialize;

/// HTTP request with a fully buffered body.
pub type Request = http::Request<Bytes>;

/// HTTP response with a fully buffered body.
pub type Response = http::Response<Full<Bytes>>;

/// What handlers and interceptors return.
pub type HandlerResult = Result<Response, ApiError>;

/// Response construction helpers.
///
/// None of these can fail: a value that does not serialize is logged and
/// replaced by a plain internal error envelope.
pub trait ResponseExt {
    /// A JSON response with the given status.
    fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response;

    /// An empty `204 No Content` response.
    fn no_content() -> Response;

    /// A JSON error envelope with the given status.
    fn envelope(status: StatusCode, envelope: &ErrorEnvelope) -> Response;
}

impl ResponseExt for Response {
    fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(body) => with_json_body(status, body),
            Err(err) => {
                tracing::error!(error = %err, "response body failed to serialize");
                internal_error()
            }
        }
    }

    fn no_content() -> Response {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::NO_CONTENT;
        response
    }

    fn envelope(status: StatusCode, envelope: &ErrorEnvelope) -> Response {
        Self::json(status, envelope)
    }
}

fn with_json_body(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn internal_error() -> Response {
    let body = format!(r#"{{"error":"{INTERNAL_MESSAGE}"}}"#);
    with_json_body(StatusCode::INTERNAL_SERVER_ERROR, body.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_sets_status_and_content_type() {
        let response = Response::json(StatusCode::CREATED, &serde_json::json!({"id": "x"}));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_of(response).await["id"], "x");
    }

    #[test]
    fn test_no_content() {
        let response = Response::no_content();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn test_internal_fallback_is_valid_json() {
        let body = body_of(internal_error()).await;
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }
}
