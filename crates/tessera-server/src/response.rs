//! JSON response helpers.

use bytes::Bytes;
use http::{header, Response, StatusCode};
use serde_json::Value;

/// Body of every 500 response.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal Server Error";

/// Builds a JSON response.
pub fn json_response(status: StatusCode, payload: &Value) -> Response<Bytes> {
    match serde_json::to_vec(payload) {
        Ok(body) => build(status, Bytes::from(body)),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response payload");
            internal_error()
        }
    }
}

/// Builds a `{"detail": "..."}` response.
pub fn detail_response(status: StatusCode, detail: &str) -> Response<Bytes> {
    json_response(status, &serde_json::json!({ "detail": detail }))
}

/// The generic 500 response.
pub fn internal_error() -> Response<Bytes> {
    build(
        StatusCode::INTERNAL_SERVER_ERROR,
        Bytes::from_static(br#"{"detail":"Internal Server Error"}"#),
    )
}

fn build(status: StatusCode, body: Bytes) -> Response<Bytes> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_response() {
        let response = detail_response(StatusCode::NOT_FOUND, "Not Found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.body().as_ref(), br#"{"detail":"Not Found"}"#);
    }

    #[test]
    fn test_internal_error_body() {
        let response = internal_error();
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["detail"], INTERNAL_ERROR_DETAIL);
    }
}
