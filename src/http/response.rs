//! HTTP response building module
//!
//! Builders for the service's fixed text and JSON responses.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

pub type HttpResponse = Response<Full<Bytes>>;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json";
const INTERNAL_ERROR_BODY: &str = r#"{"error":"Internal Server Error"}"#;

/// JSON body carrying a status message
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ApiMessage {
    pub message: &'static str,
}

impl ApiMessage {
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// JSON body carrying an error description
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ApiError {
    pub error: &'static str,
}

impl ApiError {
    pub const fn new(error: &'static str) -> Self {
        Self { error }
    }

    pub const fn not_found() -> Self {
        Self::new("Not Found")
    }
}

/// Build a plain-text response
pub fn build_text_response(
    status: StatusCode,
    text: &str,
    server_name: &str,
    is_head: bool,
) -> HttpResponse {
    build_response(
        status,
        TEXT_CONTENT_TYPE,
        Bytes::copy_from_slice(text.as_bytes()),
        server_name,
        is_head,
    )
}

/// Build a JSON response from any serializable body
///
/// Serialization failure yields a 500 with a fixed JSON error body.
pub fn build_json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    server_name: &str,
    is_head: bool,
) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(json) => build_response(status, JSON_CONTENT_TYPE, Bytes::from(json), server_name, is_head),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            build_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                JSON_CONTENT_TYPE,
                Bytes::from_static(INTERNAL_ERROR_BODY.as_bytes()),
                server_name,
                is_head,
            )
        }
    }
}

/// Build the uniform 404 Not Found response
pub fn build_not_found_response(server_name: &str, is_head: bool) -> HttpResponse {
    build_json_response(StatusCode::NOT_FOUND, &ApiError::not_found(), server_name, is_head)
}

fn build_response(
    status: StatusCode,
    content_type: &str,
    data: Bytes,
    server_name: &str,
    is_head: bool,
) -> HttpResponse {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Server", server_name)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = status;
            fallback
        })
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_bytes(resp: HttpResponse) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_text_response() {
        let resp = build_text_response(StatusCode::OK, "hello", "test/1.0", false);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], TEXT_CONTENT_TYPE);
        assert_eq!(resp.headers()["content-length"], "5");
        assert_eq!(resp.headers()["server"], "test/1.0");
        assert_eq!(body_bytes(resp).await, "hello");
    }

    #[tokio::test]
    async fn test_json_response_is_compact() {
        let resp = build_json_response(StatusCode::OK, &ApiMessage::new("hi"), "test/1.0", false);
        assert_eq!(resp.headers()["content-type"], JSON_CONTENT_TYPE);
        assert_eq!(body_bytes(resp).await, r#"{"message":"hi"}"#);
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let resp = build_not_found_response("test/1.0", false);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_bytes(resp).await, r#"{"error":"Not Found"}"#);
    }

    #[test]
    fn test_payloads_hold_static_text() {
        const NOT_FOUND: ApiError = ApiError::not_found();
        assert_eq!(NOT_FOUND, ApiError::new("Not Found"));
        assert_eq!(
            serde_json::to_string(&ApiMessage::new("API is working!")).unwrap(),
            r#"{"message":"API is working!"}"#
        );
    }

    #[tokio::test]
    async fn test_head_keeps_length_drops_body() {
        let resp = build_not_found_response("test/1.0", true);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["content-length"], "21");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_server_name_falls_back() {
        let resp = build_text_response(StatusCode::OK, "hello", "bad\nname", false);
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_bytes(resp).await.is_empty());
    }
}
