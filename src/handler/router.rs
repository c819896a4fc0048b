//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: resolve the route, build the
//! response, write the access log.

use crate::config::AppState;
use crate::http::{self, ApiMessage, HttpResponse};
use crate::logger::{self, AccessLogEntry};
use crate::routing::Route;
use hyper::body::Body;
use hyper::{Method, Request, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

pub const WELCOME_TEXT: &str = "Welcome to File Uploader";
pub const API_TEST_MESSAGE: &str = "API is working!";

/// Main entry point for HTTP request handling
///
/// Only the method and path are consulted; the body is never read.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();
    let method = req.method();
    let is_head = *method == Method::HEAD;

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let route = Route::resolve(method, req.uri().path());
    let response = build_route_response(route, &state.config.http.server_name, is_head);

    if state.access_log_enabled() {
        let entry = access_entry(&req, peer_addr, &response, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Build the fixed response for a resolved route
pub fn build_route_response(route: Route, server_name: &str, is_head: bool) -> HttpResponse {
    match route {
        Route::Welcome => {
            http::build_text_response(route.status(), WELCOME_TEXT, server_name, is_head)
        }
        Route::ApiTest => http::build_json_response(
            route.status(),
            &ApiMessage::new(API_TEST_MESSAGE),
            server_name,
            is_head,
        ),
        Route::NotFound => http::build_not_found_response(server_name, is_head),
    }
}

fn access_entry<B>(
    req: &Request<B>,
    peer_addr: SocketAddr,
    response: &HttpResponse,
    started: Instant,
) -> AccessLogEntry {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = body_len(response);
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

/// Bytes actually sent: 0 for HEAD, otherwise the declared length
fn body_len(response: &HttpResponse) -> usize {
    usize::try_from(response.body().size_hint().exact().unwrap_or(0)).unwrap_or(usize::MAX)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
