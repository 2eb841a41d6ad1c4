//! Responses the router produces itself.
//!
//! # Design Decisions
//! - Backend failures map to one fixed 500 body; error details stay in logs
//! - Proxied responses are streamed back untouched (see `routing::forwarder`)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Body sent to clients when a backend cannot be reached.
pub const PROXY_ERROR_BODY: &str = "Proxy Error";

/// The terminal response for a failed forward.
pub fn proxy_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, PROXY_ERROR_BODY).into_response()
}
