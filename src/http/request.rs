//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the client sent one
//! - Propagate the ID to the backend and back to the client
//! - Open a tracing span per request carrying host and request ID
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The ID header rides along on forwarded requests untouched

use axum::{
    body::Body,
    http::{header, HeaderName, Request},
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Assigns `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Copies `x-request-id` from the request onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Span for `TraceLayer`.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let header_str = |name: &HeaderName| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_owned()
    };
    tracing::info_span!(
        "request",
        request_id = %header_str(&X_REQUEST_ID),
        host = %header_str(&header::HOST),
        method = %request.method(),
        uri = %request.uri(),
    )
}
