//! Per-domain request forwarder.
//!
//! # Responsibilities
//! - Rewrite the request URI and `Host` header to the backend origin
//! - Send the request through the shared pooled client
//! - Bound the wait for the response head with a deadline, and every
//!   pause in the response body with the same duration
//!
//! # Design Decisions
//! - Target parsed once at build time; a bad target is kept and reported
//!   as a forward error on every request that reaches it
//! - Cookie domains are passed through untouched
//! - No retries: a failure is terminal for that request only

use std::str::FromStr;
use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{header, HeaderValue, Request, Response, Uri, Version};
use thiserror::Error;
use tower_http::timeout::TimeoutBody;

use crate::resilience::timeouts::{with_deadline, DeadlineExceeded};
use crate::routing::table::{HttpClient, RouteRecord};

/// Why a request could not be forwarded.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The route's target is not a valid `host:port` authority.
    #[error("invalid target '{0}'")]
    InvalidTarget(String),

    /// Connection refused, reset, DNS failure and the like.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The backend did not answer within the forwarder deadline.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),
}

/// Proxies requests for one domain to one backend.
#[derive(Debug)]
pub struct Forwarder {
    name: String,
    target: String,
    authority: Option<Authority>,
    host: Option<HeaderValue>,
    client: HttpClient,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(record: &RouteRecord, client: HttpClient, timeout: Duration) -> Self {
        let authority = Authority::from_str(&record.target).ok();
        let host = authority
            .as_ref()
            .and_then(|a| HeaderValue::from_str(a.as_str()).ok());
        Self {
            name: record.name.clone(),
            target: record.target.clone(),
            authority,
            host,
            client,
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Forward `request` to the backend and return its response unmodified.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        let request = self.rewrite(request)?;
        let response = with_deadline(self.timeout, self.client.request(request))
            .await
            .map_err(|DeadlineExceeded(d)| ForwardError::Timeout(d))??;

        // A backend that stalls mid-body ends the stream with an error.
        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(
            parts,
            Body::new(TimeoutBody::new(self.timeout, body)),
        ))
    }

    /// Point the request at the backend origin.
    fn rewrite(&self, request: Request<Body>) -> Result<Request<Body>, ForwardError> {
        let (authority, host) = match (&self.authority, &self.host) {
            (Some(a), Some(h)) => (a.clone(), h.clone()),
            _ => return Err(ForwardError::InvalidTarget(self.target.clone())),
        };

        let (mut parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        parts.uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(authority)
            .path_and_query(path_and_query)
            .build()?;
        // The backend pool speaks HTTP/1.1 whatever the client used.
        parts.version = Version::HTTP_11;
        parts.headers.insert(header::HOST, host);

        Ok(Request::from_parts(parts, body))
    }
}
