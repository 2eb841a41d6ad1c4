//! Host-based request dispatch.
//!
//! # Responsibilities
//! - Hold the live routing table behind an atomic reference
//! - Look up each request's `Host` header against one table snapshot
//! - Forward matched requests, hand everything else to the next handler
//! - Turn forwarder failures into a fixed 500 response
//!
//! # Design Decisions
//! - `ArcSwap` gives lock-free reads; a dispatch holds the `Arc` it loaded
//!   until it finishes, so a swap never affects requests in flight
//! - Tables are replaced wholesale, never patched
//! - Version assignment and swap happen under one lock, so concurrent
//!   writers always leave the newest version live
//! - Unmatched hosts are not errors

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::http::response::proxy_error;
use crate::observability::metrics;
use crate::routing::table::{RouteRecord, RoutingTable, TableBuilder};

/// Owns the live routing table.
pub struct Dispatcher {
    table: ArcSwap<RoutingTable>,
    builder: TableBuilder,
    /// Next version to hand out. Held across build and swap.
    next_version: Mutex<u64>,
}

impl Dispatcher {
    /// Create a dispatcher with an empty table.
    pub fn new(builder: TableBuilder) -> Self {
        Self {
            table: ArcSwap::from_pointee(RoutingTable::empty()),
            builder,
            next_version: Mutex::new(1),
        }
    }

    /// Create a dispatcher already serving `records`.
    pub fn with_routes(builder: TableBuilder, records: &[RouteRecord]) -> Self {
        let dispatcher = Self::new(builder);
        dispatcher.update_config(records);
        dispatcher
    }

    /// The table new dispatches will see.
    pub fn current(&self) -> Arc<RoutingTable> {
        self.table.load_full()
    }

    /// Build a table from `records` and make it live. Returns its version.
    pub fn update_config(&self, records: &[RouteRecord]) -> u64 {
        tracing::info!(count = records.len(), "Received routing configuration");
        let mut next = self
            .next_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let version = *next;
        *next += 1;

        let table = self.builder.build(records, version);
        self.swap_table(table);
        version
    }

    /// Replace the live table. Dispatches that already loaded the old
    /// table finish against it. Callers hold `next_version`.
    fn swap_table(&self, table: RoutingTable) {
        let routes = table.len();
        let version = table.version();
        let previous = self.table.swap(Arc::new(table));
        metrics::set_route_count(routes);
        tracing::info!(
            version,
            previous_version = previous.version(),
            routes,
            "Routing table swapped"
        );
    }

    /// Route one request. `Err` gives the request back for the next handler.
    pub async fn dispatch(&self, request: Request<Body>) -> Result<Response, Request<Body>> {
        let Some(host) = request
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned)
        else {
            tracing::debug!("Request without usable Host header, falling through");
            metrics::record_dispatch("fallthrough");
            return Err(request);
        };

        let table = self.current();
        let Some(forwarder) = table.lookup(&host).cloned() else {
            tracing::debug!(host = %host, "No matching route, falling through");
            metrics::record_dispatch("fallthrough");
            return Err(request);
        };

        tracing::debug!(
            host = %host,
            route = %forwarder.name(),
            target = %forwarder.target(),
            version = table.version(),
            "Proxying request"
        );

        let start = Instant::now();
        let result = forwarder.forward(request).await;
        metrics::record_upstream(&host, start);

        match result {
            Ok(response) => {
                metrics::record_dispatch("proxied");
                Ok(response)
            }
            Err(e) => {
                tracing::error!(
                    host = %host,
                    target = %forwarder.target(),
                    error = %e,
                    "Proxy error"
                );
                metrics::record_dispatch("proxy_error");
                Ok(proxy_error())
            }
        }
    }
}

/// Axum middleware: proxy routed hosts, pass the rest down the stack.
pub async fn dispatch_middleware(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match dispatcher.dispatch(request).await {
        Ok(response) => response,
        Err(request) => next.run(request).await,
    }
}
