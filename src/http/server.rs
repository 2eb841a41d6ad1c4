//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout, host dispatch)
//! - Bind server to listener
//! - Hand unmatched hosts to the control-plane routes and static fallback

use std::sync::Arc;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{legacy_router, setup_admin_router, ControlPlane};
use crate::config::ProxyConfig;
use crate::http::fallback::static_fallback;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::ShutdownSignal;
use crate::routing::dispatch_middleware;

/// HTTP server for the domain router.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server. The control plane carries the dispatcher.
    pub fn new(config: ProxyConfig, control: Arc<ControlPlane>) -> Self {
        let router = Self::build_router(&config, control);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `GET /reload-config` answers for every host. Everything else goes
    /// through host dispatch first, so a routed host is proxied whatever
    /// its path; only unrouted hosts reach the control-plane API and
    /// static files.
    #[allow(deprecated)]
    pub fn build_router(config: &ProxyConfig, control: Arc<ControlPlane>) -> Router {
        let dispatcher = control.dispatcher().clone();
        let dispatched = setup_admin_router(control, &config.admin)
            .fallback_service(static_fallback(&config.static_files))
            .layer(middleware::from_fn_with_state(dispatcher, dispatch_middleware));

        legacy_router()
            .merge(dispatched)
            .layer(TimeoutLayer::new(config.timeouts.request()))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    /// Run the server until a shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            upstream_timeout_secs = self.config.timeouts.upstream_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
