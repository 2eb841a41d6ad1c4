//! Routing table and its builder.
//!
//! # Responsibilities
//! - Compile a configuration snapshot into `domain → Forwarder`
//! - Resolve duplicate domains (last record in input order wins)
//! - Stay immutable once built; reconfiguration builds a new table
//!
//! # Design Decisions
//! - No validation at build time: a malformed target yields a forwarder
//!   that fails when a request reaches it
//! - O(1) exact host lookup via HashMap, no normalization
//! - One HTTP client shared by every forwarder of every table version,
//!   so connection pools survive reconfiguration

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};

use crate::routing::forwarder::Forwarder;

/// Shared HTTP client used by all forwarders.
pub type HttpClient = Client<HttpConnector, Body>;

/// One proxy route as supplied by the route store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteRecord {
    /// Display name, used in logs only.
    pub name: String,

    /// Host header value this route answers to. The lookup key.
    pub domain: String,

    /// Backend `host:port`.
    #[serde(rename = "proxyTo")]
    pub target: String,
}

impl RouteRecord {
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            target: target.into(),
        }
    }
}

/// Immutable mapping from domain to forwarder.
#[derive(Debug, Default)]
pub struct RoutingTable {
    version: u64,
    routes: HashMap<String, Arc<Forwarder>>,
}

impl RoutingTable {
    /// A table that routes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Exact, case-sensitive lookup of a Host header value.
    pub fn lookup(&self, host: &str) -> Option<&Arc<Forwarder>> {
        self.routes.get(host)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Every routed domain, sorted.
    pub fn domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        domains.sort_unstable();
        domains
    }

    /// Backend target bound to a domain, if any.
    pub fn target_for(&self, domain: &str) -> Option<&str> {
        self.routes.get(domain).map(|f| f.target())
    }
}

/// Builds routing tables. Holds the forwarding client and the per-forwarder
/// deadline; otherwise stateless.
#[derive(Clone)]
pub struct TableBuilder {
    client: HttpClient,
    upstream_timeout: Duration,
}

impl TableBuilder {
    pub fn new(client: HttpClient, upstream_timeout: Duration) -> Self {
        Self {
            client,
            upstream_timeout,
        }
    }

    /// Builder with its own pooled client.
    pub fn with_timeouts(connect_timeout: Duration, upstream_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self::new(client, upstream_timeout)
    }

    pub fn upstream_timeout(&self) -> Duration {
        self.upstream_timeout
    }

    /// Compile `records` into a fresh table tagged with `version`.
    pub fn build<'a, I>(&self, records: I, version: u64) -> RoutingTable
    where
        I: IntoIterator<Item = &'a RouteRecord>,
    {
        let mut routes = HashMap::new();
        for record in records {
            tracing::debug!(
                name = %record.name,
                domain = %record.domain,
                target = %record.target,
                "Initializing forwarder"
            );
            let forwarder = Forwarder::new(
                record,
                self.client.clone(),
                self.upstream_timeout,
            );
            if let Some(previous) = routes.insert(record.domain.clone(), Arc::new(forwarder)) {
                tracing::warn!(
                    domain = %record.domain,
                    replaced = %previous.name(),
                    by = %record.name,
                    "Duplicate domain in configuration, last record wins"
                );
            }
        }
        RoutingTable { version, routes }
    }
}
