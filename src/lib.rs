//! Host-header routing proxy with a hot-swappable routing table.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod store;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::{Application, Shutdown};
pub use routing::{Dispatcher, RouteRecord, RoutingTable};
