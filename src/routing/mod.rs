//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header)
//!     → dispatch.rs (load live table, exact host lookup)
//!     → forwarder.rs (rewrite origin, forward with deadline)
//!     → Return: backend response, fixed 500, or next handler
//!
//! Reconfiguration:
//!     RouteRecord[]
//!     → table.rs (build domain → Forwarder map, last write wins)
//!     → dispatch.rs (atomic swap of Arc<RoutingTable>)
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; every change builds a new one
//! - Exact Host match, no normalization or port stripping
//! - Single writer (the control plane), lock-free readers

pub mod dispatch;
pub mod forwarder;
pub mod table;

pub use dispatch::{dispatch_middleware, Dispatcher};
pub use forwarder::{ForwardError, Forwarder};
pub use table::{HttpClient, RouteRecord, RoutingTable, TableBuilder};
