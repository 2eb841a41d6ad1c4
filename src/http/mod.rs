//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, request span)
//!     → routing::dispatch (Host lookup → forward, or fall through)
//!     → admin routes (/api/rpc, /reload-config)
//!     → fallback.rs (static files / index document)
//!     → response.rs (fixed error responses)
//! ```

pub mod fallback;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
