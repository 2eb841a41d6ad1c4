//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (enforce per-forwarder deadline)
//!     → On failure: terminal 500 for that request, no retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - One slow backend never holds tasks beyond its deadline

pub mod timeouts;
