//! Inbound adapters that translate external triggers into domain calls
//! while keeping framework details at the edge.
//!
//! - [`http`]: Actix routes for RPC, events, admin, and probes.
//! - [`scheduler`]: the interval task driving trending recompute.

pub mod http;
pub mod scheduler;
