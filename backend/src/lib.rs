//! City resolution service library.
//!
//! Domain services live in [`domain`]; [`inbound`] and [`outbound`] hold the
//! Actix and infrastructure adapters around them.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
