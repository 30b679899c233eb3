//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL city store using Diesel ORM
//! - **lock**: Redis `SET NX PX` idempotency keys
//! - **google_maps**: reverse/forward geocoding and place photos
//! - **rpc**: HTTP clients for the resolver and record-owning services
//! - **events**: webhook delivery of `cityCreated`
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod events;
pub mod google_maps;
pub mod lock;
pub mod persistence;
pub mod rpc;
