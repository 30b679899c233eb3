//! Test utilities for the backend crate.
//!
//! In-memory adapters shared by unit tests (in `src/`) and integration tests
//! (in `tests/`). Compiled for tests and behind the `test-support` feature.

pub mod cities;
pub mod geocoding;
pub mod records;
pub mod runtime;
