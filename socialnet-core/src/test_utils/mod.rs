//! Test utilities shared by unit and integration tests
//!
//! Fixtures build requests and seed stores; the doubles stand in for the
//! store, cache and clock when a test needs to count calls, inject failures
//! or control time.

pub mod assertions;
pub mod doubles;
pub mod fixtures;

pub use assertions::*;
pub use doubles::*;
pub use fixtures::*;
