//! Provenant backend conformance test suite (P1-P8).
//!
//! Provides a `TestableBackend` trait and `provenance_conformance_tests!`
//! macro for validating any backend implementation against the core's
//! testable properties: single-flight channel creation, total decoding,
//! history ordering, corrupt-entry preservation, not-found/failure
//! distinction, and the record/registry/retry scenarios.

pub mod fixtures;
pub mod suite;
pub mod tests;
pub mod traits;

pub use traits::*;
