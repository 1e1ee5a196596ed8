//! The `provenance_conformance_tests!` macro.
//!
//! Generates one `#[tokio::test]` function per conformance property P1
//! through P8, for any type that implements `TestableBackend`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use provenant_conformance::provenance_conformance_tests;
//!
//! struct MyBackend { /* ... */ }
//!
//! impl MyBackend {
//!     fn new() -> Self { MyBackend {} }
//! }
//!
//! // Implement TestableBackend for MyBackend ...
//!
//! provenance_conformance_tests!(MyBackend::new());
//! ```
//!
//! Each generated test function is named `conformance_pNN_<description>`
//! and can be run with `cargo test conformance_` to execute the suite.

/// Generate conformance tests for a backend implementation.
///
/// The `$backend_expr` expression is evaluated fresh for each test, so
/// each test gets an independent backend instance. Tests can be run in
/// any order.
#[macro_export]
macro_rules! provenance_conformance_tests {
    ($backend_expr:expr) => {
        #[tokio::test]
        async fn conformance_p01_channel_single_flight() {
            let backend = $backend_expr;
            $crate::tests::p01_channel_single_flight::test_p01_channel_single_flight(&backend)
                .await
                .expect("P1: channel single-flight conformance failed");
        }

        #[tokio::test]
        async fn conformance_p02_decode_total() {
            let backend = $backend_expr;
            $crate::tests::p02_decode_total::test_p02_decode_total(&backend)
                .await
                .expect("P2: total decode conformance failed");
        }

        #[tokio::test]
        async fn conformance_p03_history_ordering() {
            let backend = $backend_expr;
            $crate::tests::p03_history_ordering::test_p03_history_ordering(&backend)
                .await
                .expect("P3: history ordering conformance failed");
        }

        #[tokio::test]
        async fn conformance_p04_corrupt_preserved() {
            let backend = $backend_expr;
            $crate::tests::p04_corrupt_preserved::test_p04_corrupt_preserved(&backend)
                .await
                .expect("P4: corrupt preservation conformance failed");
        }

        #[tokio::test]
        async fn conformance_p05_not_found_distinct() {
            let backend = $backend_expr;
            $crate::tests::p05_not_found_distinct::test_p05_not_found_distinct(&backend)
                .await
                .expect("P5: not-found distinction conformance failed");
        }

        #[tokio::test]
        async fn conformance_p06_record_then_history() {
            let backend = $backend_expr;
            $crate::tests::p06_record_then_history::test_p06_record_then_history(&backend)
                .await
                .expect("P6: record-then-history conformance failed");
        }

        #[tokio::test]
        async fn conformance_p07_registry_lifecycle() {
            let backend = $backend_expr;
            $crate::tests::p07_registry_lifecycle::test_p07_registry_lifecycle(&backend)
                .await
                .expect("P7: registry lifecycle conformance failed");
        }

        #[tokio::test]
        async fn conformance_p08_mirror_retry() {
            let backend = $backend_expr;
            $crate::tests::p08_mirror_retry::test_p08_mirror_retry(&backend)
                .await
                .expect("P8: mirror retry conformance failed");
        }
    };
}
