//! Integration test crate for the Ballast collateral engine.
//!
//! This crate has no library code — it only contains integration tests
//! that exercise end-to-end collateral flows across multiple workspace
//! crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p ballast-integration-tests
//! ```
