// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Functional tests for ingress admission and webhook registration.
//!
//! These tests run complete admission reviews and registration cycles against
//! a mock cluster gateway, WITHOUT requiring a live Kubernetes cluster.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run specific test
//! cargo test --test functional test_duplicate_host_and_path_is_denied
//!
//! # Run with verbose output
//! cargo test --test functional -- --nocapture
//! ```
//!
//! ## Test Categories
//!
//! - **Admission tests**: Full review-to-response runs covering every
//!   hostname policy, duplicate detection across namespaces, and scan
//!   failures
//! - **Registration tests**: Webhook configuration install cycles including
//!   stale-config replacement and delete races between replicas
//!
//! ## Design Principles
//!
//! - **No K8s Required**: Tests run without any cluster infrastructure
//! - **Fast Execution**: All tests complete in milliseconds
//! - **Real Code Paths**: The mock gateway feeds the production `admit` and
//!   `install` functions rather than reimplementing them

mod admission_tests;
mod registration_tests;

// Re-export for use in tests
pub use mock_gateway::*;
