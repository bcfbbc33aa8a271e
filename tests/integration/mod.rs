//! Integration test suite for brewer
//!
//! End-to-end tests that drive the `brewer` binary against temporary Poetry
//! projects. Every fixture pins its dependencies to git repositories, so no test
//! needs a package index.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **create**: Rendering formulas to stdout and to files
//! - **update**: Reconciling existing formulas, revision bumps and `--diff`
//! - **errors**: Exit status and messages for broken inputs

#[path = "../common/mod.rs"]
mod common;

mod create;
mod errors;
mod update;
