//! Typed client for the Spectre PSE ink! contract.
//!
//! Encodes messages against the versioned contract ABI, dry-runs them through a
//! chain node, and builds, signs and submits the state-changing calls.

pub mod abi;
pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
