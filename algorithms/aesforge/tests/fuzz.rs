//! Bolero Fuzz Tests
//!
//! These tests can be run as property tests via `cargo test`
//! or as full fuzz targets via `cargo bolero test [target_name]`.

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(missing_docs)]

/// Fuzz test module
#[cfg(test)]
mod fuzz {
    mod roundtrip;
}
