//! This library provides a strongly-typed and validated Ignition config spec
//! version. Spec versions are written as `<MAJOR>.<MINOR>.0`, the patch level
//! is always zero for released specs.
//!
//! ## Usage
//!
//! Versions can be parsed and validated from [`str`] using Rust's standard
//! [`FromStr`](std::str::FromStr) trait.
//!
//! ```
//! # use std::str::FromStr;
//! use ign_version::SpecVersion;
//!
//! let version = SpecVersion::from_str("3.1.0").expect("valid spec version");
//! assert_eq!(version, SpecVersion::V3_1);
//!
//! // Or using .parse()
//! let version: SpecVersion = "2.4.0".parse().expect("valid spec version");
//! assert!(version < SpecVersion::V3_0);
//! ```

// NOTE: The rstest_reuse templates need the crate in scope at the root.
#[cfg(test)]
use rstest_reuse::{self};

mod version;

pub use version::*;
