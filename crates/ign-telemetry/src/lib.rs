//! This crate contains the tracing primitives used by the translator binary to
//! emit human readable console logs and structured file logs.
pub mod tracing;

pub use crate::tracing::{TelemetryOptions, Tracing};
