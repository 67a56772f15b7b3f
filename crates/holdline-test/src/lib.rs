//! Holdline Test Harness - Cooperative scheduling and stream validation
//!
//! This crate provides:
//! - A round-based scheduler resolving coordinated sync points
//! - An end-to-end producer/consumer harness
//! - Criterion benches for the sequence and commit paths

pub mod harness;
pub mod scheduler;

pub use harness::*;
pub use scheduler::*;
