//! # wrangle-std
//!
//! Standard implementations for the Wrangle handler-dispatch layer.
//!
//! This crate provides:
//! - **Invokers**: synchronous, cooperative (long-running) and async task
//!   strategies in [`invoke`]
//! - **Reporters**: `TracingReporter` and [`report::StderrReporter`]
//! - **Hosts**: `TokioHost` (feature `tokio`) in [`runtime`]
//! - **Testing**: [`testing::ManualHost`] and [`testing::RecordingReporter`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core vocabulary
pub use wrangle_core;

// Modules
pub mod invoke;
pub mod report;
pub mod runtime;
pub mod testing;
