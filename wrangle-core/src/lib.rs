//! # wrangle-core
//!
//! Core vocabulary for the Wrangle handler-dispatch layer.
//!
//! This crate has minimal dependencies and is designed to be imported by host
//! integrations that only need the types, not the standard invokers in
//! `wrangle-std`.
//!
//! # Handler Shapes
//!
//! An event-driven host fires handlers registered by application code. Those
//! handlers come in several execution models, all captured by [`RawHandler`]:
//!
//! - **Absent**: nothing registered
//! - **Native**: an opaque toolkit callback ([`NativeHandle`]) the host calls itself
//! - **Sync**: runs to completion on the host thread
//! - **Long-running**: a [`LongRunning`] state machine, resumed across host turns
//!   according to the [`Step`] it returns
//! - **Async**: a future spawned as an independent task
//!
//! [`RawHandler::strategy`] classifies a handler into its [`Strategy`].
//!
//! # Host Seams
//!
//! The host loop is reached only through [`Scheduler`] (call soon / call
//! later), [`TaskRunner`] (spawn) and [`Reporter`] (the logging sink).
//!
//! # Error Types
//!
//! - [`HandlerFault`] - A caught failure tagged with its [`FaultKind`]
//! - [`CallError`] - The failure itself: an error value or a panic

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod handler;
mod host;
mod payload;
mod report;
mod step;

// Re-exports
pub use error::{BoxError, CallError, FaultKind, HandlerFault};
pub use handler::{AsyncFn, Cleanup, LongRunningFn, NativeHandle, RawHandler, Strategy, SyncFn};
pub use host::{BoxFuture, Job, Scheduler, TaskHandle, TaskRunner};
pub use payload::{Output, Payload};
pub use report::Reporter;
pub use step::{FromFn, LongRunning, Step, from_fn};
