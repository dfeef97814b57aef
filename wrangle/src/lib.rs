//! # wrangle - Uniform Dispatch for Event Handlers
//!
//! `wrangle` takes whatever application code registers as an event handler
//! (nothing, a native toolkit callback, a plain function, a long-running
//! step machine or an async function) and turns it into one thing the host
//! event loop can invoke the same way every time.
//!
//! Invoking a wrapped handler never blocks for longer than a synchronous
//! handler's own body and never fails: every failure inside a handler or its
//! cleanup is caught and reported with a fixed, per-strategy message prefix.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wrangle::prelude::*;
//!
//! let dispatcher = Dispatcher::tokio();
//! let button = Arc::new(Button::default());
//!
//! let on_press = dispatcher
//!     .wrap(button, RawHandler::sync(|button, press: Press| {
//!         button.clicks.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }), None)
//!     .into_handler()
//!     .unwrap();
//!
//! // Whenever the host fires the event:
//! on_press.call(Press::default());
//! ```
//!
//! ## Async Results
//!
//! [`AsyncResult`] is the future-like outcome of an asynchronous operation.
//! It is awaited or observed, never compared.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod dispatch;
mod result;
mod wrapped;

pub use dispatch::{BuildError, Dispatcher, DispatcherBuilder};
pub use result::{
    AsyncResult, AsyncResultError, Comparison, ComparisonError, Resolver, ResultKind, ResultState,
    Settled,
};
pub use wrapped::{Wrapped, WrappedHandler};

pub use wrangle_core::{
    AsyncFn,
    // Errors
    BoxError,
    BoxFuture,
    CallError,
    // Handlers
    Cleanup,
    FaultKind,
    FromFn,
    HandlerFault,
    // Host seams
    Job,
    LongRunning,
    LongRunningFn,
    NativeHandle,
    Output,
    Payload,
    RawHandler,
    Reporter,
    Scheduler,
    Step,
    Strategy,
    SyncFn,
    TaskHandle,
    TaskRunner,
    from_fn,
};

/// Standard reporters.
pub mod report {
    #![allow(clippy::wildcard_imports)]
    pub use wrangle_std::report::*;
}

/// Host loop integrations.
pub mod runtime {
    #![allow(clippy::wildcard_imports)]
    pub use wrangle_std::runtime::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use wrangle_std::testing::*;
}

/// Prelude module - common imports for Wrangle.
///
/// # Usage
///
/// ```rust,ignore
/// use wrangle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AsyncResult,
        // Errors
        BoxError,
        Cleanup,
        // Dispatch
        Dispatcher,
        LongRunning,
        RawHandler,
        ResultKind,
        Step,
        Wrapped,
        WrappedHandler,
        from_fn,
    };
    pub use std::sync::Arc;
}
