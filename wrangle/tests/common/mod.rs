#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use wrangle::{
    BoxError, Cleanup, Dispatcher, LongRunning, RawHandler, Step, WrappedHandler,
    runtime::tokio::TokioHost,
    testing::{ManualHost, RecordingReporter},
};

// ============================================================================
// Test Receiver and Arguments
// ============================================================================

#[derive(Debug, Default)]
pub struct Widget {
    pub id: u32,
}

/// Positional and keyword arguments as the host would pass them.
#[derive(Clone, Debug, PartialEq)]
pub struct Args {
    pub args: Vec<&'static str>,
    pub kwargs: BTreeMap<&'static str, i64>,
}

pub fn press() -> Args {
    Args {
        args: vec!["arg1", "arg2"],
        kwargs: BTreeMap::from([("kwarg1", 3), ("kwarg2", 4)]),
    }
}

// ============================================================================
// Call Recording
// ============================================================================

#[derive(Default)]
pub struct HandlerCall {
    pub receiver: Option<Arc<Widget>>,
    pub args: Option<Args>,
    pub slept: bool,
    pub done: bool,
}

impl HandlerCall {
    pub fn record(&mut self, receiver: &Arc<Widget>, args: Args) {
        self.receiver = Some(receiver.clone());
        self.args = Some(args);
    }

    /// Whether the handler saw exactly `receiver` and [`press`].
    pub fn saw(&self, receiver: &Arc<Widget>) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|seen| Arc::ptr_eq(seen, receiver))
            && self.args == Some(press())
    }
}

pub type Calls = Arc<Mutex<HandlerCall>>;

pub fn calls() -> Calls {
    Arc::default()
}

/// Values a cleanup was called with, alongside the receiver it got.
pub type CleanupCalls = Arc<Mutex<Vec<(Arc<Widget>, i32)>>>;

pub fn recording_cleanup() -> (Cleanup<Widget, i32>, CleanupCalls) {
    let seen: CleanupCalls = Arc::default();
    let sink = seen.clone();
    let cleanup = Cleanup::new(move |widget: &Arc<Widget>, value: i32| {
        sink.lock().unwrap().push((widget.clone(), value));
        Ok(())
    });
    (cleanup, seen)
}

pub fn failing_cleanup() -> Cleanup<Widget, i32> {
    Cleanup::new(|_widget: &Arc<Widget>, _value: i32| Err("Problem in cleanup".into()))
}

/// Assert a cleanup ran exactly once, with `receiver` and 42.
pub fn assert_cleaned_once(seen: &CleanupCalls, receiver: &Arc<Widget>) {
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1, "cleanup should run exactly once");
    assert!(Arc::ptr_eq(&seen[0].0, receiver));
    assert_eq!(seen[0].1, 42);
}

// ============================================================================
// Long-Running Handlers
// ============================================================================

/// Records its arguments, sleeps 10ms, yields once, then completes with 42.
pub struct SleepyHandler {
    stage: u8,
    receiver: Arc<Widget>,
    args: Option<Args>,
    calls: Calls,
}

impl SleepyHandler {
    pub fn raw(calls: Calls) -> RawHandler<Widget, Args, i32> {
        RawHandler::long_running(move |receiver: &Arc<Widget>, args: Args| SleepyHandler {
            stage: 0,
            receiver: receiver.clone(),
            args: Some(args),
            calls: calls.clone(),
        })
    }
}

impl LongRunning for SleepyHandler {
    type Output = i32;

    fn resume(&mut self) -> Result<Step<i32>, BoxError> {
        self.stage += 1;
        let mut calls = self.calls.lock().unwrap();
        Ok(match self.stage {
            1 => {
                if let Some(args) = self.args.take() {
                    calls.record(&self.receiver, args);
                }
                Step::sleep_secs(0.01)
            }
            2 => {
                calls.slept = true;
                Step::Yield
            }
            _ => {
                calls.done = true;
                Step::Complete(42)
            }
        })
    }
}

/// Records its arguments, sleeps 10ms, then fails.
pub struct FailingHandler {
    stage: u8,
    receiver: Arc<Widget>,
    args: Option<Args>,
    calls: Calls,
}

impl FailingHandler {
    pub fn raw(calls: Calls) -> RawHandler<Widget, Args, i32> {
        RawHandler::long_running(move |receiver: &Arc<Widget>, args: Args| FailingHandler {
            stage: 0,
            receiver: receiver.clone(),
            args: Some(args),
            calls: calls.clone(),
        })
    }
}

impl LongRunning for FailingHandler {
    type Output = i32;

    fn resume(&mut self) -> Result<Step<i32>, BoxError> {
        self.stage += 1;
        if self.stage > 1 {
            return Err("Problem in handler".into());
        }
        if let Some(args) = self.args.take() {
            self.calls.lock().unwrap().record(&self.receiver, args);
        }
        Ok(Step::Sleep(Duration::from_millis(10)))
    }
}

// ============================================================================
// Dispatchers
// ============================================================================

/// A dispatcher on a manual host, recording faults.
pub fn manual_dispatcher() -> (Dispatcher, ManualHost, RecordingReporter) {
    let host = ManualHost::new();
    let reporter = RecordingReporter::new();
    let dispatcher = Dispatcher::builder()
        .host(host.clone())
        .reporter(reporter.clone())
        .build()
        .unwrap();
    (dispatcher, host, reporter)
}

/// A dispatcher on the current tokio runtime, recording faults.
pub fn tokio_dispatcher() -> (Dispatcher, RecordingReporter) {
    let reporter = RecordingReporter::new();
    let dispatcher = Dispatcher::builder()
        .host(TokioHost::current())
        .reporter(reporter.clone())
        .build()
        .unwrap();
    (dispatcher, reporter)
}

pub fn wrap<T>(
    dispatcher: &Dispatcher,
    receiver: &Arc<Widget>,
    raw: RawHandler<Widget, Args, T>,
    cleanup: Option<Cleanup<Widget, T>>,
) -> WrappedHandler<Widget, Args, T>
where
    T: Send + 'static,
{
    dispatcher
        .wrap(receiver.clone(), raw, cleanup)
        .into_handler()
        .expect("not a native handler")
}

/// Give the host loop up to five 10ms turns to finish the handler.
pub async fn wait_until_done(calls: &Calls) {
    for _ in 0..5 {
        if calls.lock().unwrap().done {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
