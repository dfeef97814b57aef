//! Testing utilities for Wrangle.
//!
//! This module provides a deterministic host and a recording sink so handler
//! dispatch can be tested without a real event loop or wall-clock sleeps.
//!
//! # Features
//!
//! - [`ManualHost`]: A virtual-clock host implementing both [`Scheduler`] and
//!   [`TaskRunner`], advanced explicitly by the test
//! - [`RecordingReporter`]: A reporter that records every fault it receives

use futures::task::{ArcWake, waker_ref};
use std::{
    collections::BTreeMap,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll, Waker},
    time::Duration,
};
use wrangle_core::{
    BoxFuture, CallError, FaultKind, HandlerFault, Job, Reporter, Scheduler, TaskHandle,
    TaskRunner,
};

// ============================================================================
// Manual Host
// ============================================================================

/// A host loop driven by hand, with a virtual clock.
///
/// Jobs queued with `call_soon` are due "now"; jobs queued with `call_later`
/// are due once the clock has moved past their delay. Nothing runs until the
/// test calls [`turn`](Self::turn), [`run_until_idle`](Self::run_until_idle)
/// or [`advance`](Self::advance).
///
/// # Example
///
/// ```rust,ignore
/// let host = ManualHost::new();
/// let wrapped = Dispatcher::builder().host(host.clone()).build()?.wrap(...);
///
/// wrapped.call(args);
/// host.advance(Duration::from_millis(10));
/// ```
#[derive(Clone, Default)]
pub struct ManualHost {
    queue: Arc<Mutex<Queue>>,
}

#[derive(Default)]
struct Queue {
    now: Duration,
    seq: u64,
    jobs: BTreeMap<(Duration, u64), Job>,
}

impl ManualHost {
    /// Create a host with its clock at zero and nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current virtual time.
    pub fn now(&self) -> Duration {
        self.queue.lock().unwrap().now
    }

    /// The number of queued jobs, due or not.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().jobs.len()
    }

    /// When the earliest queued job is due.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue
            .lock()
            .unwrap()
            .jobs
            .keys()
            .next()
            .map(|(due, _)| *due)
    }

    /// Run one host turn: every job due at the start of the turn, in order.
    ///
    /// Jobs queued while the turn runs wait for a later turn. Returns the
    /// number of jobs run.
    pub fn turn(&self) -> usize {
        let ready = {
            let mut queue = self.queue.lock().unwrap();
            let now = queue.now;
            let later = queue.jobs.split_off(&(now, u64::MAX));
            std::mem::replace(&mut queue.jobs, later)
        };
        let count = ready.len();
        for job in ready.into_values() {
            job();
        }
        count
    }

    /// Run turns until no job is due at the current time.
    ///
    /// Never returns if jobs keep rescheduling themselves without delay.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            match self.turn() {
                0 => return total,
                n => total += n,
            }
        }
    }

    /// Move the clock forward by `by`, running every job that falls due on
    /// the way at its own due time.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        let mut total = self.run_until_idle();
        while let Some(due) = self.next_due().filter(|due| *due <= target) {
            self.set_now(due);
            total += self.run_until_idle();
        }
        self.set_now(target);
        total + self.run_until_idle()
    }

    /// Move the clock forward by `by` without running anything.
    pub fn skip(&self, by: Duration) {
        let mut queue = self.queue.lock().unwrap();
        queue.now = queue.now.saturating_add(by);
    }

    /// A future that completes once the clock has moved `delay` past now.
    ///
    /// The timer starts when `sleep` is called, not when the future is
    /// first polled.
    pub fn sleep(&self, delay: Duration) -> Sleep {
        let state = Arc::new(Mutex::new(SleepState::default()));
        let timer = state.clone();
        self.call_later(
            delay,
            Box::new(move || {
                let waker = {
                    let mut state = timer.lock().unwrap();
                    state.fired = true;
                    state.waker.take()
                };
                if let Some(waker) = waker {
                    waker.wake();
                }
            }),
        );
        Sleep { state }
    }

    fn set_now(&self, now: Duration) {
        let mut queue = self.queue.lock().unwrap();
        if now > queue.now {
            queue.now = now;
        }
    }

    fn push(&self, delay: Duration, job: Job) {
        let mut queue = self.queue.lock().unwrap();
        let due = queue.now.saturating_add(delay);
        queue.seq += 1;
        let seq = queue.seq;
        queue.jobs.insert((due, seq), job);
    }
}

impl Scheduler for ManualHost {
    fn call_soon(&self, job: Job) {
        self.push(Duration::ZERO, job);
    }

    fn call_later(&self, delay: Duration, job: Job) {
        self.push(delay, job);
    }
}

impl TaskRunner for ManualHost {
    fn spawn(&self, task: BoxFuture<'static, ()>) -> TaskHandle {
        let (handle, task) = TaskHandle::track(task);
        let task = Arc::new(ManualTask {
            future: Mutex::new(Some(task)),
            host: self.clone(),
        });
        self.call_soon(Box::new(move || task.run()));
        handle
    }
}

/// A spawned task; each wake queues one poll as a `call_soon` job.
struct ManualTask {
    future: Mutex<Option<BoxFuture<'static, ()>>>,
    host: ManualHost,
}

impl ManualTask {
    fn run(self: Arc<Self>) {
        let mut slot = self.future.lock().unwrap();
        if let Some(mut future) = slot.take() {
            let waker = waker_ref(&self);
            let mut cx = Context::from_waker(&waker);
            if future.as_mut().poll(&mut cx).is_pending() {
                *slot = Some(future);
            }
        }
    }
}

impl ArcWake for ManualTask {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let task = arc_self.clone();
        arc_self.host.call_soon(Box::new(move || task.run()));
    }
}

/// Future returned by [`ManualHost::sleep`].
pub struct Sleep {
    state: Arc<Mutex<SleepState>>,
}

#[derive(Default)]
struct SleepState {
    fired: bool,
    waker: Option<Waker>,
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.state.lock().unwrap();
        if state.fired {
            Poll::Ready(())
        } else {
            state.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

// ============================================================================
// Recording Reporter
// ============================================================================

/// A fault captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFault {
    /// The kind of the fault.
    pub kind: FaultKind,
    /// The one-line message, `<prefix>: <error>`.
    pub message: String,
    /// The full rendered report.
    pub report: String,
    /// Whether the failure was a panic rather than a returned error.
    pub panicked: bool,
}

/// A reporter that records every fault it receives.
///
/// Clones share the same record, so a clone can be handed to a dispatcher
/// while the test keeps the original for assertions.
///
/// # Example
///
/// ```rust,ignore
/// let reporter = RecordingReporter::new();
/// let dispatcher = Dispatcher::builder().host(host).reporter(reporter.clone()).build()?;
///
/// // ... invoke a failing handler ...
///
/// assert_eq!(reporter.kinds(), vec![FaultKind::HandlerError]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    faults: Arc<Mutex<Vec<RecordedFault>>>,
}

impl RecordingReporter {
    /// Create an empty recording reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of the recorded faults.
    pub fn faults(&self) -> Vec<RecordedFault> {
        self.faults.lock().unwrap().clone()
    }

    /// Get the number of recorded faults.
    pub fn count(&self) -> usize {
        self.faults.lock().unwrap().len()
    }

    /// The kinds of the recorded faults, in order.
    pub fn kinds(&self) -> Vec<FaultKind> {
        self.faults.lock().unwrap().iter().map(|f| f.kind).collect()
    }

    /// The one-line messages of the recorded faults, in order.
    pub fn messages(&self) -> Vec<String> {
        self.faults
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.message.clone())
            .collect()
    }

    /// The full rendered reports, in order.
    pub fn lines(&self) -> Vec<String> {
        self.faults
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.report.clone())
            .collect()
    }

    /// Clear all recorded faults.
    pub fn clear(&self) {
        self.faults.lock().unwrap().clear();
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, fault: &HandlerFault) {
        self.faults.lock().unwrap().push(RecordedFault {
            kind: fault.kind(),
            message: fault.to_string(),
            report: fault.render(),
            panicked: matches!(fault.error(), CallError::Panic(_)),
        });
    }
}
