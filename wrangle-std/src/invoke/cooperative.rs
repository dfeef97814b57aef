//! Cooperative driver for long-running handlers.
//!
//! Each invocation builds a fresh [`LongRunning`] body and hands it to the
//! host's [`Scheduler`]. Every step runs inside a scheduled job, never inside
//! the dispatch call, and the step's answer decides how the next one is
//! scheduled:
//!
//! | Step | Next step |
//! |---|---|
//! | `Sleep(d)`, `d > 0` | `call_later(d)` |
//! | `Sleep(0)` or `Yield` | `call_soon` |
//! | `Complete(value)` | none; cleanup runs with `value` |
//! | `Err` or panic | none; reported, no cleanup |

use super::{guard, run_cleanup};
use std::sync::Arc;
use wrangle_core::{
    Cleanup, FaultKind, HandlerFault, LongRunning, LongRunningFn, Reporter, Scheduler, Step,
};

/// Start a long-running handler. Returns before its first step runs.
///
/// Failures while building or stepping the body are reported as
/// [`FaultKind::LongRunningHandlerError`]; a failing cleanup as
/// [`FaultKind::LongRunningHandlerCleanupError`].
pub fn invoke<R, E, T>(
    receiver: &Arc<R>,
    handler: &LongRunningFn<R, E, T>,
    cleanup: Option<&Cleanup<R, T>>,
    scheduler: &Arc<dyn Scheduler>,
    reporter: &Arc<dyn Reporter>,
    args: E,
) where
    R: Send + Sync + 'static,
    T: 'static,
{
    let body = match guard(|| Ok(handler(receiver, args))) {
        Ok(body) => body,
        Err(err) => {
            reporter.report(&HandlerFault::new(FaultKind::LongRunningHandlerError, err));
            return;
        }
    };

    let run = Box::new(CooperativeRun {
        receiver: receiver.clone(),
        body,
        cleanup: cleanup.cloned(),
        scheduler: scheduler.clone(),
        reporter: reporter.clone(),
        steps: 0,
    });
    run.resume_soon();
}

/// The state of one invocation of a long-running handler.
struct CooperativeRun<R, T> {
    receiver: Arc<R>,
    body: Box<dyn LongRunning<Output = T>>,
    cleanup: Option<Cleanup<R, T>>,
    scheduler: Arc<dyn Scheduler>,
    reporter: Arc<dyn Reporter>,
    steps: usize,
}

impl<R, T> CooperativeRun<R, T>
where
    R: Send + Sync + 'static,
    T: 'static,
{
    fn resume_soon(self: Box<Self>) {
        let scheduler = self.scheduler.clone();
        scheduler.call_soon(Box::new(move || self.advance()));
    }

    fn resume_later(self: Box<Self>, delay: std::time::Duration) {
        let scheduler = self.scheduler.clone();
        scheduler.call_later(delay, Box::new(move || self.advance()));
    }

    fn advance(mut self: Box<Self>) {
        self.steps += 1;
        match guard(|| self.body.resume()) {
            Ok(Step::Complete(value)) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(steps = self.steps, "long running handler completed");
                run_cleanup(
                    FaultKind::LongRunningHandlerCleanupError,
                    &self.receiver,
                    self.cleanup.as_ref(),
                    value,
                    &*self.reporter,
                );
            }
            Ok(step) => match step.delay() {
                Some(delay) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(steps = self.steps, ?delay, "long running handler sleeping");
                    self.resume_later(delay);
                }
                None => self.resume_soon(),
            },
            Err(err) => {
                self.reporter
                    .report(&HandlerFault::new(FaultKind::LongRunningHandlerError, err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualHost, RecordingReporter};
    use std::{sync::Mutex, time::Duration};
    use wrangle_core::{BoxError, from_fn};

    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct Fixture {
        host: ManualHost,
        reporter: RecordingReporter,
        scheduler: Arc<dyn Scheduler>,
        sink: Arc<dyn Reporter>,
        receiver: Arc<()>,
    }

    fn fixture() -> Fixture {
        let host = ManualHost::new();
        let reporter = RecordingReporter::new();
        Fixture {
            scheduler: Arc::new(host.clone()),
            sink: Arc::new(reporter.clone()),
            host,
            reporter,
            receiver: Arc::new(()),
        }
    }

    /// Sleeps 10ms, yields, then completes with 42.
    fn sleepy(log: Log) -> LongRunningFn<(), (), u32> {
        Arc::new(move |_r: &Arc<()>, _args: ()| {
            let log = log.clone();
            let mut stage = 0;
            Box::new(from_fn(move || -> Result<Step<u32>, BoxError> {
                stage += 1;
                Ok(match stage {
                    1 => Step::Sleep(Duration::from_millis(10)),
                    2 => {
                        log.lock().unwrap().push("slept");
                        Step::Yield
                    }
                    _ => {
                        log.lock().unwrap().push("done");
                        Step::Complete(42)
                    }
                })
            })) as Box<dyn LongRunning<Output = u32>>
        })
    }

    #[test]
    fn test_never_steps_inside_the_call() {
        let f = fixture();
        let log: Log = Arc::default();

        invoke(&f.receiver, &sleepy(log.clone()), None, &f.scheduler, &f.sink, ());

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(f.host.pending(), 1);
    }

    #[test]
    fn test_sleep_waits_for_delay() {
        let f = fixture();
        let log: Log = Arc::default();

        invoke(&f.receiver, &sleepy(log.clone()), None, &f.scheduler, &f.sink, ());

        // First step runs and asks for a 10ms sleep.
        f.host.run_until_idle();
        assert!(log.lock().unwrap().is_empty());

        f.host.advance(Duration::from_millis(9));
        assert!(log.lock().unwrap().is_empty());

        // The step after the sleep yields; the one after that needs another turn.
        f.host.advance(Duration::from_millis(1));
        assert_eq!(*log.lock().unwrap(), vec!["slept", "done"]);
        assert_eq!(f.host.pending(), 0);
    }

    #[test]
    fn test_yield_resumes_on_a_later_turn() {
        let f = fixture();
        let log: Log = Arc::default();

        invoke(&f.receiver, &sleepy(log.clone()), None, &f.scheduler, &f.sink, ());

        // First step asks for a sleep; nothing else is due yet.
        assert_eq!(f.host.turn(), 1);
        assert_eq!(f.host.turn(), 0);

        f.host.skip(Duration::from_millis(10));
        assert_eq!(f.host.turn(), 1);
        assert_eq!(*log.lock().unwrap(), vec!["slept"]);

        // The yield is honored on the next turn, not within the same one.
        assert_eq!(f.host.turn(), 1);
        assert_eq!(*log.lock().unwrap(), vec!["slept", "done"]);
    }

    #[test]
    fn test_cleanup_receives_value() {
        let f = fixture();
        let log: Log = Arc::default();
        let got = Arc::new(Mutex::new(Vec::new()));
        let sink = got.clone();
        let cleanup = Cleanup::new(move |_r: &Arc<()>, value: u32| {
            sink.lock().unwrap().push(value);
            Ok(())
        });

        invoke(&f.receiver, &sleepy(log), Some(&cleanup), &f.scheduler, &f.sink, ());
        f.host.advance(Duration::from_millis(10));

        assert_eq!(*got.lock().unwrap(), vec![42]);
        assert_eq!(f.reporter.count(), 0);
    }

    #[test]
    fn test_cleanup_error_is_reported() {
        let f = fixture();
        let cleanup = Cleanup::new(|_r: &Arc<()>, _value: u32| Err("Problem in cleanup".into()));

        invoke(&f.receiver, &sleepy(Arc::default()), Some(&cleanup), &f.scheduler, &f.sink, ());
        f.host.advance(Duration::from_millis(10));

        assert_eq!(
            f.reporter.messages(),
            vec!["Error in long running handler cleanup: Problem in cleanup"]
        );
    }

    #[test]
    fn test_step_error_ends_run_without_cleanup() {
        let f = fixture();
        let handler: LongRunningFn<(), (), u32> = Arc::new(|_r: &Arc<()>, _args: ()| {
            let mut stage = 0;
            Box::new(from_fn(move || -> Result<Step<u32>, BoxError> {
                stage += 1;
                if stage == 1 {
                    Ok(Step::Sleep(Duration::from_millis(10)))
                } else {
                    Err("Problem in handler".into())
                }
            })) as Box<dyn LongRunning<Output = u32>>
        });
        let cleanup = Cleanup::new(|_r: &Arc<()>, _value: u32| panic!("must not run"));

        invoke(&f.receiver, &handler, Some(&cleanup), &f.scheduler, &f.sink, ());
        f.host.advance(Duration::from_millis(50));

        assert_eq!(f.reporter.kinds(), vec![FaultKind::LongRunningHandlerError]);
        assert!(
            f.reporter.lines()[0].starts_with("Error in long running handler: Problem in handler\n")
        );
        assert_eq!(f.host.pending(), 0);
    }

    #[test]
    fn test_runs_are_independent() {
        let f = fixture();
        let log: Log = Arc::default();
        let handler = sleepy(log.clone());

        invoke(&f.receiver, &handler, None, &f.scheduler, &f.sink, ());
        f.host.advance(Duration::from_millis(5));
        invoke(&f.receiver, &handler, None, &f.scheduler, &f.sink, ());

        f.host.advance(Duration::from_millis(5));
        assert_eq!(*log.lock().unwrap(), vec!["slept", "done"]);

        f.host.advance(Duration::from_millis(5));
        assert_eq!(*log.lock().unwrap(), vec!["slept", "done", "slept", "done"]);
    }

    #[test]
    fn test_huge_sleep_is_not_cut_short() {
        let f = fixture();
        let log: Log = Arc::default();
        let sink = log.clone();
        let handler: LongRunningFn<(), (), u32> = Arc::new(move |_r: &Arc<()>, _args: ()| {
            let sink = sink.clone();
            let mut stage = 0;
            Box::new(from_fn(move || -> Result<Step<u32>, BoxError> {
                stage += 1;
                if stage == 1 {
                    Ok(Step::sleep_secs(1e20))
                } else {
                    sink.lock().unwrap().push("woke");
                    Ok(Step::Complete(0))
                }
            })) as Box<dyn LongRunning<Output = u32>>
        });

        invoke(&f.receiver, &handler, None, &f.scheduler, &f.sink, ());
        f.host.run_until_idle();
        f.host.advance(Duration::from_secs(3600));

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(f.host.pending(), 1);
        assert_eq!(f.host.next_due(), Some(Duration::MAX));
    }
}
