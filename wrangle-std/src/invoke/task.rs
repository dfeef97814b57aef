//! Async task launcher.

use super::{guard, run_cleanup};
use futures::FutureExt;
use std::{panic::AssertUnwindSafe, sync::Arc};
use wrangle_core::{
    AsyncFn, CallError, Cleanup, FaultKind, HandlerFault, Output, Payload, Reporter, TaskHandle,
    TaskRunner,
};

/// Spawn an async handler on `runner` and return without waiting for it.
///
/// The body is called and awaited inside the task. A failing body is
/// reported as [`FaultKind::AsyncHandlerError`] and skips cleanup; a failing
/// cleanup is reported as [`FaultKind::AsyncHandlerCleanupError`].
pub fn launch<R, E, T>(
    receiver: &Arc<R>,
    handler: &AsyncFn<R, E, T>,
    cleanup: Option<&Cleanup<R, T>>,
    runner: &dyn TaskRunner,
    reporter: &Arc<dyn Reporter>,
    args: E,
) -> TaskHandle
where
    R: Send + Sync + 'static,
    E: Payload,
    T: Output,
{
    let receiver = receiver.clone();
    let handler = handler.clone();
    let cleanup = cleanup.cloned();
    let reporter = reporter.clone();

    #[cfg(feature = "tracing")]
    tracing::trace!("launching async handler");

    runner.spawn(Box::pin(async move {
        let body = match guard(|| Ok(handler(receiver.clone(), args))) {
            Ok(body) => body,
            Err(err) => {
                reporter.report(&HandlerFault::new(FaultKind::AsyncHandlerError, err));
                return;
            }
        };

        let outcome = match AssertUnwindSafe(body).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(CallError::Failed(err)),
            Err(payload) => Err(CallError::from_panic(payload)),
        };

        match outcome {
            Ok(value) => run_cleanup(
                FaultKind::AsyncHandlerCleanupError,
                &receiver,
                cleanup.as_ref(),
                value,
                &*reporter,
            ),
            Err(err) => reporter.report(&HandlerFault::new(FaultKind::AsyncHandlerError, err)),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualHost, RecordingReporter};
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicBool, Ordering},
        },
        time::Duration,
    };
    use wrangle_core::{BoxError, BoxFuture};

    fn setup() -> (ManualHost, RecordingReporter, Arc<dyn Reporter>) {
        let host = ManualHost::new();
        let reporter = RecordingReporter::new();
        let sink: Arc<dyn Reporter> = Arc::new(reporter.clone());
        (host, reporter, sink)
    }

    /// Sleeps 10ms on the manual host, marks itself done, returns 42.
    fn sleepy(host: &ManualHost, done: Arc<AtomicBool>) -> AsyncFn<(), (), u32> {
        let host = host.clone();
        Arc::new(move |_r: Arc<()>, _args: ()| -> BoxFuture<'static, Result<u32, BoxError>> {
            let sleep = host.sleep(Duration::from_millis(10));
            let done = done.clone();
            Box::pin(async move {
                sleep.await;
                done.store(true, Ordering::SeqCst);
                Ok(42)
            })
        })
    }

    #[test]
    fn test_launch_returns_before_body_runs() {
        let (host, _reporter, sink) = setup();
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let handler: AsyncFn<(), (), ()> =
            Arc::new(move |_r: Arc<()>, _args: ()| -> BoxFuture<'static, Result<(), BoxError>> {
                flag.store(true, Ordering::SeqCst);
                Box::pin(async { Ok(()) })
            });

        let handle = launch(&Arc::new(()), &handler, None, &host, &sink, ());

        assert!(!called.load(Ordering::SeqCst));
        assert!(!handle.is_finished());

        host.run_until_idle();
        assert!(called.load(Ordering::SeqCst));
        assert!(handle.is_finished());
    }

    #[test]
    fn test_cleanup_runs_after_completion() {
        let (host, reporter, sink) = setup();
        let done = Arc::new(AtomicBool::new(false));
        let got = Arc::new(Mutex::new(Vec::new()));
        let sink_values = got.clone();
        let cleanup = Cleanup::new(move |_r: &Arc<()>, value: u32| {
            sink_values.lock().unwrap().push(value);
            Ok(())
        });

        launch(
            &Arc::new(()),
            &sleepy(&host, done.clone()),
            Some(&cleanup),
            &host,
            &sink,
            (),
        );
        host.run_until_idle();
        assert!(!done.load(Ordering::SeqCst));
        assert!(got.lock().unwrap().is_empty());

        host.advance(Duration::from_millis(10));
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(*got.lock().unwrap(), vec![42]);
        assert_eq!(reporter.count(), 0);
    }

    #[test]
    fn test_body_error_skips_cleanup() {
        let (host, reporter, sink) = setup();
        let handler: AsyncFn<(), (), u32> =
            Arc::new(|_r: Arc<()>, _args: ()| -> BoxFuture<'static, Result<u32, BoxError>> {
                Box::pin(async { Err("Problem in handler".into()) })
            });
        let cleanup = Cleanup::new(|_r: &Arc<()>, _value: u32| panic!("must not run"));

        launch(&Arc::new(()), &handler, Some(&cleanup), &host, &sink, ());
        host.run_until_idle();

        assert_eq!(
            reporter.messages(),
            vec!["Error in async handler: Problem in handler"]
        );
    }

    #[test]
    fn test_body_panic_is_reported() {
        let (host, reporter, sink) = setup();
        let handler: AsyncFn<(), (), u32> =
            Arc::new(|_r: Arc<()>, _args: ()| -> BoxFuture<'static, Result<u32, BoxError>> {
                Box::pin(async { panic!("kaboom") })
            });

        launch(&Arc::new(()), &handler, None, &host, &sink, ());
        host.run_until_idle();

        assert_eq!(reporter.kinds(), vec![FaultKind::AsyncHandlerError]);
        assert_eq!(
            reporter.messages(),
            vec!["Error in async handler: panicked: kaboom"]
        );
    }

    #[test]
    fn test_cleanup_error_is_reported() {
        let (host, reporter, sink) = setup();
        let cleanup =
            Cleanup::new(|_r: &Arc<()>, _value: u32| Err("Problem in cleanup".into()));

        launch(
            &Arc::new(()),
            &sleepy(&host, Arc::default()),
            Some(&cleanup),
            &host,
            &sink,
            (),
        );
        host.advance(Duration::from_millis(10));

        assert_eq!(
            reporter.messages(),
            vec!["Error in async handler cleanup: Problem in cleanup"]
        );
    }
}
