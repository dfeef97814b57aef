//! # Long-Running Handlers
//!
//! A long-running handler is a resumable state machine. Each call to
//! [`LongRunning::resume`] runs the body up to its next pause point and says
//! how the host should resume it:
//!
//! - [`Step::Sleep`] - resume once the delay has elapsed
//! - [`Step::Yield`] - resume at the host's next idle opportunity
//! - [`Step::Complete`] - the body is finished; the value goes to cleanup
//!
//! The host thread stays free between steps, so a handler can write
//! "wait, then continue" logic without chaining callbacks by hand.

use crate::error::BoxError;
use std::{fmt, time::Duration};

/// How a long-running handler asks to be resumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    /// Pause for the given delay. A zero delay behaves like [`Step::Yield`].
    Sleep(Duration),
    /// Pause until the host's next idle opportunity.
    Yield,
    /// The body has returned.
    Complete(T),
}

impl<T> Step<T> {
    /// Pause for a delay given in (fractional) seconds.
    ///
    /// Negative and NaN delays are treated as zero. Delays too large for a
    /// [`Duration`], including infinity, saturate to [`Duration::MAX`].
    pub fn sleep_secs(seconds: f64) -> Self {
        if seconds.is_nan() || seconds <= 0.0 {
            return Step::Sleep(Duration::ZERO);
        }
        Step::Sleep(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
    }

    /// The delay to wait before resuming, if this step pauses for a nonzero time.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Step::Sleep(delay) if !delay.is_zero() => Some(*delay),
            _ => None,
        }
    }
}

/// A resumable, multi-step handler body.
///
/// # Example
///
/// ```rust,ignore
/// struct Countdown { left: u32 }
///
/// impl LongRunning for Countdown {
///     type Output = &'static str;
///
///     fn resume(&mut self) -> Result<Step<Self::Output>, BoxError> {
///         if self.left == 0 {
///             return Ok(Step::Complete("liftoff"));
///         }
///         self.left -= 1;
///         Ok(Step::Sleep(Duration::from_secs(1)))
///     }
/// }
/// ```
pub trait LongRunning: Send + 'static {
    /// The value produced when the body completes.
    type Output;

    /// Run the body up to its next pause point.
    fn resume(&mut self) -> Result<Step<Self::Output>, BoxError>;
}

impl<L: LongRunning + ?Sized> LongRunning for Box<L> {
    type Output = L::Output;

    fn resume(&mut self) -> Result<Step<Self::Output>, BoxError> {
        (**self).resume()
    }
}

/// A [`LongRunning`] body built from a closure. See [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}

impl<F, T> LongRunning for FromFn<F>
where
    F: FnMut() -> Result<Step<T>, BoxError> + Send + 'static,
{
    type Output = T;

    fn resume(&mut self) -> Result<Step<T>, BoxError> {
        (self.f)()
    }
}

/// Build a long-running body from a closure that is called once per step.
///
/// The closure keeps its own progress in captured state.
///
/// ```rust,ignore
/// let mut stage = 0;
/// let body = from_fn(move || {
///     stage += 1;
///     Ok(match stage {
///         1 => Step::sleep_secs(0.5),
///         2 => Step::Yield,
///         _ => Step::Complete(42),
///     })
/// });
/// ```
pub fn from_fn<F, T>(f: F) -> FromFn<F>
where
    F: FnMut() -> Result<Step<T>, BoxError> + Send + 'static,
{
    FromFn { f }
}
