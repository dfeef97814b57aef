//! Payload trait for handler arguments.

/// A marker trait for the arguments the host passes to a wrapped handler.
///
/// A payload stands in for everything the host hands over on one invocation
/// (positional and keyword arguments alike). It moves into the handler by
/// value, possibly onto a later host turn, so it must be `Send + 'static`.
///
/// # Example
///
/// ```rust,ignore
/// struct Press { button: u8, modifiers: Vec<String> }
///
/// let wrapped = dispatcher.wrap(widget, RawHandler::sync(|w, press: Press| { ... }), None);
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid handler payload",
    label = "must be `Send + 'static`",
    note = "Handler arguments may be moved to a later host turn, so they must be owned and thread-safe."
)]
pub trait Payload: Send + 'static {}

impl<T: Send + 'static> Payload for T {}

/// A marker trait for the value a handler produces on success.
///
/// The value is handed to the registered cleanup, possibly from a task
/// continuation, so it must be `Send + 'static` as well.
pub trait Output: Send + 'static {}

impl<T: Send + 'static> Output for T {}
