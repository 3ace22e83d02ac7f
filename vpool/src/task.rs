use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Converts whatever a task body returns into a success/failure outcome.
///
/// Implemented for `()` and for any `Result` whose error converts into
/// `anyhow::Error`, so both `fn(A)` and `fn(A) -> anyhow::Result<T>` can be
/// wrapped.
pub trait TaskOutcome {
    fn into_outcome(self) -> anyhow::Result<()>;
}

impl TaskOutcome for () {
    fn into_outcome(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<T, E> TaskOutcome for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn into_outcome(self) -> anyhow::Result<()> {
        self.map(|_| ()).map_err(Into::into)
    }
}

type TaskBody = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// A deferred invocation: a callable with its arguments already captured.
pub struct Task {
    name: &'static str,
    body: TaskBody,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish()
    }
}

impl Task {
    pub fn new<F, R>(name: &'static str, body: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutcome + 'static,
    {
        Self {
            name,
            body: Box::new(move || body().into_outcome()),
        }
    }

    /// Name used in failure logs, usually the wrapped function's type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the body, turning a returned error or a panic into `Err(message)`.
    pub(crate) fn run_caught(self) -> Result<(), String> {
        run_caught(self.body)
    }
}

/// Runs `body` and isolates both returned errors and panics.
pub(crate) fn run_caught<F>(body: F) -> Result<(), String>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{:#}", err)),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
