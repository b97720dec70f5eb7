use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A lazily started asynchronous unit of work.
///
/// A `Task` is a recipe, not a running future: building one performs no side
/// effects, and every call to [`run`](Task::run) starts a fresh execution.
/// This is what lets the runtime hand the same [`Command`](crate::Command) to
/// several observers of the command stream without any of them triggering
/// work just by receiving it.
///
/// Tasks cannot fail at the type level.  Fallible work is expressed as a
/// `Task<Result<T, E>>` and folded into a message with
/// [`Command::attempt`](crate::Command::attempt).
///
/// # Example
///
/// ```rust,ignore
/// use tealeaf_core::{Command, Task};
///
/// let fetch = Task::new(|| async { load_profile().await });
/// let cmd = Command::attempt(fetch, Msg::ProfileLoaded);
/// ```
pub struct Task<T> {
    run: Arc<dyn Fn() -> BoxFuture<'static, T> + Send + Sync>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Task<T> {
    /// Create a task from a future factory.
    ///
    /// The factory is invoked once per [`run`](Task::run).
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self {
            run: Arc::new(move || factory().boxed()),
        }
    }

    /// A task that resolves immediately to a clone of `value`.
    pub fn of(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Task::new(move || futures::future::ready(value.clone()))
    }

    /// Transform the result of this task.
    pub fn map<U: Send + 'static>(self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Task<U> {
        let f = Arc::new(f);
        Task::new(move || {
            let fut = (self.run)();
            let f = Arc::clone(&f);
            async move { f(fut.await) }
        })
    }

    /// Start one execution of the task.
    pub fn run(&self) -> BoxFuture<'static, T> {
        (self.run)()
    }
}
