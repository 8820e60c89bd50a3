//! Task shapes accepted by the combinators.
//!
//! A task is a closure that starts some asynchronous work when called and
//! returns a future resolving to the work's single outcome. Calling the closure
//! is what *starts* the task: the bounded scheduler relies on this to hold
//! queued tasks back until a slot frees up.
//!
//! - Fan-out tasks take no input: `FnOnce() -> impl Future<Output = Result<T, E>>`.
//! - [`serial`](crate::serial::serial) stages take the previous stage's value:
//!   `FnOnce(Option<T>) -> impl Future<Output = Result<T, E>>`. The first
//!   stage receives `None`.
//!
//! Closures of different types cannot share a `Vec`, so [`boxed`] and
//! [`boxed_stage`] erase them into [`BoxTask`] and [`BoxStage`].
//!
//! Operations written in completion-callback style can take part as well:
//! [`from_callback`] hands the operation a one-shot [`Completion`] and turns
//! it into a future.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::channel::oneshot;

use crate::error::Fault;

/// A boxed, type-erased task future.
pub type TaskFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

/// A boxed task that takes no input.
pub type BoxTask<T, E> = Box<dyn FnOnce() -> TaskFuture<T, E> + Send + 'static>;

/// A boxed stage of a serial chain.
pub type BoxStage<T, E> = Box<dyn FnOnce(Option<T>) -> TaskFuture<T, E> + Send + 'static>;

/// Erases the type of a task so tasks built from different closures can be
/// collected together.
///
/// # Example
/// ```
/// # use asyncflow::task::{boxed, BoxTask};
/// let tasks: Vec<BoxTask<u32, String>> = vec![
///     boxed(|| async { Ok(1) }),
///     boxed(|| async { Err("failed".to_string()) }),
/// ];
/// # assert_eq!(tasks.len(), 2);
/// ```
pub fn boxed<F, Fut, T, E>(task: F) -> BoxTask<T, E>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Box::new(move || Box::pin(task()) as TaskFuture<T, E>)
}

/// Erases the type of a serial stage.
pub fn boxed_stage<F, Fut, T, E>(stage: F) -> BoxStage<T, E>
where
    F: FnOnce(Option<T>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Box::new(move |input| Box::pin(stage(input)) as TaskFuture<T, E>)
}

/// One-shot handle used by callback-style operations to report their outcome.
///
/// Every reporting method consumes the handle, so an operation can report at
/// most once. Dropping it without reporting resolves the paired
/// [`CallbackFuture`] to [`Fault::Abandoned`].
#[must_use = "dropping a completion handle abandons the task"]
pub struct Completion<T, E> {
    sender: oneshot::Sender<Result<T, E>>,
}

impl<T, E> Completion<T, E> {
    /// Reports the outcome of the operation.
    pub fn complete(self, outcome: Result<T, E>) {
        if self.sender.send(outcome).is_err() {
            tracing::trace!("completion reported after its future was dropped");
        }
    }

    /// Reports success.
    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    /// Reports failure.
    pub fn fail(self, error: E) {
        self.complete(Err(error));
    }
}

/// Future returned by [`from_callback`].
#[must_use = "futures do nothing unless polled or .awaited"]
pub struct CallbackFuture<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for CallbackFuture<T, E> {
    type Output = Result<T, Fault<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome.map_err(Fault::Failed)),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(Fault::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Starts a callback-style operation and returns a future of its outcome.
///
/// `start` is invoked immediately with a fresh [`Completion`]. It may report
/// synchronously or hand the completion to some other thread or callback.
///
/// # Example
/// ```
/// # use asyncflow::task::from_callback;
/// # futures::executor::block_on(async {
/// let outcome = from_callback::<i32, String>(|done| {
///     std::thread::spawn(move || done.succeed(6 * 7));
/// })
/// .await;
/// assert_eq!(outcome.ok(), Some(42));
/// # });
/// ```
pub fn from_callback<T, E>(start: impl FnOnce(Completion<T, E>)) -> CallbackFuture<T, E> {
    let (sender, receiver) = oneshot::channel();
    start(Completion { sender });
    CallbackFuture { receiver }
}
