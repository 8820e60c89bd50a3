//! Adapts synchronous computations into delayed asynchronous tasks.

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use crate::{
    error::{Fault, Panic},
    timing::{ThreadTimer, Timer},
};

/// A synchronous function turned into an asynchronous task.
///
/// Each invocation waits for the configured delay, measured from the moment
/// of the call, and then runs the function once. An `Err` returned by the
/// function is reported as [`Fault::Failed`] and a panic as
/// [`Fault::Panicked`], so nothing escapes the task boundary.
///
/// `AsyncFn` is cheap to clone and every invocation is independent, with its
/// own delay.
///
/// Created with [`make_async`] or [`AsyncFn::new`].
pub struct AsyncFn<F> {
    func: Arc<F>,
    delay: Duration,
    timer: Arc<dyn Timer>,
}

/// Wraps `func` into an [`AsyncFn`] that runs it `delay` after each invocation.
///
/// # Example
/// ```
/// # use std::time::Duration;
/// # use asyncflow::make_async;
/// # futures::executor::block_on(async {
/// let double = make_async(
///     |x: Option<u32>| Ok::<_, String>(x.unwrap_or(1) * 2),
///     Duration::from_millis(5),
/// );
/// assert_eq!(double.call_with(21).await.ok(), Some(42));
/// assert_eq!(double.call().await.ok(), Some(2));
/// # });
/// ```
pub fn make_async<F>(func: F, delay: Duration) -> AsyncFn<F> {
    AsyncFn::new(func).with_delay(delay)
}

impl<F> AsyncFn<F> {
    /// Wraps `func` with no delay, using [`ThreadTimer`].
    pub fn new(func: F) -> Self {
        Self {
            func: Arc::new(func),
            delay: Duration::ZERO,
            timer: Arc::new(ThreadTimer),
        }
    }

    /// Sets how long each invocation waits before running the function.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replaces the timer used to wait out the delay.
    #[must_use]
    pub fn with_timer(mut self, timer: impl Timer) -> Self {
        self.timer = Arc::new(timer);
        self
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts an invocation, passing `input` to the function once the delay has elapsed.
    pub fn invoke<I, T, E>(
        &self,
        input: Option<I>,
    ) -> impl Future<Output = Result<T, Fault<E>>> + Send + 'static + use<F, I, T, E>
    where
        F: Fn(Option<I>) -> Result<T, E> + Send + Sync + 'static,
        I: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let sleep = self.timer.sleep(self.delay);
        let func = Arc::clone(&self.func);
        async move {
            sleep.await;
            match panic::catch_unwind(AssertUnwindSafe(|| func(input))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(error)) => Err(Fault::Failed(error)),
                Err(payload) => {
                    tracing::debug!("caught panic in wrapped function");
                    Err(Fault::Panicked(Panic::new(payload)))
                }
            }
        }
    }

    /// Starts an invocation without input.
    pub fn call<I, T, E>(
        &self,
    ) -> impl Future<Output = Result<T, Fault<E>>> + Send + 'static + use<F, I, T, E>
    where
        F: Fn(Option<I>) -> Result<T, E> + Send + Sync + 'static,
        I: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.invoke(None)
    }

    /// Starts an invocation with `input`.
    pub fn call_with<I, T, E>(
        &self,
        input: I,
    ) -> impl Future<Output = Result<T, Fault<E>>> + Send + 'static + use<F, I, T, E>
    where
        F: Fn(Option<I>) -> Result<T, E> + Send + Sync + 'static,
        I: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.invoke(Some(input))
    }
}

impl<F> Clone for AsyncFn<F> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            delay: self.delay,
            timer: Arc::clone(&self.timer),
        }
    }
}

impl<F> fmt::Debug for AsyncFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFn")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
