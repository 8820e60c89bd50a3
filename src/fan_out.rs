//! Runs a batch of tasks concurrently and aggregates their outcomes.
//!
//! [`FanOut`] is the scheduler behind [`parallel`], [`parallel_limit`] and
//! [`map`](crate::map::map). It starts up to [`Limit`] tasks at once and admits
//! the next queued task as soon as a running one completes. When every task
//! has reported, the completion callback receives either all successful values
//! in input order or the first error that arrived.
//!
//! A failing task does not stop its siblings: every started task runs to
//! completion before the callback fires. Only the earliest error is reported;
//! [`FanOut::on_error`] observes all of them.

use std::{
    collections::VecDeque,
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{StreamExt, stream::FuturesUnordered};
use pin_project_lite::pin_project;

use crate::{Limit, aggregator::Aggregator};

pin_project! {
    // Tags a running task's future with the task's origin index.
    #[must_use = "futures do nothing unless polled or .awaited"]
    struct Indexed<Fut> {
        index: usize,
        #[pin]
        future: Fut,
    }
}

impl<Fut: Future> Future for Indexed<Fut> {
    type Output = (usize, Fut::Output);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let index = *this.index;
        this.future.poll(cx).map(|output| (index, output))
    }
}

type ErrorHook<E> = Box<dyn FnMut(usize, &E) + Send>;

/// A batch of tasks to run concurrently, optionally bounded by a [`Limit`].
///
/// Tasks are closures returning a future of `Result<T, E>`. A task is started
/// by calling it, which the scheduler does only once the task is admitted to a
/// free slot. Each task is tagged with its position in the batch (its *origin
/// index*), and successful values are delivered in that order regardless of
/// the order in which tasks complete.
///
/// # Example
/// ```
/// # use asyncflow::FanOut;
/// # futures::executor::block_on(async {
/// let mut fan_out = FanOut::new();
/// for i in 0..5u32 {
///     fan_out.push(move || async move { Ok::<_, String>(i * i) });
/// }
/// fan_out.limit(2);
///
/// let squares = fan_out.join().await;
/// assert_eq!(squares, Some(Ok(vec![0, 1, 4, 9, 16])));
/// # });
/// ```
pub struct FanOut<F, E> {
    queue: VecDeque<(usize, F)>,
    limit: Limit,
    on_error: Option<ErrorHook<E>>,
}

impl<F, E> FanOut<F, E> {
    /// Creates an empty, unbounded batch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            limit: Limit::Unbounded,
            on_error: None,
        }
    }

    /// Appends a task to the batch.
    pub fn push(&mut self, task: F) -> &mut Self {
        let index = self.queue.len();
        self.queue.push_back((index, task));
        self
    }

    /// Sets the maximum number of tasks running at once.
    ///
    /// `0` removes the limit. A limit larger than the batch starts every task
    /// immediately, same as no limit.
    pub fn limit(&mut self, max: usize) -> &mut Self {
        self.set_limit(Limit::from(max))
    }

    /// Sets the concurrency limit. The default is [`Limit::Unbounded`].
    pub fn set_limit(&mut self, limit: Limit) -> &mut Self {
        self.limit = limit;
        self
    }

    /// Registers a hook invoked with the origin index of every task that
    /// fails, in the order the failures arrive.
    ///
    /// The completion callback only receives the first error; this hook is the
    /// way to observe the others.
    pub fn on_error(&mut self, hook: impl FnMut(usize, &E) + Send + 'static) -> &mut Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Number of tasks in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<F, Fut, T, E> FanOut<F, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    /// Runs the batch and passes the aggregated outcome to `done`.
    ///
    /// `done` receives `Ok` with every value in input order if all tasks
    /// succeeded, or `Err` with the first error to arrive otherwise. It is
    /// invoked exactly once, after every started task has completed.
    ///
    /// If the batch is empty `done` is **never invoked** and the returned
    /// future completes immediately. Use [`join`](Self::join) to observe that
    /// case as `None`.
    pub async fn run<D>(self, done: D)
    where
        D: FnOnce(Result<Vec<T>, E>),
    {
        let FanOut {
            mut queue,
            limit,
            mut on_error,
        } = self;

        let total = queue.len();
        if total == 0 {
            tracing::debug!("fan-out has no tasks, completion callback will not fire");
            return;
        }
        let width = limit.resolve(total);
        tracing::debug!(total, width, "starting fan-out");

        let mut aggregator = Aggregator::new(total, done);
        let mut running = FuturesUnordered::new();
        while running.len() < width {
            let Some((index, task)) = queue.pop_front() else {
                break;
            };
            running.push(start(index, task));
        }

        while let Some((index, outcome)) = running.next().await {
            if let (Err(error), Some(hook)) = (&outcome, on_error.as_mut()) {
                hook(index, error);
            }
            aggregator.record(index, outcome);
            tracing::trace!(index, completed = aggregator.completed(), total, "task completed");

            if aggregator.is_fired() {
                continue;
            }
            if let Some((next, task)) = queue.pop_front() {
                running.push(start(next, task));
            }
            debug_assert!(running.len() <= width);
        }
    }

    /// Runs the batch and resolves to its aggregated outcome.
    ///
    /// Resolves to `None` for an empty batch, where [`run`](Self::run) would
    /// never invoke its callback.
    pub async fn join(self) -> Option<Result<Vec<T>, E>> {
        let mut outcome = None;
        self.run(|result| outcome = Some(result)).await;
        outcome
    }
}

fn start<F, Fut>(index: usize, task: F) -> Indexed<Fut>
where
    F: FnOnce() -> Fut,
{
    tracing::trace!(index, "starting task");
    Indexed {
        index,
        future: task(),
    }
}

impl<F, E> Default for FanOut<F, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, E> FromIterator<F> for FanOut<F, E> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut fan_out = Self::new();
        fan_out.extend(iter);
        fan_out
    }
}

impl<F, E> Extend<F> for FanOut<F, E> {
    fn extend<I: IntoIterator<Item = F>>(&mut self, iter: I) {
        for task in iter {
            self.push(task);
        }
    }
}

impl<F, E> fmt::Debug for FanOut<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanOut")
            .field("tasks", &self.queue.len())
            .field("limit", &self.limit)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Runs every task at once and passes the aggregated outcome to `done`.
///
/// `done` receives all values in input order, or the first error to arrive.
/// It is never invoked if `tasks` is empty.
pub async fn parallel<I, F, Fut, T, E, D>(tasks: I, done: D)
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: FnOnce(Result<Vec<T>, E>),
{
    tasks.into_iter().collect::<FanOut<F, E>>().run(done).await;
}

/// Runs at most `limit` tasks at once and passes the aggregated outcome to `done`.
///
/// Whenever a running task completes the next queued one is started, until the
/// queue is exhausted. Results and errors are aggregated as in [`parallel`],
/// and `done` is never invoked if `tasks` is empty. A `limit` of `0` means no
/// limit.
pub async fn parallel_limit<I, F, Fut, T, E, D>(tasks: I, limit: usize, done: D)
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: FnOnce(Result<Vec<T>, E>),
{
    let mut fan_out = tasks.into_iter().collect::<FanOut<F, E>>();
    fan_out.limit(limit);
    fan_out.run(done).await;
}
