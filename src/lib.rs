//! Control-flow combinators for asynchronous tasks.
//!
//! `asyncflow` runs batches of asynchronous tasks and reduces their outcomes to
//! a single result delivered to a completion callback. It is designed to work
//! independently of any specific async runtime: the combinators are plain
//! futures that can be awaited on tokio, smol, `futures::executor` or anything
//! else.
//!
//! Features include:
//! - [`serial`]: run tasks one after another, feeding each result into the next
//! - [`parallel`] and [`parallel_limit`]: run tasks concurrently, optionally
//!   keeping at most a fixed number in flight, and collect their values in
//!   input order
//! - [`map`]: run one worker over every element of an input sequence
//! - [`make_async`]: turn a synchronous function into a delayed asynchronous task
//!
//! A task is any closure that starts its work when called and returns a future
//! of `Result<T, E>`. Combinators that aggregate several tasks invoke their
//! completion callback exactly once, with either every value or the first
//! error to arrive. With no tasks at all the callback is not invoked.
//!
//! ```
//! # futures::executor::block_on(async {
//! let tasks = (1..=4u64).map(|n| move || async move { Ok::<_, String>(n * 10) });
//!
//! let mut results = None;
//! asyncflow::parallel_limit(tasks, 2, |r| results = Some(r)).await;
//! assert_eq!(results, Some(Ok(vec![10, 20, 30, 40])));
//! # });
//! ```

mod aggregator;

pub mod adapter;
pub mod error;
pub mod fan_out;
pub mod limit;
pub mod map;
pub mod serial;
pub mod task;
pub mod timing;

pub use adapter::{AsyncFn, make_async};
pub use error::{Fault, Panic};
pub use fan_out::{FanOut, parallel, parallel_limit};
pub use limit::Limit;
pub use map::map;
pub use serial::{chain, serial};
pub use task::{BoxStage, BoxTask, Completion, TaskFuture, from_callback};
pub use timing::{ThreadTimer, Timer};
