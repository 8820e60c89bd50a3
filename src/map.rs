use crate::FanOut;

/// Applies `worker` to every input concurrently and passes the results to `done`.
///
/// Equivalent to [`parallel`](crate::parallel) over one task per input: the
/// worker is called once per input, every call runs at once, and `done`
/// receives the values in input order or the first error to arrive. It is
/// never invoked if `inputs` is empty.
///
/// # Example
/// ```
/// # futures::executor::block_on(async {
/// let mut lengths = None;
/// asyncflow::map(
///     ["one", "three"],
///     |word| async move { Ok::<_, ()>(word.len()) },
///     |r| lengths = Some(r),
/// )
/// .await;
/// assert_eq!(lengths, Some(Ok(vec![3, 5])));
/// # });
/// ```
pub async fn map<I, W, Fut, T, E, D>(inputs: I, mut worker: W, done: D)
where
    I: IntoIterator,
    W: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: FnOnce(Result<Vec<T>, E>),
{
    // Every task starts immediately, so the worker can be called up front.
    let fan_out: FanOut<_, E> = inputs
        .into_iter()
        .map(|input| {
            let future = worker(input);
            move || future
        })
        .collect();
    fan_out.run(done).await;
}
