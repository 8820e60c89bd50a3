//! Sequential chaining of tasks.
//!
//! Stages run strictly one after another. The first stage is called with
//! `None`, every later stage with `Some` of the value its predecessor
//! produced. The chain stops at the first failure.

/// Runs `stages` in order, feeding each stage's value into the next.
///
/// Resolves to the last stage's value, or to the first error, in which case
/// no later stage is called. Resolves to `None` if there are no stages.
pub async fn chain<I, S, Fut, T, E>(stages: I) -> Option<Result<T, E>>
where
    I: IntoIterator<Item = S>,
    S: FnOnce(Option<T>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut value = None;
    for (index, stage) in stages.into_iter().enumerate() {
        tracing::trace!(index, "running stage");
        match stage(value.take()).await {
            Ok(output) => value = Some(output),
            Err(error) => {
                tracing::debug!(index, "stage failed, halting chain");
                return Some(Err(error));
            }
        }
    }
    if value.is_none() {
        tracing::debug!("chain has no stages");
    }
    value.map(Ok)
}

/// Runs `stages` in order and passes the final outcome to `done`.
///
/// `done` receives the last stage's value, or the error of the first stage that
/// failed. It is never invoked if `stages` is empty.
///
/// # Example
/// ```
/// # use asyncflow::task::{boxed_stage, BoxStage};
/// # futures::executor::block_on(async {
/// let stages: Vec<BoxStage<String, ()>> = vec![
///     boxed_stage(|_| async { Ok("1 line".to_string()) }),
///     boxed_stage(|prev: Option<String>| async move {
///         Ok(format!("{} 2 line", prev.unwrap_or_default()))
///     }),
/// ];
/// let mut text = None;
/// asyncflow::serial(stages, |r| text = r.ok()).await;
/// assert_eq!(text.as_deref(), Some("1 line 2 line"));
/// # });
/// ```
pub async fn serial<I, S, Fut, T, E, D>(stages: I, done: D)
where
    I: IntoIterator<Item = S>,
    S: FnOnce(Option<T>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: FnOnce(Result<T, E>),
{
    if let Some(outcome) = chain(stages).await {
        done(outcome);
    }
}
