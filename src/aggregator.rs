// Collects per-task outcomes of a fan-out and fires the completion callback once.
//
// One `Aggregator` is created per run and is owned by that run's future, so
// completions are recorded by a single writer and need no locking.
use std::mem;

pub(crate) struct Aggregator<T, E, D> {
    total: usize,
    // Successful values by origin index.
    slots: Vec<Option<T>>,
    // Origin indices that already reported, successfully or not.
    reported: Vec<bool>,
    // Errors in arrival order.
    errors: Vec<E>,
    completed: usize,
    // Taken when the callback fires; `None` means fired.
    done: Option<D>,
}

impl<T, E, D> Aggregator<T, E, D>
where
    D: FnOnce(Result<Vec<T>, E>),
{
    pub(crate) fn new(total: usize, done: D) -> Self {
        Self {
            total,
            slots: std::iter::repeat_with(|| None).take(total).collect(),
            reported: vec![false; total],
            errors: Vec::new(),
            completed: 0,
            done: Some(done),
        }
    }

    /// Records the outcome of the task at `index`, firing the callback if it
    /// was the last one outstanding.
    ///
    /// Outcomes arriving after the callback fired, for an unknown index or
    /// for an index that already reported are discarded.
    pub(crate) fn record(&mut self, index: usize, outcome: Result<T, E>) {
        if self.is_fired() {
            tracing::warn!(index, "discarding completion that arrived after the callback fired");
            return;
        }
        match self.reported.get_mut(index) {
            Some(reported) if !*reported => *reported = true,
            Some(_) => {
                tracing::warn!(index, "discarding repeated completion");
                return;
            }
            None => {
                tracing::warn!(index, total = self.total, "discarding completion for unknown task");
                return;
            }
        }

        match outcome {
            Ok(value) => {
                tracing::trace!(index, "task succeeded");
                self.slots[index] = Some(value);
            }
            Err(error) => {
                tracing::trace!(index, "task failed");
                self.errors.push(error);
            }
        }
        self.completed += 1;
        debug_assert_eq!(
            self.completed,
            self.slots.iter().filter(|s| s.is_some()).count() + self.errors.len()
        );

        if self.completed == self.total {
            self.fire();
        }
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.done.is_none()
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed
    }

    fn fire(&mut self) {
        let Some(done) = self.done.take() else {
            return;
        };
        let mut errors = mem::take(&mut self.errors).into_iter();
        match errors.next() {
            Some(first) => {
                tracing::debug!(
                    total = self.total,
                    suppressed = errors.len(),
                    "fan-out finished with errors, reporting the first to arrive"
                );
                self.slots.clear();
                done(Err(first));
            }
            None => {
                tracing::debug!(total = self.total, "fan-out finished");
                let values = mem::take(&mut self.slots).into_iter().flatten().collect();
                done(Ok(values));
            }
        }
    }
}
