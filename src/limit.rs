use std::num::NonZeroUsize;

/// Upper bound on how many tasks a fan-out keeps in flight at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Limit {
    /// Every task is started immediately.
    #[default]
    Unbounded,

    /// At most this many tasks run concurrently.
    Max(NonZeroUsize),

    /// Use the available hardware parallelism as the limit.
    Parallelism,
}

impl Limit {
    /// Returns the number of tasks to keep in flight for a batch of `total` tasks.
    ///
    /// The result never exceeds `total`.
    #[must_use]
    pub fn resolve(self, total: usize) -> usize {
        match self {
            Limit::Unbounded => total,
            Limit::Max(max) => max.get().min(total),
            Limit::Parallelism => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
                .min(total),
        }
    }

    /// Returns `true` if this limit never holds tasks back.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        matches!(self, Limit::Unbounded)
    }
}

impl From<usize> for Limit {
    /// A limit of `0` means no limit.
    fn from(value: usize) -> Self {
        NonZeroUsize::new(value)
            .map(Limit::Max)
            .unwrap_or(Limit::Unbounded)
    }
}

impl From<NonZeroUsize> for Limit {
    fn from(value: NonZeroUsize) -> Self {
        Limit::Max(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_unbounded() {
        assert_eq!(Limit::from(0), Limit::Unbounded);
        assert!(Limit::from(0).is_unbounded());
        assert!(Limit::default().is_unbounded());
        assert_eq!(Limit::from(0).resolve(6), 6);
    }

    #[test]
    fn max_is_capped_by_total() {
        assert!(!Limit::from(7).is_unbounded());
        assert_eq!(Limit::from(7).resolve(6), 6);
        assert_eq!(Limit::from(2).resolve(6), 2);
    }

    #[test]
    fn parallelism_is_at_least_one() {
        assert!(Limit::Parallelism.resolve(4) >= 1);
        assert_eq!(Limit::Parallelism.resolve(0), 0);
    }
}
