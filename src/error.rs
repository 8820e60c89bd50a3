//! Error types reported by tasks built with this crate.
//!
//! The combinators never invent errors of their own: whatever a failing task
//! produced is what reaches the completion callback. [`Fault`] is only used by
//! the adapters that sit at a task boundary ([`make_async`] and
//! [`from_callback`]) to report failures that would otherwise escape it.
//!
//! [`make_async`]: crate::adapter::make_async
//! [`from_callback`]: crate::task::from_callback

use std::{any::Any, fmt};

/// A failure reported at a task boundary.
#[derive(Debug, thiserror::Error)]
pub enum Fault<E> {
    /// The wrapped computation returned an error. The value is passed through unchanged.
    #[error("{0}")]
    Failed(E),

    /// The wrapped computation panicked.
    #[error("task panicked: {0}")]
    Panicked(Panic),

    /// The completion handle was dropped without reporting an outcome.
    #[error("completion handle dropped without reporting an outcome")]
    Abandoned,
}

impl<E> Fault<E> {
    /// Returns the error produced by the computation, if this fault carries one.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Fault::Failed(e) => Some(e),
            Fault::Panicked(_) | Fault::Abandoned => None,
        }
    }

    /// Borrows the error produced by the computation, if this fault carries one.
    pub fn as_failure(&self) -> Option<&E> {
        match self {
            Fault::Failed(e) => Some(e),
            Fault::Panicked(_) | Fault::Abandoned => None,
        }
    }

    /// Returns `true` if the computation panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, Fault::Panicked(_))
    }
}

/// Payload of a panic caught at a task boundary.
pub struct Panic(Box<dyn Any + Send>);

impl Panic {
    pub(crate) fn new(payload: Box<dyn Any + Send>) -> Self {
        Self(payload)
    }

    /// Returns the panic message if the payload is a string.
    pub fn message(&self) -> Option<&str> {
        self.0
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| self.0.downcast_ref::<String>().map(String::as_str))
    }

    /// Consumes the `Panic` and returns the original payload, e.g. to resume unwinding.
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.0
    }
}

impl fmt::Debug for Panic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Panic").field(&self.message()).finish()
    }
}

impl fmt::Display for Panic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.write_str(message),
            None => f.write_str("non-string panic payload"),
        }
    }
}
