//! Completion callbacks for asynchronous operations.
//!
//! Every background operation can report its outcome exactly once through a
//! [`Callback`], built either from a closure taking a [`ResultOrError`] or from
//! any [`ResultCallback`] handler with separate success/error methods.

use crate::core::DbError;
use std::fmt;

/// Outcome of an asynchronous operation: a value or the error that stopped it.
pub type ResultOrError<T> = std::result::Result<T, DbError>;

/// Handler style callback with one method per outcome.
pub trait ResultCallback<T>: Send {
    fn success(self, value: T);

    fn error(self, error: DbError);
}

/// A one-shot completion callback.
pub struct Callback<T> {
    inner: Box<dyn FnOnce(ResultOrError<T>) + Send>,
}

impl<T: 'static> Callback<T> {
    /// Wraps a closure that receives the outcome.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(ResultOrError<T>) + Send + 'static,
    {
        Callback { inner: Box::new(f) }
    }

    /// Wraps a handler, routing values to `success` and errors to `error`.
    pub fn from_handler<H>(handler: H) -> Self
    where
        H: ResultCallback<T> + 'static,
    {
        Callback::new(move |result| match result {
            Ok(value) => handler.success(value),
            Err(error) => handler.error(error),
        })
    }

    /// Delivers the outcome, consuming the callback.
    pub(crate) fn complete(self, result: ResultOrError<T>) {
        (self.inner)(result)
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").finish_non_exhaustive()
    }
}
