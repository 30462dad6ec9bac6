//! One-shot completion callback for async handlers.

use crate::error::{Error, HandlerError};
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::warn;

type Finish<T> = Box<dyn FnOnce(Result<T, Error>) + Send>;

/// The receiving end of a [`Completion`], awaited by the invocation loop.
pub(crate) type Pending = oneshot::Receiver<Result<Bytes, HandlerError>>;

/// Callback an async handler fires once its result is ready.
///
/// A `Completion` may be cloned and moved to any thread. Only the first
/// firing counts; later ones are ignored and return `false`. Dropping every
/// clone without firing ends the invocation with
/// [`HandlerError::Abandoned`].
pub struct Completion<T> {
    slot: Arc<Mutex<Option<Finish<T>>>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("fired", &self.is_fired())
            .finish()
    }
}

impl<T: Send + 'static> Completion<T> {
    /// Create a completion whose output is encoded with `encode` on the
    /// firing thread, plus the receiver the dispatcher waits on.
    pub(crate) fn gate<F>(encode: F) -> (Self, Pending)
    where
        F: FnOnce(T) -> Result<Bytes, HandlerError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let finish: Finish<T> = Box::new(move |result: Result<T, Error>| {
            let outcome = result.map_err(HandlerError::Failed).and_then(encode);
            // The receiver is gone only if the wait already timed out.
            let _ = tx.send(outcome);
        });
        let completion = Self {
            slot: Arc::new(Mutex::new(Some(finish))),
        };
        (completion, rx)
    }
}

impl<T> Completion<T> {
    /// Complete with a result. Returns `false` if already completed.
    pub fn complete(&self, result: Result<T, Error>) -> bool {
        let finish = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match finish {
            Some(finish) => {
                finish(result);
                true
            }
            None => {
                warn!("Completion fired more than once, ignoring");
                false
            }
        }
    }

    /// Complete successfully.
    pub fn succeed(&self, output: T) -> bool {
        self.complete(Ok(output))
    }

    /// Complete with an error.
    pub fn fail(&self, error: impl Into<Error>) -> bool {
        self.complete(Err(error.into()))
    }

    /// Whether the completion has fired.
    pub fn is_fired(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.is_none())
            .unwrap_or(true)
    }
}
