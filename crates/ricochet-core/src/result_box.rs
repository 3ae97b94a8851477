//! One-shot result channel handed to performers
//!
//! A performer reports the outcome of its intent by writing a [`ResultBox`]
//! exactly once, either before returning or at any later time from any
//! thread. Writing the box resumes the callback chain that was waiting on
//! it: inline on the original trampoline if it is still running, otherwise
//! on a new trampoline started by the writer.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{EffectError, Result};
use crate::value::Value;

type Resume = Box<dyn FnOnce(Result<Value>) + Send>;

/// Write-once sink for a performer's result
///
/// Boxes are move-only: `succeed` and `fail` consume the box, so writing the
/// same box twice does not compile.
///
/// ```compile_fail
/// use ricochet_core::{ResultBox, Value};
///
/// let result = ResultBox::new(|_| {});
/// result.succeed(Value::unit());
/// result.succeed(Value::unit());
/// ```
pub struct ResultBox {
    slot: Arc<Mutex<Option<Resume>>>,
}

impl ResultBox {
    /// Create a box that calls `resume` when written
    pub fn new<F>(resume: F) -> Self
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        Self {
            slot: Arc::new(Mutex::new(Some(Box::new(resume)))),
        }
    }

    /// Report success
    pub fn succeed(self, value: Value) {
        self.resolve(Ok(value));
    }

    /// Report failure
    pub fn fail(self, error: EffectError) {
        self.resolve(Err(error));
    }

    /// Report an outcome
    ///
    /// # Panics
    ///
    /// Panics if the outcome was already delivered. That happens when a
    /// performer returns an error (which the core delivers on its behalf)
    /// and later writes its box anyway.
    pub fn resolve(self, outcome: Result<Value>) {
        let resume = self.slot.lock().take();
        match resume {
            Some(resume) => resume(outcome),
            None => panic!("result box already resolved, refusing to resume its chain twice"),
        }
    }

    /// Whether an outcome has been delivered
    pub fn is_resolved(&self) -> bool {
        self.slot.lock().is_none()
    }

    pub(crate) fn watch(&self) -> BoxWatch {
        BoxWatch {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl Drop for ResultBox {
    fn drop(&mut self) {
        // Watched boxes are reported by the core once the performer returns
        if Arc::strong_count(&self.slot) == 1 && self.slot.lock().is_some() {
            debug!("result box dropped without a result; its chain will never resume");
        }
    }
}

impl fmt::Debug for ResultBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultBox")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// The core's view of a box lent to a performer
pub(crate) struct BoxWatch {
    slot: Arc<Mutex<Option<Resume>>>,
}

impl BoxWatch {
    /// Deliver `error` unless the performer already wrote the box
    ///
    /// Hands the error back if the box was already resolved.
    pub(crate) fn fail_if_pending(&self, error: EffectError) -> std::result::Result<(), EffectError> {
        let resume = self.slot.lock().take();
        match resume {
            Some(resume) => {
                resume(Err(error));
                Ok(())
            }
            None => Err(error),
        }
    }

    /// Whether the box was dropped without being written
    pub(crate) fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.slot) == 1 && self.slot.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_box() -> (ResultBox, Arc<Mutex<Vec<Result<Value>>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (ResultBox::new(move |outcome| sink.lock().push(outcome)), log)
    }

    #[test]
    fn test_succeed_delivers_value() {
        let (result, log) = recording_box();
        result.succeed(Value::new(7_i64));
        let mut log = log.lock();
        assert_eq!(log.len(), 1);
        let value = log.pop().unwrap().unwrap();
        assert_eq!(value.into_inner::<i64>().unwrap(), 7);
    }

    #[test]
    fn test_fail_delivers_error() {
        let (result, log) = recording_box();
        result.fail(EffectError::failed("nope"));
        assert!(log.lock()[0].is_err());
    }

    #[test]
    fn test_watch_fails_pending_box_once() {
        let (result, log) = recording_box();
        let watch = result.watch();
        assert!(watch.fail_if_pending(EffectError::failed("first")).is_ok());
        assert!(result.is_resolved());
        assert!(watch.fail_if_pending(EffectError::failed("second")).is_err());
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_watch_detects_abandoned_box() {
        let (result, _log) = recording_box();
        let watch = result.watch();
        assert!(!watch.is_abandoned());
        drop(result);
        assert!(watch.is_abandoned());
    }

    #[test]
    #[should_panic(expected = "already resolved")]
    fn test_write_after_delivery_is_fatal() {
        let (result, _log) = recording_box();
        let watch = result.watch();
        let _ = watch.fail_if_pending(EffectError::failed("performer error"));
        result.succeed(Value::unit());
    }
}
