//! Performers that complete later, under test control
//!
//! [`Deferred`] parks every box it is handed instead of writing it. The test
//! then takes parked boxes back out and completes them in whatever order it
//! wants, which resumes the waiting chains on the test's own stack.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use ricochet_core::{
    Dispatcher, EffectError, Intent, IntentKey, Performer, Result, ResultBox, TypeDispatcher, Value,
};

/// A performed intent waiting for the test to complete it
pub struct Parked {
    intent: Intent,
    result: ResultBox,
}

impl Parked {
    /// The intent that was performed
    pub fn intent(&self) -> &Intent {
        &self.intent
    }

    /// Complete with a value
    pub fn succeed(self, value: Value) {
        self.result.succeed(value);
    }

    /// Complete with an error
    pub fn fail(self, error: EffectError) {
        self.result.fail(error);
    }

    /// Complete with an outcome
    pub fn resolve(self, outcome: Result<Value>) {
        self.result.resolve(outcome);
    }
}

impl fmt::Debug for Parked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parked").field("intent", &self.intent).finish()
    }
}

/// Performer handle that parks result boxes
#[derive(Clone, Default)]
pub struct Deferred {
    parked: Arc<Mutex<Vec<Option<Parked>>>>,
}

impl Deferred {
    /// Create a deferred performer with nothing parked
    pub fn new() -> Self {
        Self::default()
    }

    /// Performer that parks each box it receives, in arrival order
    pub fn performer(&self) -> Performer {
        let parked = Arc::clone(&self.parked);
        Performer::new(move |_, intent, result| {
            parked.lock().push(Some(Parked {
                intent: intent.clone(),
                result,
            }));
            Ok(())
        })
    }

    /// Dispatcher routing `key` to [`Deferred::performer`]
    pub fn dispatcher(&self, key: IntentKey) -> Dispatcher {
        TypeDispatcher::new().with(key, self.performer()).into()
    }

    /// Dispatcher routing the application intent `T` to [`Deferred::performer`]
    pub fn dispatcher_for<T: Any>(&self) -> Dispatcher {
        self.dispatcher(IntentKey::custom::<T>())
    }

    /// Number of boxes ever parked, taken or not
    pub fn arrived(&self) -> usize {
        self.parked.lock().len()
    }

    /// Number of boxes still parked
    pub fn pending(&self) -> usize {
        self.parked.lock().iter().filter(|slot| slot.is_some()).count()
    }

    /// Take the box that arrived `index`-th, if it is still parked
    pub fn take(&self, index: usize) -> Option<Parked> {
        self.parked.lock().get_mut(index).and_then(Option::take)
    }

    /// Complete parked boxes in `order` (arrival indices) using `reply`
    ///
    /// Each box is taken before it is completed, so chains resumed by one
    /// completion may park more boxes without deadlocking.
    pub fn complete_in_order<F>(&self, order: &[usize], reply: F)
    where
        F: Fn(&Intent) -> Result<Value>,
    {
        for &index in order {
            if let Some(parked) = self.take(index) {
                let outcome = reply(parked.intent());
                parked.resolve(outcome);
            }
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("arrived", &self.arrived())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echo::Echo;
    use crate::recorder::Recorder;
    use ricochet_core::{perform, Effect};

    #[test]
    fn test_parks_until_taken() {
        let deferred = Deferred::new();
        let dispatcher = deferred.dispatcher_for::<Echo>();
        let log = Recorder::new();

        perform(&dispatcher, Effect::custom(Echo(1)).on_success(log.tap(1)));
        perform(&dispatcher, Effect::custom(Echo(2)).on_success(log.tap(2)));
        assert_eq!(deferred.pending(), 2);
        assert!(log.is_empty());

        deferred.complete_in_order(&[1, 0], |intent| {
            Ok(intent.downcast_ref::<Echo>().unwrap().reply())
        });
        assert_eq!(log.entries(), vec![2, 1]);
        assert_eq!(deferred.pending(), 0);
        assert_eq!(deferred.arrived(), 2);
    }

    #[test]
    fn test_take_is_one_shot() {
        let deferred = Deferred::new();
        perform(&deferred.dispatcher_for::<Echo>(), Effect::custom(Echo(1)));
        assert!(deferred.take(0).is_some());
        assert!(deferred.take(0).is_none());
        assert!(deferred.take(5).is_none());
    }
}
