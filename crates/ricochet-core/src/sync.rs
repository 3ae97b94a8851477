//! Bridging the callback-driven core into ordinary blocking calls

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dispatcher::{Dispatcher, Performer};
use crate::effect::Effect;
use crate::error::{EffectError, Result};
use crate::intent::Intent;
use crate::perform::perform;
use crate::value::Value;

/// Perform an effect and return its result directly
///
/// Terminal callbacks record the outcome of the whole chain. If neither has
/// fired by the time [`perform`] returns, some performer is completing
/// asynchronously and this fails with [`EffectError::NotSynchronous`].
pub fn sync_perform(dispatcher: &Dispatcher, effect: Effect) -> Result<Value> {
    let success: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let failure: Arc<Mutex<Option<EffectError>>> = Arc::new(Mutex::new(None));

    let success_slot = Arc::clone(&success);
    let failure_slot = Arc::clone(&failure);
    let terminal = effect.on_both(
        move |value| {
            *success_slot.lock() = Some(value);
            Ok(Value::unit())
        },
        move |error| {
            *failure_slot.lock() = Some(error);
            Ok(Value::unit())
        },
    );
    perform(dispatcher, terminal);

    if let Some(value) = success.lock().take() {
        return Ok(value);
    }
    if let Some(error) = failure.lock().take() {
        return Err(error);
    }
    Err(EffectError::not_synchronous(&effect))
}

/// Adapt a function that returns its result into a performer
///
/// The return value succeeds the box and an error fails it, so the function
/// never touches the box itself.
pub fn sync_performer<F>(f: F) -> Performer
where
    F: Fn(&Dispatcher, &Intent) -> Result<Value> + Send + Sync + 'static,
{
    Performer::new(move |dispatcher, intent, result| {
        result.resolve(f(dispatcher, intent));
        Ok(())
    })
}

/// Like [`sync_performer`], for an application intent type `T`
///
/// Intents of any other type fail with [`EffectError::UnexpectedIntent`].
pub fn sync_performer_for<T, F>(f: F) -> Performer
where
    T: Any,
    F: Fn(&Dispatcher, &T) -> Result<Value> + Send + Sync + 'static,
{
    Performer::new(move |dispatcher, intent, result| {
        let outcome = intent
            .expect_custom::<T>()
            .and_then(|intent| f(dispatcher, intent));
        result.resolve(outcome);
        Ok(())
    })
}
