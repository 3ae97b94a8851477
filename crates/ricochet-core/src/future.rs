//! Async bridge: await an effect's result
//!
//! [`perform_future`] performs an effect and returns a future that resolves
//! once the chain finishes, on whichever thread that happens. No executor is
//! assumed, so the future can be awaited inside any async runtime.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use parking_lot::Mutex;

use crate::dispatcher::Dispatcher;
use crate::effect::Effect;
use crate::error::{EffectError, Result};
use crate::perform::perform;
use crate::value::Value;

/// Future resolving to the final outcome of an effect chain
///
/// Resolves to [`EffectError::Abandoned`] if the chain is dropped without
/// finishing, for instance when a performer discards its box.
#[must_use = "futures do nothing unless awaited"]
pub struct EffectFuture {
    receiver: oneshot::Receiver<Result<Value>>,
}

impl fmt::Debug for EffectFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectFuture").finish_non_exhaustive()
    }
}

impl Future for EffectFuture {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(EffectError::Abandoned)))
    }
}

/// Perform `effect` and return a future of its result
///
/// The chain starts running before this returns; synchronous chains have
/// already finished by then.
pub fn perform_future(dispatcher: &Dispatcher, effect: Effect) -> EffectFuture {
    let (sender, receiver) = oneshot::channel();
    let sender = Arc::new(Mutex::new(Some(sender)));
    let on_error = Arc::clone(&sender);

    let terminal = effect.on_both(
        move |value| {
            complete(&sender, Ok(value));
            Ok(Value::unit())
        },
        move |error| {
            complete(&on_error, Err(error));
            Ok(Value::unit())
        },
    );
    perform(dispatcher, terminal);
    EffectFuture { receiver }
}

fn complete(sender: &Mutex<Option<oneshot::Sender<Result<Value>>>>, outcome: Result<Value>) {
    let sender = sender.lock().take();
    if let Some(sender) = sender {
        // The receiver may be gone; nobody is waiting then
        let _ = sender.send(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{base_dispatcher, Performer, TypeDispatcher};
    use crate::intent::{Constant, Fail, IntentKey};
    use futures::executor::block_on;

    #[test]
    fn test_future_of_synchronous_chain() {
        let effect = Effect::new(Constant::new(2_i64))
            .on_success(|v| Ok(Value::new(v.into_inner::<i64>()? * 21)));
        let value = block_on(perform_future(&base_dispatcher(), effect)).unwrap();
        assert_eq!(value.into_inner::<i64>().unwrap(), 42);
    }

    #[test]
    fn test_future_of_failed_chain() {
        let effect = Effect::new(Fail::new(EffectError::failed("down")));
        let err = block_on(perform_future(&base_dispatcher(), effect)).unwrap_err();
        assert_eq!(err.to_string(), "down");
    }

    #[test]
    fn test_dropped_box_abandons_future() {
        let dispatcher: Dispatcher = TypeDispatcher::new()
            .with(
                IntentKey::Constant,
                Performer::new(|_, _, result| {
                    drop(result);
                    Ok(())
                }),
            )
            .into();
        let err = block_on(perform_future(&dispatcher, Effect::new(Constant::new(1_i64)))).unwrap_err();
        assert!(matches!(err, EffectError::Abandoned));
    }
}
