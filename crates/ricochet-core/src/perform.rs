//! The execution core
//!
//! [`perform`] resolves an effect's intent to a performer, lends the
//! performer a [`ResultBox`], and feeds whatever is written into that box
//! through the effect's callback chain. Each stage is one [`Step`] on the
//! trampoline:
//!
//! - `Resolve` looks the intent up and invokes its performer. The box it
//!   hands out bounces `RunCallbacks` when written.
//! - `RunCallbacks` applies the next callback pair to the current outcome.
//!   A success value holding an [`Effect`] is substituted: the inner
//!   effect's callbacks are spliced in front of the remaining chain and the
//!   machine goes back to `Resolve` with the inner intent.
//!
//! Nested effects therefore change the continuation, never the stack depth.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::dispatcher::Dispatcher;
use crate::effect::{CallbackPair, Effect};
use crate::error::{EffectError, Result};
use crate::intent::Intent;
use crate::result_box::ResultBox;
use crate::trampoline::{trampoline, Bounce, Bouncer};
use crate::value::Value;

/// Perform an effect
///
/// Never returns the effect's result and never fails: every outcome,
/// including a missing performer or a performer error, goes through the
/// effect's callbacks. An error still pending when the chain runs out is
/// dropped, so chains that need an observer must end with an error
/// callback (or use [`sync_perform`](crate::sync::sync_perform)).
///
/// If the performer (or a nested one) completes later, the rest of the
/// chain runs on whichever thread writes the box.
pub fn perform(dispatcher: &Dispatcher, effect: Effect) {
    let (intent, callbacks) = effect.into_parts();
    trace!(
        intent = intent.name(),
        callbacks = callbacks.len(),
        "performing effect"
    );
    trampoline(Step::Resolve {
        dispatcher: dispatcher.clone(),
        intent,
        chain: callbacks.into(),
    });
}

/// State of one effect chain between trampoline steps
enum Step {
    /// Find and invoke the performer for `intent`
    Resolve {
        dispatcher: Dispatcher,
        intent: Arc<Intent>,
        chain: VecDeque<CallbackPair>,
    },
    /// Apply the next callback pair to `outcome`
    RunCallbacks {
        dispatcher: Dispatcher,
        chain: VecDeque<CallbackPair>,
        outcome: Result<Value>,
    },
}

impl Bounce for Step {
    fn run(self, bouncer: Bouncer<Self>) {
        match self {
            Step::Resolve {
                dispatcher,
                intent,
                chain,
            } => resolve(dispatcher, intent, chain, bouncer),
            Step::RunCallbacks {
                dispatcher,
                chain,
                outcome,
            } => run_callbacks(dispatcher, chain, outcome, bouncer),
        }
    }
}

fn resolve(
    dispatcher: Dispatcher,
    intent: Arc<Intent>,
    chain: VecDeque<CallbackPair>,
    bouncer: Bouncer<Step>,
) {
    let Some(performer) = dispatcher.performer(&intent) else {
        debug!(intent = intent.name(), "no performer found");
        let outcome = Err(EffectError::no_performer_found(&*intent));
        bouncer.bounce(Step::RunCallbacks {
            dispatcher,
            chain,
            outcome,
        });
        return;
    };

    let resume_with = dispatcher.clone();
    let result = ResultBox::new(move |outcome| {
        bouncer.bounce(Step::RunCallbacks {
            dispatcher: resume_with,
            chain,
            outcome,
        });
    });
    let watch = result.watch();

    match performer.perform(&dispatcher, &intent, result) {
        Ok(()) => {
            if watch.is_abandoned() {
                debug!(
                    intent = intent.name(),
                    "performer dropped its box without a result, chain will never resume"
                );
            }
        }
        Err(error) => {
            if let Err(error) = watch.fail_if_pending(error) {
                warn!(
                    intent = intent.name(),
                    %error,
                    "performer returned an error after writing its box, dropping it"
                );
            }
        }
    }
}

fn run_callbacks(
    dispatcher: Dispatcher,
    mut chain: VecDeque<CallbackPair>,
    outcome: Result<Value>,
    bouncer: Bouncer<Step>,
) {
    let outcome = match outcome {
        Ok(value) => match value.downcast::<Effect>() {
            Ok(effect) => {
                let (intent, callbacks) = effect.into_parts();
                trace!(
                    intent = intent.name(),
                    spliced = callbacks.len(),
                    remaining = chain.len(),
                    "substituting nested effect"
                );
                for pair in callbacks.into_iter().rev() {
                    chain.push_front(pair);
                }
                bouncer.bounce(Step::Resolve {
                    dispatcher,
                    intent,
                    chain,
                });
                return;
            }
            Err(value) => Ok(value),
        },
        Err(error) => Err(error),
    };

    match chain.pop_front() {
        Some(pair) => {
            let outcome = pair.invoke(outcome);
            bouncer.bounce(Step::RunCallbacks {
                dispatcher,
                chain,
                outcome,
            });
        }
        None => {
            if let Err(error) = &outcome {
                debug!(%error, "callback chain ended with an unhandled error");
            }
        }
    }
}
