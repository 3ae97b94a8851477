//! Parallel effects: run several effects and gather results in input order
//!
//! [`ParallelEffects`] is pure data. How the children actually run is up to
//! the performer registered for it:
//!
//! - [`parallel_async_performer`] performs every child at once and collects
//!   results as they arrive. Use it when children complete asynchronously.
//! - [`serial_performer`] performs children one after another with
//!   [`sync_perform`]. Useful in tests and for simple synchronous programs.
//!
//! Whatever the strategy, the aggregate succeeds with a `Vec<Value>` in the
//! order of the input effects, or fails with a
//! [`FirstError`](crate::error::FirstError) naming the failing child.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::dispatcher::{Dispatcher, Performer};
use crate::effect::Effect;
use crate::error::{EffectError, Result};
use crate::intent::Intent;
use crate::perform::perform;
use crate::result_box::ResultBox;
use crate::sync::sync_perform;
use crate::value::Value;

/// An intent that runs a fixed set of child effects
#[derive(Debug, Clone, Default)]
pub struct ParallelEffects {
    /// Child effects, in the order their results are reported
    pub effects: Vec<Effect>,
}

impl ParallelEffects {
    /// Collect child effects
    pub fn new<I>(effects: I) -> Self
    where
        I: IntoIterator<Item = Effect>,
    {
        Self {
            effects: effects.into_iter().collect(),
        }
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether there are no children
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// An effect that runs `effects` and results in a `Vec<Value>` of their results
///
/// If any child fails, the effect fails with
/// [`EffectError::FirstError`] carrying the child's index and error.
pub fn parallel<I>(effects: I) -> Effect
where
    I: IntoIterator<Item = Effect>,
{
    Effect::new(ParallelEffects::new(effects))
}

/// Like [`parallel`], but collects every child's outcome instead of failing
///
/// Each element of the resulting `Vec<Value>` holds a
/// `Result<Value, EffectError>`.
pub fn parallel_all_errors<I>(effects: I) -> Effect
where
    I: IntoIterator<Item = Effect>,
{
    parallel(effects.into_iter().map(|effect| {
        effect.on_both(
            |value| Ok(Value::new(Ok::<Value, EffectError>(value))),
            |error| Ok(Value::new(Err::<Value, EffectError>(error))),
        )
    }))
}

/// Bookkeeping for one in-flight aggregation
struct Aggregate {
    results: Vec<Option<Value>>,
    remaining: usize,
    /// Taken by whichever child completes the aggregate first
    result: Option<ResultBox>,
}

impl Aggregate {
    fn record(&mut self, index: usize, value: Value) -> Option<(ResultBox, Vec<Value>)> {
        self.result.as_ref()?;
        if self.results[index].replace(value).is_none() {
            self.remaining -= 1;
        }
        if self.remaining > 0 {
            return None;
        }
        let result = self.result.take()?;
        let values = std::mem::take(&mut self.results).into_iter().flatten().collect();
        Some((result, values))
    }

    fn reject(&mut self) -> Option<ResultBox> {
        self.results.clear();
        self.result.take()
    }
}

/// Perform every child of `effects` and report into `result`
///
/// Children are all started before this returns; their results are slotted
/// by input position as they complete, in any order. The first failure
/// fails `result` and every result arriving after it is discarded.
pub fn perform_parallel_async(dispatcher: &Dispatcher, effects: &ParallelEffects, result: ResultBox) {
    let count = effects.len();
    if count == 0 {
        result.succeed(Value::new(Vec::<Value>::new()));
        return;
    }
    trace!(children = count, "performing parallel effects");

    let aggregate = Arc::new(Mutex::new(Aggregate {
        results: (0..count).map(|_| None).collect(),
        remaining: count,
        result: Some(result),
    }));

    for (index, effect) in effects.effects.iter().enumerate() {
        let on_success = Arc::clone(&aggregate);
        let on_error = Arc::clone(&aggregate);
        let child = effect.on_both(
            move |value| {
                let finished = on_success.lock().record(index, value);
                if let Some((result, values)) = finished {
                    result.succeed(Value::new(values));
                }
                Ok(Value::unit())
            },
            move |error| {
                let rejected = on_error.lock().reject();
                match rejected {
                    Some(result) => result.fail(EffectError::first_error(index, error)),
                    None => trace!(index, %error, "discarding failure after aggregate completed"),
                }
                Ok(Value::unit())
            },
        );
        perform(dispatcher, child);
    }
}

/// Perform children one at a time, stopping at the first failure
pub fn perform_serially(dispatcher: &Dispatcher, effects: &ParallelEffects) -> Result<Value> {
    let mut values = Vec::with_capacity(effects.len());
    for (index, effect) in effects.effects.iter().enumerate() {
        let value = sync_perform(dispatcher, effect.clone())
            .map_err(|error| EffectError::first_error(index, error))?;
        values.push(value);
    }
    Ok(Value::new(values))
}

/// Performer for [`ParallelEffects`] built on [`perform_parallel_async`]
pub fn parallel_async_performer() -> Performer {
    Performer::new(|dispatcher, intent, result| {
        match intent {
            Intent::Parallel(effects) => perform_parallel_async(dispatcher, effects, result),
            other => result.fail(other.unexpected("ParallelEffects")),
        }
        Ok(())
    })
}

/// Performer for [`ParallelEffects`] built on [`perform_serially`]
pub fn serial_performer() -> Performer {
    crate::sync::sync_performer(|dispatcher, intent| match intent {
        Intent::Parallel(effects) => perform_serially(dispatcher, effects),
        other => Err(other.unexpected("ParallelEffects")),
    })
}
