//! Thread-pool performer for parallel effects
//!
//! Each child is sync-performed on a rayon worker, so children must
//! complete synchronously; an asynchronous child fails with
//! `NotSynchronous` like any other error.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use ricochet_core::{
    sync_perform, Dispatcher, EffectError, Intent, ParallelEffects, Perform, Performer, Result,
    ResultBox, Value,
};
use tracing::trace;

use crate::config::{ConfigError, ParallelConfig};

/// Performs `ParallelEffects` on a shared worker pool
#[derive(Clone)]
pub struct PoolPerformer {
    pool: Arc<ThreadPool>,
}

impl PoolPerformer {
    /// Use an existing pool
    pub fn new(pool: ThreadPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Build a pool sized and named per `config`
    pub fn from_config(config: &ParallelConfig) -> std::result::Result<Self, ConfigError> {
        let prefix = config.thread_name.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads.unwrap_or(0))
            .thread_name(move |index| format!("{prefix}-{index}"))
            .build()?;
        Ok(Self::new(pool))
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Shared performer handle
    pub fn performer(&self) -> Performer {
        Performer::from_perform(self.clone())
    }

    /// Sync-perform every child on the pool, results in input order
    ///
    /// All children run to completion. If any failed, the one with the
    /// lowest index is reported as a `FirstError`.
    pub fn perform_parallel(&self, dispatcher: &Dispatcher, effects: &ParallelEffects) -> Result<Value> {
        trace!(
            children = effects.len(),
            threads = self.threads(),
            "performing parallel effects on pool"
        );
        let outcomes: Vec<Result<Value>> = self.pool.install(|| {
            effects
                .effects
                .par_iter()
                .map(|effect| sync_perform(dispatcher, effect.clone()))
                .collect()
        });

        let mut values = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(value) => values.push(value),
                Err(error) => return Err(EffectError::first_error(index, error)),
            }
        }
        Ok(Value::new(values))
    }
}

impl Perform for PoolPerformer {
    fn perform(&self, dispatcher: &Dispatcher, intent: &Intent, result: ResultBox) -> Result<()> {
        match intent {
            Intent::Parallel(effects) => result.resolve(self.perform_parallel(dispatcher, effects)),
            other => result.fail(other.unexpected("ParallelEffects")),
        }
        Ok(())
    }
}

impl fmt::Debug for PoolPerformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolPerformer")
            .field("threads", &self.threads())
            .finish()
    }
}
