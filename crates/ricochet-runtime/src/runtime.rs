//! Configuration-driven dispatcher assembly

use ricochet_core::{
    base_dispatcher, parallel_async_performer, perform, perform_future, serial_performer,
    sync_perform, ComposedDispatcher, Dispatcher, Effect, EffectFuture, IntentKey, Performer,
    Result, TypeDispatcher, Value,
};
use tracing::debug;

use crate::config::{ConfigError, ParallelStrategy, RuntimeConfig};
use crate::pool::PoolPerformer;

/// A dispatcher stack built from [`RuntimeConfig`]
///
/// Lookups go through, in order:
/// 1. application dispatchers added with [`Runtime::layer`], earliest first
/// 2. the `ParallelEffects` performer selected by the parallel strategy
/// 3. [`base_dispatcher`]
#[derive(Debug, Clone)]
pub struct Runtime {
    config: RuntimeConfig,
    layers: Vec<Dispatcher>,
    parallel: Performer,
    dispatcher: Dispatcher,
}

impl Runtime {
    /// Build a runtime with default configuration
    pub fn new() -> std::result::Result<Self, ConfigError> {
        Self::from_config(&RuntimeConfig::default())
    }

    /// Validate `config` and build its runtime
    pub fn from_config(config: &RuntimeConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let parallel = match config.parallel.strategy {
            ParallelStrategy::Serial => serial_performer(),
            ParallelStrategy::Async => parallel_async_performer(),
            ParallelStrategy::Pool => PoolPerformer::from_config(&config.parallel)?.performer(),
        };
        let dispatcher = compose(&[], &parallel);
        debug!(strategy = %config.parallel.strategy, "runtime assembled");
        Ok(Self {
            config: config.clone(),
            layers: Vec::new(),
            parallel,
            dispatcher,
        })
    }

    /// Add an application dispatcher below the ones already added
    pub fn layer(mut self, dispatcher: impl Into<Dispatcher>) -> Self {
        self.layers.push(dispatcher.into());
        self.dispatcher = compose(&self.layers, &self.parallel);
        debug!(layers = self.layers.len(), "dispatcher layer added");
        self
    }

    /// The configuration this runtime was built from
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The assembled dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// See [`ricochet_core::perform`]
    pub fn perform(&self, effect: Effect) {
        perform(&self.dispatcher, effect);
    }

    /// See [`ricochet_core::sync_perform`]
    pub fn sync_perform(&self, effect: Effect) -> Result<Value> {
        sync_perform(&self.dispatcher, effect)
    }

    /// See [`ricochet_core::perform_future`]
    pub fn perform_future(&self, effect: Effect) -> EffectFuture {
        perform_future(&self.dispatcher, effect)
    }
}

fn compose(layers: &[Dispatcher], parallel: &Performer) -> Dispatcher {
    let mut composed = ComposedDispatcher::new(layers.iter().cloned());
    composed.push(TypeDispatcher::new().with(IntentKey::Parallel, parallel.clone()));
    composed.push(base_dispatcher());
    composed.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricochet_core::{sync_performer, Constant};

    #[test]
    fn test_base_intents_without_layers() {
        let runtime = Runtime::new().unwrap();
        let value = runtime.sync_perform(Effect::new(Constant::new(1_i64))).unwrap();
        assert_eq!(value.into_inner::<i64>().unwrap(), 1);
    }

    #[test]
    fn test_layers_take_priority_over_base() {
        let override_constants = TypeDispatcher::new().with(
            IntentKey::Constant,
            sync_performer(|_, _| Ok(Value::new("overridden"))),
        );
        let runtime = Runtime::new().unwrap().layer(override_constants);
        let value = runtime.sync_perform(Effect::new(Constant::new(1_i64))).unwrap();
        assert_eq!(value.into_inner::<&str>().unwrap(), "overridden");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.parallel.threads = Some(0);
        assert!(matches!(
            Runtime::from_config(&config),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
