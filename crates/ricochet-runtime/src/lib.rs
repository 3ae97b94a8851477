//! Ricochet Runtime - Configured Dispatch
//!
//! Assembles a ready-to-use dispatcher from [`RuntimeConfig`]: application
//! layers first, then a `ParallelEffects` performer picked by strategy, then
//! the base performers. Provides the rayon-backed [`PoolPerformer`] used by
//! the `pool` strategy.
//!
//! ```rust
//! use ricochet_core::{parallel, Constant, Effect, Value};
//! use ricochet_runtime::{ParallelStrategy, Runtime, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_toml_str("[parallel]\nstrategy = \"serial\"\n").unwrap();
//! assert_eq!(config.parallel.strategy, ParallelStrategy::Serial);
//!
//! let runtime = Runtime::from_config(&config).unwrap();
//! let effect = parallel([1_i64, 2].map(|v| Effect::new(Constant::new(v))));
//! let values = runtime.sync_perform(effect).unwrap().into_inner::<Vec<Value>>().unwrap();
//! assert_eq!(values.len(), 2);
//! ```

#![forbid(unsafe_code)]

/// Runtime configuration
pub mod config;

/// Thread-pool performer
pub mod pool;

/// Dispatcher assembly
pub mod runtime;

pub use config::{ConfigError, ParallelConfig, ParallelStrategy, RuntimeConfig};
pub use pool::PoolPerformer;
pub use runtime::Runtime;
