//! Ricochet Core - Effects as Values
//!
//! Side effects are described as inert [`Intent`]s, wrapped in [`Effect`]s
//! that carry an ordered chain of success/error callbacks, and carried out
//! by [`Performer`]s that a [`Dispatcher`] selects. Nothing happens until an
//! effect is handed to [`perform`].
//!
//! # Architecture
//!
//! ## Values
//! - `Intent`: what to do (`Constant`, `Fail`, `Func`, `Delay`, `ParallelEffects`, or an application type)
//! - `Effect`: an intent plus callbacks; `on` returns a new effect, sharing structure
//! - `Value`: the type-erased result passed along the chain
//!
//! ## Dispatch
//! - `TypeDispatcher`: intent type to performer
//! - `ComposedDispatcher`: first match wins over an ordered list
//!
//! ## Execution
//! - `perform`: drives a chain on the trampoline, O(1) stack for synchronous chains
//! - `ResultBox`: write-once channel a performer reports through, now or later
//! - `sync_perform`, `perform_future`: blocking and async bridges
//!
//! ```
//! use ricochet_core::{base_dispatcher, sync_perform, Constant, Effect, Value};
//!
//! let effect = Effect::new(Constant::new(20_i64))
//!     .on_success(|value| Ok(Value::new(value.into_inner::<i64>()? + 1)))
//!     .on_success(|value| Ok(Value::new(value.into_inner::<i64>()? * 2)));
//!
//! let value = sync_perform(&base_dispatcher(), effect).unwrap();
//! assert_eq!(value.into_inner::<i64>().unwrap(), 42);
//! ```

#![forbid(unsafe_code)]

// === Core Modules ===

/// Stack-safe iterative driver
pub mod trampoline;

/// Type-erased results
pub mod value;

/// Unified error handling
pub mod error;

/// Built-in and application intents
pub mod intent;

/// Effects and callback pairs
pub mod effect;

/// Write-once result channel
pub mod result_box;

/// Intent to performer lookup
pub mod dispatcher;

/// The execution core
pub mod perform;

/// Blocking bridge and synchronous performers
pub mod sync;

/// Parallel effects and their performers
pub mod parallel;

/// Async bridge
pub mod future;

// === Public API Re-exports ===

pub use dispatcher::{
    base_dispatcher, ComposedDispatcher, Dispatch, Dispatcher, Perform, Performer,
    TypeDispatcher,
};
pub use effect::{CallbackPair, Effect, ErrorFn, SuccessFn};
pub use error::{EffectError, FirstError, Result};
pub use future::{perform_future, EffectFuture};
pub use intent::{Constant, CustomIntent, Delay, Fail, Func, Intent, IntentKey};
pub use parallel::{
    parallel, parallel_all_errors, parallel_async_performer, perform_parallel_async,
    perform_serially, serial_performer, ParallelEffects,
};
pub use perform::perform;
pub use result_box::ResultBox;
pub use sync::{sync_perform, sync_performer, sync_performer_for};
pub use value::Value;
