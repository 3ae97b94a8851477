//! Ricochet Testing Infrastructure
//!
//! Shared fixtures for exercising effect chains in tests: a performer that
//! parks result boxes so tests can complete them in any order, a call log
//! for checking callback order, a trivial application intent, and proptest
//! strategies.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! ricochet-testkit = { path = "../ricochet-testkit" }
//! ```
//!
//! ```rust
//! use ricochet_core::{perform, Effect, Value};
//! use ricochet_testkit::{Deferred, Echo, Recorder};
//!
//! let deferred = Deferred::new();
//! let dispatcher = deferred.dispatcher_for::<Echo>();
//! let log = Recorder::new();
//!
//! perform(&dispatcher, Effect::custom(Echo(1)).on_success(log.tap("done")));
//! assert!(log.is_empty());
//!
//! deferred.take(0).unwrap().succeed(Value::unit());
//! assert_eq!(log.entries(), vec!["done"]);
//! ```

pub mod deferred;
pub mod echo;
pub mod logging;
pub mod recorder;
pub mod strategies;

pub use deferred::{Deferred, Parked};
pub use echo::{echo_dispatcher, Echo};
pub use logging::init_tracing;
pub use recorder::Recorder;
