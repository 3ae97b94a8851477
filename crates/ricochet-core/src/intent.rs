//! Intents: inert descriptions of side effects
//!
//! The built-in intents form a closed sum type so the core and the standard
//! performers can match on them directly. Application intents ride in
//! [`Intent::Custom`] and are identified by their `TypeId`.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{EffectError, Result};
use crate::parallel::ParallelEffects;
use crate::value::Value;

/// Description of a side effect to perform
#[derive(Debug, Clone)]
pub enum Intent {
    /// Results in a pre-specified value
    Constant(Constant),
    /// Fails with a pre-specified error
    Fail(Fail),
    /// Results in whatever a stored function returns
    Func(Func),
    /// Waits for a duration, then results in `()`
    Delay(Delay),
    /// Runs child effects and gathers their results in input order
    Parallel(ParallelEffects),
    /// Application-defined intent
    Custom(CustomIntent),
}

impl Intent {
    /// Wrap an application-defined intent
    pub fn custom<T: Any + fmt::Debug + Send + Sync>(intent: T) -> Self {
        Self::Custom(CustomIntent::new(intent))
    }

    /// Key used for type-based dispatch
    pub fn key(&self) -> IntentKey {
        match self {
            Self::Constant(_) => IntentKey::Constant,
            Self::Fail(_) => IntentKey::Fail,
            Self::Func(_) => IntentKey::Func,
            Self::Delay(_) => IntentKey::Delay,
            Self::Parallel(_) => IntentKey::Parallel,
            Self::Custom(custom) => custom.key(),
        }
    }

    /// Human readable intent name
    pub fn name(&self) -> &'static str {
        self.key().name()
    }

    /// Borrow an application intent as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(custom) => custom.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Borrow an application intent as `T`, failing with [`EffectError::UnexpectedIntent`]
    pub fn expect_custom<T: Any>(&self) -> Result<&T> {
        self.downcast_ref::<T>()
            .ok_or_else(|| self.unexpected(std::any::type_name::<T>()))
    }

    /// Error for a performer of `expected` that was handed this intent
    pub fn unexpected(&self, expected: &'static str) -> EffectError {
        EffectError::UnexpectedIntent {
            expected,
            found: self.name().to_string(),
        }
    }
}

/// Dispatch key identifying an intent's type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKey {
    /// [`Constant`]
    Constant,
    /// [`Fail`]
    Fail,
    /// [`Func`]
    Func,
    /// [`Delay`]
    Delay,
    /// [`ParallelEffects`]
    Parallel,
    /// An application intent type
    Custom {
        /// Type identity
        type_id: TypeId,
        /// Type name, for diagnostics
        name: &'static str,
    },
}

impl IntentKey {
    /// Key for the application intent type `T`
    pub fn custom<T: Any>() -> Self {
        Self::Custom {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Human readable key name
    pub fn name(&self) -> &'static str {
        match *self {
            Self::Constant => "Constant",
            Self::Fail => "Fail",
            Self::Func => "Func",
            Self::Delay => "Delay",
            Self::Parallel => "ParallelEffects",
            Self::Custom { name, .. } => name,
        }
    }
}

impl fmt::Display for IntentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Object-safe view of an application intent
pub trait AnyIntent: Any + fmt::Debug + Send + Sync {
    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> AnyIntent for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared handle to an application intent
#[derive(Clone)]
pub struct CustomIntent {
    inner: Arc<dyn AnyIntent>,
    key: IntentKey,
}

impl CustomIntent {
    /// Wrap an application intent
    pub fn new<T: Any + fmt::Debug + Send + Sync>(intent: T) -> Self {
        Self {
            inner: Arc::new(intent),
            key: IntentKey::custom::<T>(),
        }
    }

    /// Dispatch key of the wrapped type
    pub fn key(&self) -> IntentKey {
        self.key
    }

    /// Borrow the wrapped intent as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

/// Produces fresh copies of a constant result
trait ConstantValue: fmt::Debug + Send + Sync {
    fn produce(&self) -> Value;
}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> ConstantValue for T {
    fn produce(&self) -> Value {
        Value::new(self.clone())
    }
}

/// An intent that results in a pre-specified value when performed
///
/// The value is cloned on every perform, so the same effect can be
/// performed any number of times.
#[derive(Clone)]
pub struct Constant {
    value: Arc<dyn ConstantValue>,
}

impl Constant {
    /// Create a constant intent
    pub fn new<T: Clone + fmt::Debug + Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Arc::new(value),
        }
    }

    /// A fresh copy of the result
    pub fn result(&self) -> Value {
        (*self.value).produce()
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constant").field(&self.value).finish()
    }
}

/// An intent that fails with a pre-specified error when performed
#[derive(Debug, Clone)]
pub struct Fail {
    /// Error the effect fails with
    pub error: EffectError,
}

impl Fail {
    /// Create a failing intent
    pub fn new(error: EffectError) -> Self {
        Self { error }
    }
}

type Thunk = dyn Fn() -> Result<Value> + Send + Sync;

/// An intent that results in the return value of a function
///
/// This wraps an opaque callable, so unlike the other intents it cannot be
/// inspected or performed differently in tests. Prefer inert intents; `Func`
/// exists to integrate legacy side-effecting code quickly.
#[derive(Clone)]
pub struct Func {
    func: Arc<Thunk>,
}

impl Func {
    /// Create a function intent
    pub fn new<F>(func: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Call the stored function
    pub fn call(&self) -> Result<Value> {
        (self.func)()
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Func(..)")
    }
}

/// An intent representing a delay in time
///
/// No standard performer exists; applications supply one suited to their
/// event loop or thread model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delay {
    /// How long to wait
    pub duration: Duration,
}

impl Delay {
    /// Create a delay intent
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl From<Constant> for Intent {
    fn from(intent: Constant) -> Self {
        Self::Constant(intent)
    }
}

impl From<Fail> for Intent {
    fn from(intent: Fail) -> Self {
        Self::Fail(intent)
    }
}

impl From<Func> for Intent {
    fn from(intent: Func) -> Self {
        Self::Func(intent)
    }
}

impl From<Delay> for Intent {
    fn from(intent: Delay) -> Self {
        Self::Delay(intent)
    }
}

impl From<ParallelEffects> for Intent {
    fn from(intent: ParallelEffects) -> Self {
        Self::Parallel(intent)
    }
}

impl From<CustomIntent> for Intent {
    fn from(intent: CustomIntent) -> Self {
        Self::Custom(intent)
    }
}
