//! Dispatchers: intent to performer lookup
//!
//! A dispatcher maps an intent to the [`Performer`] that knows how to carry
//! it out. Lookup is pure; every side effect happens inside performers.
//!
//! Two strategies are provided. [`TypeDispatcher`] is a registry keyed by
//! [`IntentKey`], and [`ComposedDispatcher`] tries an ordered list of
//! dispatchers and returns the first performer found, so application
//! performers can be layered over a baseline without modifying either.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::intent::{Intent, IntentKey};
use crate::result_box::ResultBox;
use crate::sync::sync_performer;

/// Code that carries out an intent and reports into a [`ResultBox`]
///
/// A performer must write its box exactly once, synchronously or later. It
/// receives the dispatcher so it can perform nested effects. Returning an
/// error is equivalent to failing the box, provided the box was not written.
pub trait Perform: Send + Sync {
    /// Carry out `intent`, reporting through `result`
    fn perform(&self, dispatcher: &Dispatcher, intent: &Intent, result: ResultBox) -> Result<()>;
}

impl<F> Perform for F
where
    F: Fn(&Dispatcher, &Intent, ResultBox) -> Result<()> + Send + Sync,
{
    fn perform(&self, dispatcher: &Dispatcher, intent: &Intent, result: ResultBox) -> Result<()> {
        self(dispatcher, intent, result)
    }
}

/// Shared handle to a performer
#[derive(Clone)]
pub struct Performer(Arc<dyn Perform>);

impl Performer {
    /// Wrap a performer function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Dispatcher, &Intent, ResultBox) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wrap any [`Perform`] implementation
    pub fn from_perform<P: Perform + 'static>(performer: P) -> Self {
        Self(Arc::new(performer))
    }

    /// Run the performer
    pub fn perform(&self, dispatcher: &Dispatcher, intent: &Intent, result: ResultBox) -> Result<()> {
        self.0.perform(dispatcher, intent, result)
    }
}

impl fmt::Debug for Performer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Performer(..)")
    }
}

/// Intent to performer lookup strategy
pub trait Dispatch: Send + Sync {
    /// Find the performer for `intent`, if this dispatcher handles it
    fn performer(&self, intent: &Intent) -> Option<Performer>;
}

impl<F> Dispatch for F
where
    F: Fn(&Intent) -> Option<Performer> + Send + Sync,
{
    fn performer(&self, intent: &Intent) -> Option<Performer> {
        self(intent)
    }
}

/// Shared handle to a dispatcher
#[derive(Clone)]
pub struct Dispatcher(Arc<dyn Dispatch>);

impl Dispatcher {
    /// Wrap any [`Dispatch`] implementation
    pub fn new<D: Dispatch + 'static>(dispatch: D) -> Self {
        Self(Arc::new(dispatch))
    }

    /// Wrap a lookup function
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Intent) -> Option<Performer> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Find the performer for `intent`
    pub fn performer(&self, intent: &Intent) -> Option<Performer> {
        self.0.performer(intent)
    }
}

impl Dispatch for Dispatcher {
    fn performer(&self, intent: &Intent) -> Option<Performer> {
        self.0.performer(intent)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatcher(..)")
    }
}

impl From<TypeDispatcher> for Dispatcher {
    fn from(dispatcher: TypeDispatcher) -> Self {
        Self::new(dispatcher)
    }
}

impl From<ComposedDispatcher> for Dispatcher {
    fn from(dispatcher: ComposedDispatcher) -> Self {
        Self::new(dispatcher)
    }
}

/// Dispatcher that looks performers up by intent type
#[derive(Clone, Default)]
pub struct TypeDispatcher {
    performers: HashMap<IntentKey, Performer>,
}

impl TypeDispatcher {
    /// Create an empty type dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a performer for `key`, builder style
    pub fn with(mut self, key: IntentKey, performer: Performer) -> Self {
        self.register(key, performer);
        self
    }

    /// Add a performer for the application intent type `T`, builder style
    pub fn with_custom<T: std::any::Any>(self, performer: Performer) -> Self {
        self.with(IntentKey::custom::<T>(), performer)
    }

    /// Register a performer for `key`, returning the one it replaces
    pub fn register(&mut self, key: IntentKey, performer: Performer) -> Option<Performer> {
        self.performers.insert(key, performer)
    }

    /// Remove the performer for `key`
    pub fn unregister(&mut self, key: IntentKey) -> Option<Performer> {
        self.performers.remove(&key)
    }

    /// Check if a performer is registered for `key`
    pub fn is_registered(&self, key: IntentKey) -> bool {
        self.performers.contains_key(&key)
    }

    /// All keys with a registered performer
    pub fn registered_keys(&self) -> Vec<IntentKey> {
        self.performers.keys().copied().collect()
    }
}

impl Dispatch for TypeDispatcher {
    fn performer(&self, intent: &Intent) -> Option<Performer> {
        self.performers.get(&intent.key()).cloned()
    }
}

impl fmt::Debug for TypeDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.performers.keys().map(IntentKey::name).collect();
        keys.sort_unstable();
        f.debug_struct("TypeDispatcher").field("keys", &keys).finish()
    }
}

/// Dispatcher that searches other dispatchers in order
#[derive(Clone, Default)]
pub struct ComposedDispatcher {
    dispatchers: Vec<Dispatcher>,
}

impl ComposedDispatcher {
    /// Compose `dispatchers`, earliest first
    pub fn new<I>(dispatchers: I) -> Self
    where
        I: IntoIterator<Item = Dispatcher>,
    {
        Self {
            dispatchers: dispatchers.into_iter().collect(),
        }
    }

    /// Append a dispatcher with the lowest priority
    pub fn push(&mut self, dispatcher: impl Into<Dispatcher>) {
        self.dispatchers.push(dispatcher.into());
    }

    /// Number of composed dispatchers
    pub fn len(&self) -> usize {
        self.dispatchers.len()
    }

    /// Whether no dispatchers are composed
    pub fn is_empty(&self) -> bool {
        self.dispatchers.is_empty()
    }
}

impl Dispatch for ComposedDispatcher {
    fn performer(&self, intent: &Intent) -> Option<Performer> {
        self.dispatchers
            .iter()
            .find_map(|dispatcher| dispatcher.performer(intent))
    }
}

impl fmt::Debug for ComposedDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedDispatcher")
            .field("dispatchers", &self.dispatchers.len())
            .finish()
    }
}

/// Dispatcher for the built-in [`Constant`](crate::intent::Constant),
/// [`Fail`](crate::intent::Fail) and [`Func`](crate::intent::Func) intents
pub fn base_dispatcher() -> Dispatcher {
    TypeDispatcher::new()
        .with(
            IntentKey::Constant,
            sync_performer(|_, intent| match intent {
                Intent::Constant(constant) => Ok(constant.result()),
                other => Err(other.unexpected("Constant")),
            }),
        )
        .with(
            IntentKey::Fail,
            sync_performer(|_, intent| match intent {
                Intent::Fail(fail) => Err(fail.error.clone()),
                other => Err(other.unexpected("Fail")),
            }),
        )
        .with(
            IntentKey::Func,
            sync_performer(|_, intent| match intent {
                Intent::Func(func) => func.call(),
                other => Err(other.unexpected("Func")),
            }),
        )
        .into()
}
