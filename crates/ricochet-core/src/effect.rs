//! Effects: an intent plus its ordered callback chain
//!
//! An [`Effect`] is an immutable value. [`Effect::on`] returns a new effect
//! with one more callback pair appended and leaves the original untouched.
//! Callback lists are persistent, so appending is O(1) and earlier effects
//! share structure with the ones built from them.

use std::fmt;
use std::sync::Arc;

use crate::error::{EffectError, Result};
use crate::intent::Intent;
use crate::value::Value;

/// Callback run with a success value
pub type SuccessFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Callback run with an error
pub type ErrorFn = Arc<dyn Fn(EffectError) -> Result<Value> + Send + Sync>;

/// A (success, error) callback pair
///
/// Either half may be absent. An absent half lets the current outcome pass
/// through unchanged to the next pair, and a pair with both halves absent is
/// a no-op placeholder.
#[derive(Clone, Default)]
pub struct CallbackPair {
    success: Option<SuccessFn>,
    error: Option<ErrorFn>,
}

impl CallbackPair {
    /// A pair with neither half set
    pub fn new() -> Self {
        Self::default()
    }

    /// A pair with only a success half
    pub fn success<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new().with_success(f)
    }

    /// A pair with only an error half
    pub fn error<G>(g: G) -> Self
    where
        G: Fn(EffectError) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new().with_error(g)
    }

    /// A pair with both halves set
    pub fn both<F, G>(f: F, g: G) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
        G: Fn(EffectError) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new().with_success(f).with_error(g)
    }

    /// Set the success half
    pub fn with_success<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.success = Some(Arc::new(f));
        self
    }

    /// Set the error half
    pub fn with_error<G>(mut self, g: G) -> Self
    where
        G: Fn(EffectError) -> Result<Value> + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(g));
        self
    }

    /// Whether the success half is set
    pub fn has_success(&self) -> bool {
        self.success.is_some()
    }

    /// Whether the error half is set
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Feed an outcome through the half that matches it
    ///
    /// A missing half returns the outcome unchanged. Whatever the invoked
    /// half returns becomes the new outcome.
    pub fn invoke(&self, outcome: Result<Value>) -> Result<Value> {
        match outcome {
            Ok(value) => match &self.success {
                Some(success) => success(value),
                None => Ok(value),
            },
            Err(error) => match &self.error {
                Some(handler) => handler(error),
                None => Err(error),
            },
        }
    }
}

impl fmt::Debug for CallbackPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackPair")
            .field("success", &self.has_success())
            .field("error", &self.has_error())
            .finish()
    }
}

struct Node {
    pair: CallbackPair,
    prev: Option<Arc<Node>>,
}

impl Drop for Node {
    // Unlink iteratively so long chains don't recurse once per node
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            match Arc::try_unwrap(node) {
                Ok(mut node) => prev = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// Persistent, append-only list of callback pairs (newest last)
#[derive(Clone, Default)]
struct CallbackList {
    tail: Option<Arc<Node>>,
    len: usize,
}

impl CallbackList {
    fn push(&self, pair: CallbackPair) -> Self {
        Self {
            tail: Some(Arc::new(Node {
                pair,
                prev: self.tail.clone(),
            })),
            len: self.len + 1,
        }
    }

    fn to_vec(&self) -> Vec<CallbackPair> {
        let mut pairs = Vec::with_capacity(self.len);
        let mut cursor = self.tail.as_deref();
        while let Some(node) = cursor {
            pairs.push(node.pair.clone());
            cursor = node.prev.as_deref();
        }
        pairs.reverse();
        pairs
    }
}

/// An intent together with the callbacks bound to its result
#[derive(Clone)]
pub struct Effect {
    intent: Arc<Intent>,
    callbacks: CallbackList,
}

impl Effect {
    /// Wrap an intent with no callbacks
    pub fn new(intent: impl Into<Intent>) -> Self {
        Self {
            intent: Arc::new(intent.into()),
            callbacks: CallbackList::default(),
        }
    }

    /// Wrap an application-defined intent
    pub fn custom<T: std::any::Any + fmt::Debug + Send + Sync>(intent: T) -> Self {
        Self::new(Intent::custom(intent))
    }

    /// The intent this effect performs
    pub fn intent(&self) -> &Intent {
        &self.intent
    }

    /// Return a new effect with `pair` appended to the callback chain
    ///
    /// The effect's result goes to the first pair; each later pair receives
    /// what the previous one returned. Successes go to `success` halves and
    /// errors to `error` halves. If a callback returns an [`Effect`] (wrapped
    /// with [`Value::effect`]), that effect is performed and its result is
    /// passed to the next pair.
    pub fn on(&self, pair: CallbackPair) -> Self {
        Self {
            intent: Arc::clone(&self.intent),
            callbacks: self.callbacks.push(pair),
        }
    }

    /// Append a success-only callback
    pub fn on_success<F>(&self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.on(CallbackPair::success(f))
    }

    /// Append an error-only callback
    pub fn on_error<G>(&self, g: G) -> Self
    where
        G: Fn(EffectError) -> Result<Value> + Send + Sync + 'static,
    {
        self.on(CallbackPair::error(g))
    }

    /// Append a callback pair with both halves
    pub fn on_both<F, G>(&self, f: F, g: G) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
        G: Fn(EffectError) -> Result<Value> + Send + Sync + 'static,
    {
        self.on(CallbackPair::both(f, g))
    }

    /// Number of callback pairs bound so far
    pub fn callback_count(&self) -> usize {
        self.callbacks.len
    }

    /// Callback pairs in attachment order
    pub fn callbacks(&self) -> Vec<CallbackPair> {
        self.callbacks.to_vec()
    }

    /// Split into the shared intent and the ordered callbacks
    pub fn into_parts(self) -> (Arc<Intent>, Vec<CallbackPair>) {
        let callbacks = self.callbacks.to_vec();
        (self.intent, callbacks)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("intent", &self.intent)
            .field("callbacks", &self.callbacks.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Constant;

    fn add(n: i64) -> impl Fn(Value) -> Result<Value> + Send + Sync + 'static {
        move |value| Ok(Value::new(value.into_inner::<i64>()? + n))
    }

    #[test]
    fn test_on_returns_new_effect() {
        let base = Effect::new(Constant::new(1_i64));
        let extended = base.on_success(add(1));
        assert_eq!(base.callback_count(), 0);
        assert_eq!(extended.callback_count(), 1);
    }

    #[test]
    fn test_branches_share_prefix() {
        let base = Effect::new(Constant::new(1_i64)).on_success(add(1));
        let left = base.on_success(add(10));
        let right = base.on_error(|error| Err(error));
        assert_eq!(left.callback_count(), 2);
        assert_eq!(right.callback_count(), 2);
        assert!(left.callbacks()[1].has_success());
        assert!(right.callbacks()[1].has_error());
        assert!(!right.callbacks()[1].has_success());
    }

    #[test]
    fn test_callbacks_in_attachment_order() {
        let effect = Effect::new(Constant::new(0_i64))
            .on_success(add(1))
            .on_success(add(2))
            .on_success(add(3));
        let outcome = effect
            .callbacks()
            .iter()
            .fold(Ok(Value::new(0_i64)), |outcome, pair| pair.invoke(outcome));
        assert_eq!(outcome.unwrap().into_inner::<i64>().unwrap(), 6);
    }

    #[test]
    fn test_absent_half_passes_outcome_through() {
        let only_error = CallbackPair::error(|_| Ok(Value::new("handled")));
        let passed = only_error.invoke(Ok(Value::new(5_i64))).unwrap();
        assert_eq!(passed.into_inner::<i64>().unwrap(), 5);

        let empty = CallbackPair::new();
        let err = empty.invoke(Err(EffectError::failed("boom"))).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_long_chain_drops_without_recursion() {
        let mut effect = Effect::new(Constant::new(0_i64));
        for _ in 0..200_000 {
            effect = effect.on(CallbackPair::new());
        }
        assert_eq!(effect.callback_count(), 200_000);
        drop(effect);
    }
}
