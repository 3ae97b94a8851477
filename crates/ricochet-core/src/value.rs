//! Type-erased results flowing through callback chains
//!
//! Performers and callbacks exchange [`Value`]s: owned, `Send`, dynamically
//! typed payloads. A `Value` holding an [`Effect`] is how a callback (or a
//! performer) asks the execution core to substitute that effect's eventual
//! result for its own.

use std::any::Any;
use std::fmt;

use crate::effect::Effect;
use crate::error::{EffectError, Result};

/// An owned, dynamically typed result
pub struct Value {
    inner: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Value {
    /// Wrap any `Send` value
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The `()` value, what terminal callbacks conventionally return
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Wrap an effect whose result should replace the current one
    pub fn effect(effect: Effect) -> Self {
        Self::new(effect)
    }

    /// Name of the stored type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the stored value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.inner.as_ref().is::<T>()
    }

    /// Check whether the stored value is an [`Effect`]
    pub fn is_effect(&self) -> bool {
        self.is::<Effect>()
    }

    /// Borrow the stored value as a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_ref().downcast_ref::<T>()
    }

    /// Take the stored value as a `T`, handing the `Value` back on mismatch
    pub fn downcast<T: Any>(self) -> std::result::Result<T, Value> {
        let type_name = self.type_name;
        match self.inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Value { inner, type_name }),
        }
    }

    /// Take the stored value as a `T`, failing with [`EffectError::UnexpectedValue`]
    pub fn into_inner<T: Any>(self) -> Result<T> {
        self.downcast::<T>().map_err(|value| EffectError::UnexpectedValue {
            expected: std::any::type_name::<T>(),
            found: value.type_name,
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(effect) = self.downcast_ref::<Effect>() {
            return f.debug_tuple("Value").field(effect).finish();
        }
        write!(f, "Value(<{}>)", self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Constant;

    #[test]
    fn test_downcast_roundtrip() {
        let value = Value::new(42_i64);
        assert!(value.is::<i64>());
        assert_eq!(value.downcast_ref::<i64>(), Some(&42));
        assert_eq!(value.into_inner::<i64>().unwrap(), 42);
    }

    #[test]
    fn test_downcast_mismatch_returns_value() {
        let value = Value::new("text");
        let value = value.downcast::<i64>().unwrap_err();
        assert_eq!(value.downcast_ref::<&str>(), Some(&"text"));
    }

    #[test]
    fn test_into_inner_mismatch_names_both_types() {
        let err = Value::new(1_u8).into_inner::<String>().unwrap_err();
        match err {
            EffectError::UnexpectedValue { expected, found } => {
                assert_eq!(expected, std::any::type_name::<String>());
                assert_eq!(found, "u8");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_effect_detection() {
        let value = Value::effect(Effect::new(Constant::new(1)));
        assert!(value.is_effect());
        assert!(!Value::unit().is_effect());
        assert!(format!("{value:?}").contains("Effect"));
    }
}
