//! A minimal application intent

use ricochet_core::{sync_performer_for, Dispatcher, TypeDispatcher, Value};

/// Application intent whose result is the number it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Echo(pub i64);

impl Echo {
    /// The result performing this intent should produce
    pub fn reply(&self) -> Value {
        Value::new(self.0)
    }
}

/// Dispatcher that performs [`Echo`] synchronously
pub fn echo_dispatcher() -> Dispatcher {
    TypeDispatcher::new()
        .with_custom::<Echo>(sync_performer_for(|_, echo: &Echo| Ok(echo.reply())))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricochet_core::{sync_perform, Effect};

    #[test]
    fn test_echo_replies_with_its_number() {
        let value = sync_perform(&echo_dispatcher(), Effect::custom(Echo(9))).unwrap();
        assert_eq!(value.into_inner::<i64>().unwrap(), 9);
    }
}
