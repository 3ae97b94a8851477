//! Unified error type for effect execution
//!
//! Every failure the execution core routes through a callback chain is an
//! [`EffectError`]. Errors returned by performers and callbacks are delivered
//! to the next error callback unchanged; only dispatch misses, parallel
//! aggregation and the synchronous bridge add variants of their own.

use std::fmt;
use std::sync::Arc;

/// Error type for all effect operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum EffectError {
    /// No dispatcher produced a performer for the intent
    #[error("No performer found for intent {intent}")]
    NoPerformerFound {
        /// Debug rendering of the unperformed intent
        intent: String,
    },

    /// The chain had not finished by the time `perform` returned
    #[error("Performing {effect} was not synchronous")]
    NotSynchronous {
        /// Debug rendering of the effect that suspended
        effect: String,
    },

    /// A child of a parallel effect failed
    #[error(transparent)]
    FirstError(#[from] FirstError),

    /// A value did not have the type the caller asked for
    #[error("Expected a value of type {expected}, found {found}")]
    UnexpectedValue {
        /// Requested type
        expected: &'static str,
        /// Stored type
        found: &'static str,
    },

    /// A performer was handed an intent it does not perform
    #[error("Performer for {expected} cannot perform {found}")]
    UnexpectedIntent {
        /// Intent the performer handles
        expected: &'static str,
        /// Intent it received
        found: String,
    },

    /// The callback chain was dropped before producing a result
    #[error("Effect was abandoned before producing a result")]
    Abandoned,

    /// Plain failure with a message
    #[error("{message}")]
    Failed {
        /// Error message
        message: String,
    },

    /// Application-defined error
    #[error("{0}")]
    Custom(Arc<dyn std::error::Error + Send + Sync>),
}

impl EffectError {
    /// Create a plain message failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Wrap an application error
    pub fn custom(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(error))
    }

    /// Create a no-performer error for an intent
    pub fn no_performer_found(intent: &impl fmt::Debug) -> Self {
        Self::NoPerformerFound {
            intent: format!("{intent:?}"),
        }
    }

    /// Create a not-synchronous error for an effect
    pub fn not_synchronous(effect: &impl fmt::Debug) -> Self {
        Self::NotSynchronous {
            effect: format!("{effect:?}"),
        }
    }

    /// Wrap a child failure with its position
    pub fn first_error(index: usize, error: EffectError) -> Self {
        Self::FirstError(FirstError::new(index, error))
    }

    /// Borrow a wrapped application error as `E`
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Custom(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Borrow the positional failure, if this is one
    pub fn as_first_error(&self) -> Option<&FirstError> {
        match self {
            Self::FirstError(first) => Some(first),
            _ => None,
        }
    }
}

/// The first failure observed among parallel child effects
#[derive(Debug, Clone, thiserror::Error)]
#[error("(index={index}) {error}")]
pub struct FirstError {
    /// Zero-based position of the failing child
    pub index: usize,
    /// The child's error
    #[source]
    pub error: Box<EffectError>,
}

impl FirstError {
    /// Create a positional failure
    pub fn new(index: usize, error: EffectError) -> Self {
        Self {
            index,
            error: Box::new(error),
        }
    }

    /// The child's error
    pub fn error(&self) -> &EffectError {
        &self.error
    }
}

/// Standard Result type for effect operations
pub type Result<T> = std::result::Result<T, EffectError>;
