//! Thread-safe call log

use std::sync::Arc;

use parking_lot::Mutex;
use ricochet_core::{Result, Value};

/// Ordered log shared between a test and the callbacks it installs
#[derive(Debug)]
pub struct Recorder<T> {
    entries: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone + Send + 'static> Recorder<T> {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn record(&self, entry: T) {
        self.entries.lock().push(entry);
    }

    /// Snapshot of the entries so far
    pub fn entries(&self) -> Vec<T> {
        self.entries.lock().clone()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Success callback that records `entry` and passes the value on
    pub fn tap(&self, entry: T) -> impl Fn(Value) -> Result<Value> + Send + Sync + 'static
    where
        T: Sync,
    {
        let recorder = self.clone();
        move |value| {
            recorder.record(entry.clone());
            Ok(value)
        }
    }
}
