//! Keyed async locks.
//!
//! Booking creation is a check-then-act sequence: without serialization, two
//! requests for the last slot in a room could both pass the capacity check.
//! A registry of per-key mutexes gives mutual exclusion for the duration of
//! the sequence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock for a key. Hold the returned mutex across the
    /// whole check-then-act sequence.
    pub fn for_key(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
