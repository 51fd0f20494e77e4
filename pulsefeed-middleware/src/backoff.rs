use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-key cooldown tracker for rate-limited sources.
///
/// When a source signals overload the caller marks the key; until the
/// cooldown elapses every gate check for that key reports backed-off and the
/// caller must skip the network entirely. Keys are independent, so one
/// rate-limited asset does not pause the others.
pub struct BackoffTracker {
    until: Mutex<HashMap<String, Instant>>,
}

impl BackoffTracker {
    /// Create a tracker with no active cooldowns.
    #[must_use]
    pub fn new() -> Self {
        Self {
            until: Mutex::new(HashMap::new()),
        }
    }

    /// Start (or extend) a cooldown for `key`.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn mark_limited(&self, key: &str, cooldown: Duration) {
        let mut until = self.until.lock().expect("mutex poisoned");
        until.insert(key.to_string(), Instant::now() + cooldown);
    }

    /// True while `key` is inside a cooldown window.
    ///
    /// An elapsed cooldown is cleared on observation.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn is_backed_off(&self, key: &str) -> bool {
        let mut until = self.until.lock().expect("mutex poisoned");
        match until.get(key) {
            Some(deadline) if Instant::now() < *deadline => true,
            Some(_) => {
                until.remove(key);
                false
            }
            None => false,
        }
    }

    /// Drop the cooldown for `key`, if any.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self, key: &str) {
        let mut until = self.until.lock().expect("mutex poisoned");
        until.remove(key);
    }
}

impl Default for BackoffTracker {
    fn default() -> Self {
        Self::new()
    }
}
