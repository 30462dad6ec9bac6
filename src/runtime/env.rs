//! Process environment capability.
//!
//! The runtime reads its configuration and context metadata through
//! [`Environment`] and writes the trace header back through it. Production
//! code uses [`ProcessEnv`]; tests substitute a [`MemoryEnv`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Read/write access to environment variables.
pub trait Environment: Send + Sync {
    /// Get a variable, `None` when unset.
    fn get(&self, key: &str) -> Option<String>;

    /// Set a variable, replacing any existing value.
    fn set(&self, key: &str, value: &str);

    /// Get a variable, empty string when unset.
    fn get_or_empty(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&self, key: &str, value: &str) {
        // The invocation loop is the only writer and runs on one task.
        std::env::set_var(key, value);
    }
}

/// In-memory environment for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.lock().insert(key.into(), value.into());
        self
    }

    /// Remove a variable.
    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.vars.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Environment for MemoryEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }
}
