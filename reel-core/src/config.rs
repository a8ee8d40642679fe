//! # Configuration
//!
//! A flat string key/value store with dotted keys (`storage.root`,
//! `policy.short_form.max_bytes`). Binaries layer it themselves:
//! defaults first, then environment overrides.
//!
//! ```rust
//! use reel_core::ReelConfig;
//!
//! let mut config = ReelConfig::new();
//! config.set_default("http.port", "3030");
//! config.set("http.port", "8080");
//!
//! assert_eq!(config.snapshot().get_u64("http.port"), Some(8080));
//! ```
//!
//! Environment variables map by stripping a prefix, lowercasing, and
//! turning `__` into `.`: `REEL__STORAGE__ROOT` → `storage.root`.

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct ReelConfig {
    values: HashMap<String, String>,
}

impl ReelConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Sets `key` only if nothing has set it yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Applies every `(name, value)` pair whose name starts with `prefix`.
    pub fn merge_env<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            if let Some(stripped) = name.strip_prefix(prefix) {
                let key = stripped.to_lowercase().replace("__", ".");
                if !key.is_empty() {
                    self.values.insert(key, value);
                }
            }
        }
    }

    /// Reads overrides from the process environment.
    pub fn load_env(&mut self, prefix: &str) {
        self.merge_env(prefix, std::env::vars());
    }

    pub fn snapshot(&self) -> ReelConfigSnapshot {
        ReelConfigSnapshot::new(self.values.clone())
    }
}

/// Immutable, typed view over a [`ReelConfig`].
#[derive(Debug, Clone, Default)]
pub struct ReelConfigSnapshot {
    map: HashMap<String, String>,
}

impl ReelConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    /// Returns `None` for missing and for blank values.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map
            .get(key)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }
}
