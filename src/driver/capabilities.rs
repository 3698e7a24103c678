//! Desired capabilities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Capability carrying the URL a browser session opens first.
pub const INITIAL_URL: &str = "browserInitialUrl";

// ============================================================================
// Capabilities
// ============================================================================

/// Desired capabilities sent when a session is opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(Map<String, Value>);

impl Capabilities {
    /// Creates an empty capability set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one capability.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Reads one capability.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a copy where `other` overrides entries of `self`.
    #[must_use]
    pub fn merge(&self, other: &Capabilities) -> Capabilities {
        let mut merged = self.0.clone();
        for (k, v) in &other.0 {
            merged.insert(k.clone(), v.clone());
        }
        Capabilities(merged)
    }

    /// The initial URL for browser sessions, if configured.
    #[must_use]
    pub fn initial_url(&self) -> Option<&str> {
        self.get(INITIAL_URL).and_then(Value::as_str)
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no capability is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
