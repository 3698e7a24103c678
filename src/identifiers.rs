//! Type-safe identifiers for sessions, surfaces, handles and elements.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Origin | Uniqueness |
//! |------|--------|------------|
//! | [`SessionId`] | local counter | per process |
//! | [`HandleId`] | local UUID | global |
//! | [`SurfaceId`] | remote endpoint | per session, may be reassigned after close |
//! | [`ElementId`] | remote endpoint | per surface |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// SessionId
// ============================================================================

/// Next session number handed out by [`SessionId::next`].
static NEXT_SESSION: AtomicU32 = AtomicU32::new(1);

/// Identifier of one [`DriverSession`](crate::driver::DriverSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(NonZeroU32);

impl SessionId {
    /// Allocates the next process-unique session ID.
    #[must_use]
    pub fn next() -> Self {
        let raw = NEXT_SESSION.fetch_add(1, Ordering::Relaxed).max(1);
        Self(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MIN))
    }

    /// Creates a session ID from a raw value (`None` for zero).
    #[inline]
    #[must_use]
    pub fn from_u32(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

// ============================================================================
// HandleId
// ============================================================================

/// Identity of one [`Handle`](crate::surface::Handle) object.
///
/// Two handles for the same reincarnated surface identifier have different
/// handle IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(Uuid);

impl HandleId {
    /// Generates a fresh handle ID.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell handles apart in logs.
        let simple = self.0.simple().to_string();
        f.write_str(&simple[..8])
    }
}

// ============================================================================
// SurfaceId
// ============================================================================

/// Opaque surface token supplied by the remote endpoint.
///
/// A window handle for browsers, a context name (`NATIVE_APP`,
/// `WEBVIEW_1`) for mobile sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(Arc<str>);

impl SurfaceId {
    /// Creates a surface ID from any string.
    #[inline]
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(Arc::from(raw.as_ref()))
    }

    /// Returns the raw token.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurfaceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SurfaceId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

// ============================================================================
// ElementId
// ============================================================================

/// Element reference returned by the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Creates an element ID.
    #[inline]
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw reference.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_increase() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert!(b > a);
    }

    #[test]
    fn test_session_id_zero_rejected() {
        assert!(SessionId::from_u32(0).is_none());
        assert_eq!(SessionId::from_u32(7).map(|s| s.as_u32()), Some(7));
    }

    #[test]
    fn test_handle_ids_unique() {
        assert_ne!(HandleId::new(), HandleId::new());
    }

    #[test]
    fn test_handle_id_display_is_short() {
        assert_eq!(HandleId::new().to_string().len(), 8);
    }

    #[test]
    fn test_surface_id_equality() {
        let a = SurfaceId::new("WEBVIEW_1");
        let b: SurfaceId = "WEBVIEW_1".into();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "WEBVIEW_1");
    }

    #[test]
    fn test_surface_id_serde_transparent() {
        let id = SurfaceId::new("w-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"w-1\"");

        let parsed: SurfaceId = serde_json::from_str("\"NATIVE_APP\"").unwrap();
        assert_eq!(parsed, SurfaceId::new("NATIVE_APP"));
    }
}
