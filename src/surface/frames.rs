//! Frame paths.
//!
//! A [`FramePath`] describes the nested-frame navigation needed to reach a
//! part's scope inside a handle. Paths are resolved from the top-level
//! document every time a scoped operation runs, so there is no frame state
//! to pop afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Locator;

// ============================================================================
// FrameStep
// ============================================================================

/// One level of frame navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameStep {
    /// Child frame by zero-based index.
    Index(usize),
    /// Child frame by `name` or `id` attribute.
    Name(String),
    /// Child frame by locating its `<iframe>` element.
    Element(Locator),
}

impl fmt::Display for FrameStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "index {i}"),
            Self::Name(n) => write!(f, "name '{n}'"),
            Self::Element(l) => write!(f, "element {l}"),
        }
    }
}

// ============================================================================
// FramePath
// ============================================================================

/// Ordered frame steps from the top-level document.
///
/// # Example
///
/// ```ignore
/// use surface_keeper::FramePath;
///
/// let path = FramePath::new().index(0).name("editor");
/// assert_eq!(path.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FramePath(Vec<FrameStep>);

impl FramePath {
    /// Creates an empty path (the top-level document).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a frame-by-index step.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(FrameStep::Index(index));
        self
    }

    /// Appends a frame-by-name step.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.push(FrameStep::Name(name.into()));
        self
    }

    /// Appends a frame-by-element step.
    #[must_use]
    pub fn element(mut self, locator: impl Into<Locator>) -> Self {
        self.0.push(FrameStep::Element(locator.into()));
        self
    }

    /// Returns a new path with `other` nested below this one.
    #[must_use]
    pub fn join(&self, other: &FramePath) -> FramePath {
        let mut steps = Vec::with_capacity(self.0.len() + other.0.len());
        steps.extend(self.0.iter().cloned());
        steps.extend(other.0.iter().cloned());
        FramePath(steps)
    }

    /// Returns the steps in navigation order.
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[FrameStep] {
        &self.0
    }

    /// Number of steps.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the top-level document.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FramePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("top");
        }
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl From<Vec<FrameStep>> for FramePath {
    fn from(steps: Vec<FrameStep>) -> Self {
        Self(steps)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_top() {
        let path = FramePath::new();
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "top");
    }

    #[test]
    fn test_builder_chain() {
        let path = FramePath::new().index(1).name("editor").element("#inner");
        assert_eq!(path.len(), 3);
        assert_eq!(path.steps()[0], FrameStep::Index(1));
        assert_eq!(
            path.to_string(),
            "index 1 > name 'editor' > element css selector=#inner"
        );
    }

    #[test]
    fn test_join_nests_below_parent() {
        let parent = FramePath::new().name("outer");
        let child = FramePath::new().index(0);
        let joined = parent.join(&child);
        assert_eq!(
            joined.steps(),
            &[FrameStep::Name("outer".into()), FrameStep::Index(0)]
        );
        assert_eq!(parent.len(), 1);
    }
}
