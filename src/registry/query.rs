//! Surface matchers.
//!
//! A [`SurfaceMatcher`] decides whether a surface at a given listing
//! position is the one a caller waits for. [`HandleQuery`] covers the usual
//! criteria; any `Fn(usize, &SurfaceProperties) -> bool` closure works too.
//!
//! # Example
//!
//! ```ignore
//! use surface_keeper::registry::HandleQuery;
//!
//! let checkout = HandleQuery::new()
//!     .with_title("^Checkout")?
//!     .with_url("/cart/\\d+$")?;
//!
//! let handle = registry.get_handle_matching(&checkout, Duration::from_secs(5)).await?;
//! ```

use std::fmt;

use regex::Regex;

use crate::driver::SurfaceProperties;
use crate::error::Result;
use crate::surface::ContentStrategy;

// ============================================================================
// SurfaceMatcher
// ============================================================================

/// Predicate over a surface and its listing position.
pub trait SurfaceMatcher: Send + Sync {
    /// Returns `true` if the surface qualifies.
    fn matches(&self, position: usize, properties: &SurfaceProperties) -> bool;

    /// Returns `false` when [`matches`](Self::matches) only looks at the
    /// position and the surface identifier, so reading title and URL can be
    /// skipped.
    fn needs_properties(&self) -> bool {
        true
    }

    /// Human-readable description for timeout errors.
    fn describe(&self) -> String {
        "custom matcher".to_string()
    }
}

impl<F> SurfaceMatcher for F
where
    F: Fn(usize, &SurfaceProperties) -> bool + Send + Sync,
{
    fn matches(&self, position: usize, properties: &SurfaceProperties) -> bool {
        self(position, properties)
    }
}

// ============================================================================
// HandleQuery
// ============================================================================

/// Declarative surface matcher.
///
/// All configured criteria must hold. Several URL or activity patterns
/// match when any one of them matches.
#[derive(Debug, Clone, Default)]
pub struct HandleQuery {
    index: Option<usize>,
    title: Option<Regex>,
    urls: Vec<Regex>,
    context: Option<Regex>,
    activities: Vec<Regex>,
    content: Option<ContentStrategy>,
}

impl HandleQuery {
    /// Creates a query matching any surface.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for the surface at listing position `index`.
    #[inline]
    #[must_use]
    pub fn index(index: usize) -> Self {
        Self::new().with_index(index)
    }

    /// Requires listing position `index`.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Requires a title matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Regex`](crate::Error::Regex) if the pattern is invalid.
    pub fn with_title(mut self, pattern: &str) -> Result<Self> {
        self.title = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Adds an accepted URL pattern.
    pub fn with_url(mut self, pattern: &str) -> Result<Self> {
        self.urls.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Requires a surface identifier (mobile context name) matching `pattern`.
    pub fn with_context(mut self, pattern: &str) -> Result<Self> {
        self.context = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Adds an accepted foreground activity pattern.
    ///
    /// Surfaces that report no activity (iOS, browsers) never match an
    /// activity criterion.
    pub fn with_activity(mut self, pattern: &str) -> Result<Self> {
        self.activities.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Attaches a content strategy to the handle the query resolves to.
    #[must_use]
    pub fn with_content(mut self, strategy: ContentStrategy) -> Self {
        self.content = Some(strategy);
        self
    }

    /// Content strategy to attach, if any.
    #[inline]
    #[must_use]
    pub fn content(&self) -> Option<&ContentStrategy> {
        self.content.as_ref()
    }
}

impl SurfaceMatcher for HandleQuery {
    fn matches(&self, position: usize, properties: &SurfaceProperties) -> bool {
        if self.index.is_some_and(|index| index != position) {
            return false;
        }
        if let Some(context) = &self.context
            && !context.is_match(properties.surface.as_str())
        {
            return false;
        }
        if let Some(title) = &self.title
            && !title.is_match(&properties.title)
        {
            return false;
        }
        if !self.urls.is_empty() && !self.urls.iter().any(|re| re.is_match(&properties.url)) {
            return false;
        }
        if !self.activities.is_empty() {
            let Some(activity) = properties.activity.as_deref() else {
                return false;
            };
            if !self.activities.iter().any(|re| re.is_match(activity)) {
                return false;
            }
        }
        true
    }

    fn needs_properties(&self) -> bool {
        self.title.is_some() || !self.urls.is_empty() || !self.activities.is_empty()
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HandleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(index) = self.index {
            parts.push(format!("index {index}"));
        }
        if let Some(context) = &self.context {
            parts.push(format!("context ~ {context}"));
        }
        if let Some(title) = &self.title {
            parts.push(format!("title ~ {title}"));
        }
        if !self.urls.is_empty() {
            let urls: Vec<_> = self.urls.iter().map(Regex::as_str).collect();
            parts.push(format!("url ~ {}", urls.join(" | ")));
        }
        if !self.activities.is_empty() {
            let acts: Vec<_> = self.activities.iter().map(Regex::as_str).collect();
            parts.push(format!("activity ~ {}", acts.join(" | ")));
        }
        if parts.is_empty() {
            f.write_str("any surface")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
