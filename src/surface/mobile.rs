//! Content resolution inside mobile surfaces.
//!
//! A web-view context of a mobile app may host several logical pages. A
//! [`ContentStrategy`] attached to a [`Handle`](super::Handle) selects which
//! of them receives commands after the context switch.

use std::fmt;

use regex::Regex;

use crate::driver::PageInfo;
use crate::error::{Error, Result};
use crate::identifiers::SurfaceId;

// ============================================================================
// ContentStrategy
// ============================================================================

/// How to pick one page among those hosted by a surface.
///
/// When both an index and a URL pattern are set, the page at the index must
/// also match the pattern.
#[derive(Debug, Clone, Default)]
pub struct ContentStrategy {
    index: Option<usize>,
    url: Option<Regex>,
}

impl ContentStrategy {
    /// Creates a strategy that matches the first page.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the page at `index`.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Selects the first page whose URL matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Regex`] if the pattern is invalid.
    pub fn with_url(mut self, pattern: &str) -> Result<Self> {
        self.url = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Picks a page from the listing reported by the surface.
    pub(crate) fn select<'a>(&self, surface: &SurfaceId, pages: &'a [PageInfo]) -> Result<&'a PageInfo> {
        let url_ok = |page: &PageInfo| self.url.as_ref().is_none_or(|re| re.is_match(&page.url));

        let found = match self.index {
            Some(index) => pages.get(index).filter(|p| url_ok(p)),
            None => pages.iter().find(|p| url_ok(p)),
        };

        found.ok_or_else(|| Error::page_not_found(surface.clone(), self.to_string()))
    }
}

impl fmt::Display for ContentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.index, &self.url) {
            (None, None) => f.write_str("first page"),
            (Some(i), None) => write!(f, "page #{i}"),
            (None, Some(re)) => write!(f, "page url ~ {re}"),
            (Some(i), Some(re)) => write!(f, "page #{i} with url ~ {re}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
