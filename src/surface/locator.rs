//! Element locator strategies.
//!
//! A [`Locator`] is plain data: it names how to find the root element of a
//! part, or an element inside it, within a handle's scope. Resolution is the
//! remote endpoint's job.
//!
//! # Example
//!
//! ```ignore
//! use surface_keeper::Locator;
//!
//! let form = Locator::id("login-form");
//! let submit = Locator::css("button[type=submit]");
//! let native = Locator::accessibility_id("auth_login");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Locator Enum
// ============================================================================

/// Element locator strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "using", content = "value")]
pub enum Locator {
    /// CSS selector.
    #[serde(rename = "css selector")]
    Css(String),

    /// XPath expression.
    #[serde(rename = "xpath")]
    XPath(String),

    /// Element ID attribute (or resource id on native screens).
    #[serde(rename = "id")]
    Id(String),

    /// Name attribute.
    #[serde(rename = "name")]
    Name(String),

    /// Tag name.
    #[serde(rename = "tag name")]
    Tag(String),

    /// Single class name.
    #[serde(rename = "class name")]
    Class(String),

    /// Exact link text.
    #[serde(rename = "link text")]
    LinkText(String),

    /// Partial link text.
    #[serde(rename = "partial link text")]
    PartialLinkText(String),

    /// Accessibility identifier (native mobile screens).
    #[serde(rename = "accessibility id")]
    AccessibilityId(String),
}

impl Locator {
    /// Creates a CSS selector.
    #[inline]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Creates an XPath selector.
    #[inline]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Creates an ID selector.
    #[inline]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Creates a name attribute selector.
    #[inline]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Creates a tag name selector.
    #[inline]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    /// Creates a class name selector.
    #[inline]
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    /// Creates a link text selector.
    #[inline]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// Creates a partial link text selector.
    #[inline]
    pub fn partial_link_text(text: impl Into<String>) -> Self {
        Self::PartialLinkText(text.into())
    }

    /// Creates an accessibility id selector.
    #[inline]
    pub fn accessibility_id(id: impl Into<String>) -> Self {
        Self::AccessibilityId(id.into())
    }

    /// Returns the W3C strategy name.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css selector",
            Self::XPath(_) => "xpath",
            Self::Id(_) => "id",
            Self::Name(_) => "name",
            Self::Tag(_) => "tag name",
            Self::Class(_) => "class name",
            Self::LinkText(_) => "link text",
            Self::PartialLinkText(_) => "partial link text",
            Self::AccessibilityId(_) => "accessibility id",
        }
    }

    /// Returns the selector value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(v)
            | Self::XPath(v)
            | Self::Id(v)
            | Self::Name(v)
            | Self::Tag(v)
            | Self::Class(v)
            | Self::LinkText(v)
            | Self::PartialLinkText(v)
            | Self::AccessibilityId(v) => v,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

// ============================================================================
// From implementations for ergonomics
// ============================================================================

impl From<&str> for Locator {
    /// Converts a string to CSS selector (default).
    fn from(s: &str) -> Self {
        Self::Css(s.to_string())
    }
}

impl From<String> for Locator {
    /// Converts a string to CSS selector (default).
    fn from(s: String) -> Self {
        Self::Css(s)
    }
}

// ============================================================================
// Tests
// ============================================================================
