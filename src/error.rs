//! Error types for surface-keeper.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use surface_keeper::{Error, Result};
//!
//! async fn example(handle: &Handle) -> Result<()> {
//!     handle.navigate("https://example.com").await?;
//!     let title = handle.title().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Launch | [`Error::Config`], [`Error::LaunchFailure`] |
//! | Lifecycle | [`Error::UseOfDestroyedHandle`], [`Error::SurfaceGone`], [`Error::SessionClosed`] |
//! | Lookup | [`Error::NoSuchSurface`], [`Error::IndexOutOfRange`], [`Error::FrameNotFound`], [`Error::PageNotFound`] |
//! | Timing | [`Error::Timeout`] |
//! | Decomposition | [`Error::AmbiguousOrMissingConstructor`], [`Error::PartResolution`] |
//! | Element | [`Error::ElementNotFound`], [`Error::StaleElement`], [`Error::ElementChanging`] |
//! | Remote | [`Error::NoSuchSession`], [`Error::ConnectionClosed`], [`Error::Remote`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Url`], [`Error::Regex`] |
//!
//! Lower layers never retry. Retrying is the job of an
//! [`Interceptor`](crate::model::Interceptor), which uses
//! [`Error::is_recoverable`] to decide.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::{HandleId, SurfaceId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Launch Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session or launcher configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Launching an application failed.
    ///
    /// The partially built session has already been destroyed.
    #[error("Launch failed: {source}")]
    LaunchFailure {
        /// The step failure that aborted the launch.
        #[source]
        source: Box<Error>,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Operation on a handle that was already destroyed.
    #[error("Handle {handle_id} for surface {surface} is destroyed")]
    UseOfDestroyedHandle {
        /// The destroyed handle.
        handle_id: HandleId,
        /// Surface the handle was bound to.
        surface: SurfaceId,
    },

    /// The surface disappeared while an operation was running on it.
    ///
    /// The handle has been destroyed as a consequence.
    #[error("Surface {surface} is gone")]
    SurfaceGone {
        /// The vanished surface.
        surface: SurfaceId,
    },

    /// The driver session was destroyed.
    #[error("Driver session closed")]
    SessionClosed,

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// The remote endpoint knows no surface with this identifier.
    #[error("No such surface: {surface}")]
    NoSuchSurface {
        /// The unknown surface.
        surface: SurfaceId,
    },

    /// Requested handle position is outside the current listing.
    #[error("Handle index {index} out of range (surfaces: {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of surfaces in the listing.
        len: usize,
    },

    /// Frame path could not be resolved.
    #[error("Frame not found: {frame}")]
    FrameNotFound {
        /// Description of the failing frame step.
        frame: String,
    },

    /// Content strategy matched no page inside a mobile surface.
    #[error("Page not found in {surface}: {strategy}")]
    PageNotFound {
        /// Surface that was searched.
        surface: SurfaceId,
        /// Description of the strategy.
        strategy: String,
    },

    // ========================================================================
    // Timing Errors
    // ========================================================================
    /// Operation timeout.
    ///
    /// Returned when a wait exceeds its timeout duration.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Decomposition Errors
    // ========================================================================
    /// Zero or several constructors match the requested shape.
    ///
    /// Programmer error; never retried.
    #[error("Part {part} has {candidates} constructors for shape {shape}")]
    AmbiguousOrMissingConstructor {
        /// Part type name.
        part: &'static str,
        /// Requested constructor shape.
        shape: String,
        /// Number of matching constructors.
        candidates: usize,
    },

    /// A part could not be resolved or accessed.
    #[error("Part resolution failed for {part}: {message}")]
    PartResolution {
        /// Part type name.
        part: &'static str,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Element Errors
    // ========================================================================
    /// Element not found by locator.
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator used.
        locator: String,
    },

    /// Element reference is no longer attached.
    #[error("Stale element: {element}")]
    StaleElement {
        /// The stale element reference.
        element: String,
    },

    /// Element is being re-rendered or reloaded.
    #[error("Element is changing: {element}")]
    ElementChanging {
        /// The changing element reference.
        element: String,
    },

    // ========================================================================
    // Remote Errors
    // ========================================================================
    /// The remote endpoint has no such session (already quit).
    #[error("No such session")]
    NoSuchSession,

    /// Connection to the remote endpoint closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Any other failure reported by the remote endpoint.
    #[error("Remote error: {message}")]
    Remote {
        /// Message reported by the endpoint.
        message: String,
    },

    /// An interceptor broke the call contract.
    #[error("Interceptor error in {method}: {message}")]
    Intercept {
        /// Intercepted method name.
        method: &'static str,
        /// Description of the violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Regular expression error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wraps a step failure into a launch failure.
    ///
    /// Already wrapped failures are not wrapped twice.
    #[inline]
    pub fn launch_failure(source: Error) -> Self {
        match source {
            Self::LaunchFailure { .. } => source,
            other => Self::LaunchFailure {
                source: Box::new(other),
            },
        }
    }

    /// Creates a destroyed handle error.
    #[inline]
    pub fn use_of_destroyed_handle(handle_id: HandleId, surface: SurfaceId) -> Self {
        Self::UseOfDestroyedHandle { handle_id, surface }
    }

    /// Creates a surface gone error.
    #[inline]
    pub fn surface_gone(surface: SurfaceId) -> Self {
        Self::SurfaceGone { surface }
    }

    /// Creates a no such surface error.
    #[inline]
    pub fn no_such_surface(surface: SurfaceId) -> Self {
        Self::NoSuchSurface { surface }
    }

    /// Creates an index out of range error.
    #[inline]
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Creates a frame not found error.
    #[inline]
    pub fn frame_not_found(frame: impl Into<String>) -> Self {
        Self::FrameNotFound {
            frame: frame.into(),
        }
    }

    /// Creates a page not found error.
    #[inline]
    pub fn page_not_found(surface: SurfaceId, strategy: impl Into<String>) -> Self {
        Self::PageNotFound {
            surface,
            strategy: strategy.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a constructor selection error.
    #[inline]
    pub fn ambiguous_or_missing_constructor(
        part: &'static str,
        shape: impl Into<String>,
        candidates: usize,
    ) -> Self {
        Self::AmbiguousOrMissingConstructor {
            part,
            shape: shape.into(),
            candidates,
        }
    }

    /// Creates a part resolution error.
    #[inline]
    pub fn part_resolution(part: &'static str, message: impl Into<String>) -> Self {
        Self::PartResolution {
            part,
            message: message.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(locator: impl Into<String>) -> Self {
        Self::ElementNotFound {
            locator: locator.into(),
        }
    }

    /// Creates a stale element error.
    #[inline]
    pub fn stale_element(element: impl Into<String>) -> Self {
        Self::StaleElement {
            element: element.into(),
        }
    }

    /// Creates an element changing error.
    #[inline]
    pub fn element_changing(element: impl Into<String>) -> Self {
        Self::ElementChanging {
            element: element.into(),
        }
    }

    /// Creates a remote error.
    #[inline]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Creates an interceptor contract error.
    #[inline]
    pub fn intercept(method: &'static str, message: impl Into<String>) -> Self {
        Self::Intercept {
            method,
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is an element error.
    #[inline]
    #[must_use]
    pub fn is_element_error(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::StaleElement { .. } | Self::ElementChanging { .. }
        )
    }

    /// Returns `true` if the remote end is already gone.
    ///
    /// These are absorbed when a session is destroyed.
    #[inline]
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(
            self,
            Self::NoSuchSession | Self::ConnectionClosed | Self::SessionClosed
        )
    }

    /// Returns `true` if the error means the surface no longer exists.
    #[inline]
    #[must_use]
    pub fn is_surface_missing(&self) -> bool {
        matches!(self, Self::NoSuchSurface { .. } | Self::SurfaceGone { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed when the call is reissued.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::StaleElement { .. } | Self::ElementChanging { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
