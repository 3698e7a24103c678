//! Surfaces and the handles that track them.
//!
//! A surface is one browser window, mobile native screen or mobile web-view
//! context. The remote endpoint addresses commands only to the focused
//! surface, so every [`Handle`] operation refocuses its own surface first.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Handle`] | Identity of one tracked surface |
//! | [`FramePath`] | Nested-frame route to a part's scope |
//! | [`Locator`] | Element location strategy |
//! | [`ContentStrategy`] | Page selection inside a mobile web-view |

// ============================================================================
// Submodules
// ============================================================================

/// Frame paths.
pub mod frames;

/// Handle core: focus, lifecycle, element operations.
pub mod handle;

/// Element locators.
pub mod locator;

/// Mobile content strategies.
pub mod mobile;

/// Navigation and window geometry.
mod window;

// ============================================================================
// Re-exports
// ============================================================================

pub use frames::{FramePath, FrameStep};
pub use handle::{Handle, HandleKind};
pub use locator::Locator;
pub use mobile::ContentStrategy;
