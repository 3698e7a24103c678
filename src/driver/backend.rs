//! Boundary to the remote automation endpoint.
//!
//! The wire protocol lives behind [`DriverBackend`]; this crate only relies
//! on the single-focus command model every WebDriver-style endpoint shares:
//! one surface has focus, and every command implicitly targets it.
//!
//! Implement [`Connector`] to plug a concrete transport in. The in-process
//! [`MemoryDriver`](super::memory::MemoryDriver) implements both traits.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;
use crate::identifiers::{ElementId, SurfaceId};
use crate::surface::{FrameStep, Locator};

use super::capabilities::Capabilities;
use super::config::Timeouts;
use super::kind::DriverKind;

// ============================================================================
// Value Types
// ============================================================================

/// Properties of one surface, as seen when focused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceProperties {
    /// Surface identifier.
    pub surface: SurfaceId,
    /// Document title (empty for native screens).
    pub title: String,
    /// Current URL (empty for native screens).
    pub url: String,
    /// Foreground activity (Android native screens).
    pub activity: Option<String>,
}

/// Window geometry in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Outer width.
    pub width: u32,
    /// Outer height.
    pub height: u32,
}

impl WindowRect {
    /// Creates a rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One logical page hosted by a mobile web-view surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Endpoint-side page identifier.
    pub id: String,
    /// Page URL.
    pub url: String,
}

impl PageInfo {
    /// Creates a page description.
    #[must_use]
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Everything a [`Connector`] needs to open a session.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// Requested driver kind.
    pub kind: DriverKind,
    /// Merged desired capabilities.
    pub capabilities: Capabilities,
    /// Remote endpoint address, when the kind runs remotely.
    pub remote: Option<Url>,
}

// ============================================================================
// DriverBackend
// ============================================================================

/// One live connection to a remote automation endpoint.
///
/// Every method except [`surfaces`](Self::surfaces),
/// [`switch_to_surface`](Self::switch_to_surface) and [`quit`](Self::quit)
/// acts on the currently focused surface. Callers in this crate only invoke
/// them through a [`FocusGuard`](super::FocusGuard).
///
/// Implementations report a vanished surface as
/// [`Error::NoSuchSurface`](crate::Error::NoSuchSurface) and an already
/// terminated session as [`Error::NoSuchSession`](crate::Error::NoSuchSession).
#[async_trait]
pub trait DriverBackend: Send + Sync {
    /// Lists the identifiers of all open surfaces in endpoint order.
    async fn surfaces(&self) -> Result<Vec<SurfaceId>>;

    /// Moves focus to a surface.
    async fn switch_to_surface(&self, surface: &SurfaceId) -> Result<()>;

    /// Title of the focused document.
    async fn title(&self) -> Result<String>;

    /// URL of the focused document.
    async fn current_url(&self) -> Result<String>;

    /// Navigates the focused surface.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// History back.
    async fn back(&self) -> Result<()>;

    /// History forward.
    async fn forward(&self) -> Result<()>;

    /// Reloads the focused document.
    async fn refresh(&self) -> Result<()>;

    /// Window geometry of the focused surface.
    async fn window_rect(&self) -> Result<WindowRect>;

    /// Applies window geometry to the focused surface.
    async fn set_window_rect(&self, rect: WindowRect) -> Result<WindowRect>;

    /// Maximizes the focused window.
    async fn maximize(&self) -> Result<WindowRect>;

    /// Closes the focused surface.
    async fn close_surface(&self) -> Result<()>;

    /// Leaves all frames of the focused surface.
    async fn switch_to_default_content(&self) -> Result<()>;

    /// Enters a child frame of the current frame.
    async fn switch_to_frame(&self, step: &FrameStep) -> Result<()>;

    /// Finds elements in the current frame.
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementId>>;

    /// Clicks an element.
    async fn click(&self, element: &ElementId) -> Result<()>;

    /// Types into an element.
    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()>;

    /// Visible text of an element.
    async fn text(&self, element: &ElementId) -> Result<String>;

    /// Terminates the remote session.
    async fn quit(&self) -> Result<()>;

    /// Foreground activity, for native Android screens.
    async fn activity(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Pages hosted by the focused web-view.
    async fn pages(&self) -> Result<Vec<PageInfo>> {
        Ok(Vec::new())
    }

    /// Addresses one page of the focused web-view.
    async fn switch_to_page(&self, _page: &str) -> Result<()> {
        Ok(())
    }

    /// Whether the focused document finished loading.
    async fn is_ready(&self) -> Result<bool> {
        Ok(true)
    }

    /// Applies session timeouts.
    async fn set_timeouts(&self, _timeouts: &Timeouts) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Opens backend connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establishes one remote automation connection.
    async fn connect(&self, request: &ConnectRequest) -> Result<Box<dyn DriverBackend>>;
}
