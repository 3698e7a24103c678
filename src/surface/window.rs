//! Handle navigation and window geometry.

use tracing::debug;

use crate::driver::WindowRect;
use crate::error::Result;

use super::Handle;

// ============================================================================
// Handle - Navigation
// ============================================================================

impl Handle {
    /// Navigates to a URL.
    ///
    /// # Errors
    ///
    /// - [`Error::UseOfDestroyedHandle`](crate::Error::UseOfDestroyedHandle) if destroyed
    /// - [`Error::SurfaceGone`](crate::Error::SurfaceGone) if the surface vanished
    pub async fn navigate(&self, url: &str) -> Result<()> {
        debug!(url = %url, surface = %self.surface(), "Navigating");
        let guard = self.focused().await?;
        let navigated = guard.backend().navigate(url).await;
        self.settle(navigated)
    }

    /// Navigates back in history.
    pub async fn back(&self) -> Result<()> {
        debug!(surface = %self.surface(), "Navigating back");
        let guard = self.focused().await?;
        let moved = guard.backend().back().await;
        self.settle(moved)
    }

    /// Navigates forward in history.
    pub async fn forward(&self) -> Result<()> {
        debug!(surface = %self.surface(), "Navigating forward");
        let guard = self.focused().await?;
        let moved = guard.backend().forward().await;
        self.settle(moved)
    }

    /// Reloads the current page.
    pub async fn refresh(&self) -> Result<()> {
        debug!(surface = %self.surface(), "Reloading page");
        let guard = self.focused().await?;
        let reloaded = guard.backend().refresh().await;
        self.settle(reloaded)
    }

    /// Gets the current page title.
    pub async fn title(&self) -> Result<String> {
        let guard = self.focused().await?;
        let title = guard.backend().title().await;
        self.settle(title)
    }

    /// Gets the current URL.
    pub async fn current_url(&self) -> Result<String> {
        let guard = self.focused().await?;
        let url = guard.backend().current_url().await;
        self.settle(url)
    }
}

// ============================================================================
// Handle - Geometry
// ============================================================================

impl Handle {
    /// Gets the window rectangle.
    pub async fn rect(&self) -> Result<WindowRect> {
        let guard = self.focused().await?;
        let rect = guard.backend().window_rect().await;
        self.settle(rect)
    }

    /// Sets the window rectangle; returns the rectangle actually applied.
    pub async fn set_rect(&self, rect: WindowRect) -> Result<WindowRect> {
        debug!(surface = %self.surface(), ?rect, "Setting window rect");
        let guard = self.focused().await?;
        let applied = guard.backend().set_window_rect(rect).await;
        self.settle(applied)
    }

    /// Resizes the window, keeping its position.
    pub async fn set_size(&self, width: u32, height: u32) -> Result<WindowRect> {
        let guard = self.focused().await?;
        let resized = async {
            let current = guard.backend().window_rect().await?;
            let rect = WindowRect::new(current.x, current.y, width, height);
            guard.backend().set_window_rect(rect).await
        };
        self.settle(resized.await)
    }

    /// Moves the window, keeping its size.
    pub async fn set_position(&self, x: i32, y: i32) -> Result<WindowRect> {
        let guard = self.focused().await?;
        let moved = async {
            let current = guard.backend().window_rect().await?;
            let rect = WindowRect::new(x, y, current.width, current.height);
            guard.backend().set_window_rect(rect).await
        };
        self.settle(moved.await)
    }

    /// Maximizes the window.
    pub async fn maximize(&self) -> Result<WindowRect> {
        let guard = self.focused().await?;
        let rect = guard.backend().maximize().await;
        self.settle(rect)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Weak;

    use crate::driver::{Capabilities, DriverKind, DriverSession, MemoryConnector, MemoryDriver, WindowRect};
    use crate::identifiers::SurfaceId;
    use crate::surface::{Handle, HandleKind};

    async fn window(driver: &MemoryDriver, surface: &str) -> Handle {
        let session = DriverSession::open(
            &MemoryConnector::new(driver.clone()),
            DriverKind::Chrome,
            Capabilities::new(),
            None,
        )
        .await
        .expect("session");
        Handle::new(session, SurfaceId::new(surface), HandleKind::Window, Weak::new())
    }

    #[tokio::test]
    async fn test_navigate_back_forward() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "Start", "https://start/");
        driver.route("https://next/", "Next");
        let handle = window(&driver, "w-1").await;

        handle.navigate("https://next/").await.unwrap();
        assert_eq!(handle.title().await.unwrap(), "Next");

        handle.back().await.unwrap();
        assert_eq!(handle.current_url().await.unwrap(), "https://start/");
        handle.forward().await.unwrap();
        assert_eq!(handle.current_url().await.unwrap(), "https://next/");
        handle.refresh().await.unwrap();
    }

    #[tokio::test]
    async fn test_geometry() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "Start", "https://start/");
        let handle = window(&driver, "w-1").await;

        let rect = handle.set_size(800, 600).await.unwrap();
        assert_eq!((rect.width, rect.height), (800, 600));

        let rect = handle.set_position(10, 20).await.unwrap();
        assert_eq!(rect, WindowRect::new(10, 20, 800, 600));
        assert_eq!(handle.rect().await.unwrap(), rect);

        let maximized = handle.maximize().await.unwrap();
        assert_eq!(driver.surface_rect("w-1"), Some(maximized));
    }
}
