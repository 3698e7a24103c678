//! Handle core.
//!
//! A [`Handle`] is the identity of one tracked surface. Every surface-scoped
//! operation follows the same sequence:
//!
//! 1. reject the call if the handle is destroyed
//! 2. take the session focus lock and switch focus to the surface
//! 3. act through the focused backend
//! 4. if the endpoint reports the surface missing, destroy the handle and
//!    report [`Error::SurfaceGone`]
//!
//! Window navigation and geometry live in `window.rs`; this file holds the
//! focus machinery plus the element operations used by parts.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use crate::driver::{DriverSession, FocusGuard, SurfaceProperties};
use crate::error::{Error, Result};
use crate::identifiers::{ElementId, HandleId, SurfaceId};
use crate::registry::manager::RegistryInner;

use super::{ContentStrategy, FramePath, Locator};

// ============================================================================
// HandleKind
// ============================================================================

/// What kind of surface a handle tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Browser window or tab.
    Window,
    /// Mobile context (native screen or web-view).
    Screen,
}

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a handle.
pub(crate) struct HandleInner {
    /// Identity of this handle object.
    id: HandleId,
    /// Surface the handle is bound to.
    surface: SurfaceId,
    /// Window or screen.
    kind: HandleKind,
    /// Shared session; outlives every handle.
    session: DriverSession,
    /// Owning registry, for lookup only.
    registry: Weak<RegistryInner>,
    /// Terminal once set.
    destroyed: AtomicBool,
}

// ============================================================================
// Handle
// ============================================================================

/// One tracked surface.
///
/// Cheap to clone; clones share identity and the destroyed flag. A handle
/// may additionally carry a [`ContentStrategy`] that selects one page of a
/// multi-page mobile web-view after every focus switch.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<HandleInner>,
    content: Option<Arc<ContentStrategy>>,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.inner.id)
            .field("surface", &self.inner.surface)
            .field("kind", &self.inner.kind)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Handle - Constructors
// ============================================================================

impl Handle {
    pub(crate) fn new(
        session: DriverSession,
        surface: SurfaceId,
        kind: HandleKind,
        registry: Weak<RegistryInner>,
    ) -> Self {
        let id = HandleId::new();
        debug!(handle_id = %id, surface = %surface, ?kind, "Handle created");
        Self {
            inner: Arc::new(HandleInner {
                id,
                surface,
                kind,
                session,
                registry,
                destroyed: AtomicBool::new(false),
            }),
            content: None,
        }
    }

    /// Returns a view of this handle that addresses one page of the
    /// surface's content.
    ///
    /// The view shares identity and lifecycle with `self`.
    #[must_use]
    pub fn with_content(&self, strategy: ContentStrategy) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            content: Some(Arc::new(strategy)),
        }
    }
}

// ============================================================================
// Handle - Accessors
// ============================================================================

impl Handle {
    /// Returns the handle ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    /// Returns the surface identifier.
    #[inline]
    #[must_use]
    pub fn surface(&self) -> &SurfaceId {
        &self.inner.surface
    }

    /// Returns the handle kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> HandleKind {
        self.inner.kind
    }

    /// Returns the session the handle belongs to.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &DriverSession {
        &self.inner.session
    }

    /// Returns the content strategy of this view, if any.
    #[inline]
    #[must_use]
    pub fn content_strategy(&self) -> Option<&ContentStrategy> {
        self.content.as_deref()
    }

    /// Returns `true` once the handle is destroyed.
    #[inline]
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// Returns `true` if both values are the same handle object.
    #[inline]
    #[must_use]
    pub fn same_handle(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ============================================================================
// Handle - Lifecycle
// ============================================================================

impl Handle {
    /// Marks the handle destroyed. Returns `true` for the first call only.
    pub(crate) fn mark_destroyed(&self) -> bool {
        let first = !self.inner.destroyed.swap(true, Ordering::SeqCst);
        if first {
            debug!(handle_id = %self.id(), surface = %self.surface(), "Handle destroyed");
        }
        first
    }

    /// Marks destroyed and removes the handle from its registry.
    pub(crate) fn retire(&self) {
        if self.mark_destroyed()
            && let Some(registry) = self.inner.registry.upgrade()
        {
            registry.forget(self);
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::use_of_destroyed_handle(
                self.id(),
                self.surface().clone(),
            ));
        }
        Ok(())
    }

    /// Translates "surface missing" into `SurfaceGone` and retires the handle.
    pub(crate) fn settle<R>(&self, result: Result<R>) -> Result<R> {
        match result {
            Err(Error::NoSuchSurface { .. }) => {
                warn!(handle_id = %self.id(), surface = %self.surface(), "Surface vanished");
                self.retire();
                Err(Error::surface_gone(self.surface().clone()))
            }
            other => other,
        }
    }

    /// Takes the focus lock and focuses this surface.
    ///
    /// The destroyed flag is checked again once the lock is held, so a
    /// handle closed by a concurrent caller never regains focus.
    pub(crate) async fn focused(&self) -> Result<FocusGuard<'_>> {
        self.ensure_alive()?;
        let mut guard = self.inner.session.acquire().await?;
        self.ensure_alive()?;

        let switched = guard.switch_to(self.surface()).await;
        self.settle(switched)?;

        if let Some(strategy) = &self.content {
            let selected = Self::select_content(&guard, self.surface(), strategy).await;
            self.settle(selected)?;
        }

        Ok(guard)
    }

    async fn select_content(
        guard: &FocusGuard<'_>,
        surface: &SurfaceId,
        strategy: &ContentStrategy,
    ) -> Result<()> {
        let pages = guard.backend().pages().await?;
        let page = strategy.select(surface, &pages)?;
        guard.backend().switch_to_page(&page.id).await
    }

    /// Descends `frames` from the top-level document.
    async fn enter(guard: &FocusGuard<'_>, frames: &FramePath) -> Result<()> {
        if frames.is_empty() {
            return Ok(());
        }
        let backend = guard.backend();
        backend.switch_to_default_content().await?;
        for step in frames.steps() {
            backend.switch_to_frame(step).await?;
        }
        Ok(())
    }

    /// Closes the surface.
    ///
    /// Exactly one remote close is issued even under concurrent calls; the
    /// losing caller receives [`Error::UseOfDestroyedHandle`].
    ///
    /// # Errors
    ///
    /// - [`Error::UseOfDestroyedHandle`] if already destroyed
    /// - [`Error::SurfaceGone`] if the surface vanished on its own
    pub async fn close(&self) -> Result<()> {
        let guard = self.focused().await?;
        let closed = guard.backend().close_surface().await;
        self.settle(closed)?;
        self.retire();
        drop(guard);

        info!(handle_id = %self.id(), surface = %self.surface(), "Surface closed");
        Ok(())
    }
}

// ============================================================================
// Handle - Properties
// ============================================================================

impl Handle {
    /// Reads title, URL and activity in one focused section.
    ///
    /// # Errors
    ///
    /// See [`close`](Self::close) for the lifecycle errors.
    pub async fn properties(&self) -> Result<SurfaceProperties> {
        let guard = self.focused().await?;
        let backend = guard.backend();
        let read = async {
            Ok(SurfaceProperties {
                surface: self.surface().clone(),
                title: backend.title().await?,
                url: backend.current_url().await?,
                activity: match self.kind() {
                    HandleKind::Screen => backend.activity().await?,
                    HandleKind::Window => None,
                },
            })
        };
        self.settle(read.await)
    }

    /// Foreground activity of a mobile screen.
    pub async fn activity(&self) -> Result<Option<String>> {
        let guard = self.focused().await?;
        let activity = guard.backend().activity().await;
        self.settle(activity)
    }

    /// Returns `true` when the document finished loading.
    pub async fn is_ready(&self) -> Result<bool> {
        let guard = self.focused().await?;
        let ready = guard.backend().is_ready().await;
        self.settle(ready)
    }

    /// Checks that `frames` resolves inside this surface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameNotFound`] naming the failing step.
    pub async fn verify_frames(&self, frames: &FramePath) -> Result<()> {
        let guard = self.focused().await?;
        let entered = Self::enter(&guard, frames).await;
        self.settle(entered)
    }
}

// ============================================================================
// Handle - Elements
// ============================================================================

impl Handle {
    /// Finds every element matching `locator` inside `frames`.
    pub async fn find_elements(&self, frames: &FramePath, locator: &Locator) -> Result<Vec<ElementId>> {
        let guard = self.focused().await?;
        let found = async {
            Self::enter(&guard, frames).await?;
            guard.backend().find_elements(locator).await
        };
        self.settle(found.await)
    }

    /// Clicks the first element matching `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementNotFound`] if nothing matches.
    pub async fn click(&self, frames: &FramePath, locator: &Locator) -> Result<()> {
        let guard = self.focused().await?;
        let clicked = async {
            let element = Self::first(&guard, frames, locator).await?;
            guard.backend().click(&element).await
        };
        self.settle(clicked.await)
    }

    /// Types `text` into the first element matching `locator`.
    pub async fn type_text(&self, frames: &FramePath, locator: &Locator, text: &str) -> Result<()> {
        let guard = self.focused().await?;
        let typed = async {
            let element = Self::first(&guard, frames, locator).await?;
            guard.backend().send_keys(&element, text).await
        };
        self.settle(typed.await)
    }

    /// Visible text of the first element matching `locator`.
    pub async fn text(&self, frames: &FramePath, locator: &Locator) -> Result<String> {
        let guard = self.focused().await?;
        let text = async {
            let element = Self::first(&guard, frames, locator).await?;
            guard.backend().text(&element).await
        };
        self.settle(text.await)
    }

    async fn first(guard: &FocusGuard<'_>, frames: &FramePath, locator: &Locator) -> Result<ElementId> {
        Self::enter(guard, frames).await?;
        guard
            .backend()
            .find_elements(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::element_not_found(locator.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::driver::{Capabilities, DriverKind, MemoryConnector, MemoryDriver, PageInfo};

    async fn session(driver: &MemoryDriver) -> DriverSession {
        DriverSession::open(
            &MemoryConnector::new(driver.clone()),
            DriverKind::Firefox,
            Capabilities::new(),
            None,
        )
        .await
        .expect("session")
    }

    fn handle(session: &DriverSession, surface: &str) -> Handle {
        Handle::new(
            session.clone(),
            SurfaceId::new(surface),
            HandleKind::Window,
            Weak::new(),
        )
    }

    #[tokio::test]
    async fn test_operations_refocus_every_time() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        driver.open_surface("w-2", "Two", "https://two/");
        let session = session(&driver).await;
        let one = handle(&session, "w-1");
        let two = handle(&session, "w-2");

        assert_eq!(two.title().await.unwrap(), "Two");
        assert_eq!(one.title().await.unwrap(), "One");
        assert_eq!(two.title().await.unwrap(), "Two");
    }

    #[tokio::test]
    async fn test_vanished_surface_becomes_surface_gone() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        let session = session(&driver).await;
        let one = handle(&session, "w-1");

        driver.close_surface_remotely("w-1");
        assert!(matches!(one.title().await, Err(Error::SurfaceGone { .. })));
        assert!(one.is_destroyed());
        assert!(matches!(
            one.title().await,
            Err(Error::UseOfDestroyedHandle { .. })
        ));
    }

    #[tokio::test]
    async fn test_close_then_reject() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        let session = session(&driver).await;
        let one = handle(&session, "w-1");

        one.close().await.unwrap();
        assert_eq!(driver.close_count("w-1"), 1);
        assert!(matches!(one.close().await, Err(Error::UseOfDestroyedHandle { .. })));
        assert_eq!(driver.close_count("w-1"), 1);
    }

    #[tokio::test]
    async fn test_clones_share_lifecycle() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        let session = session(&driver).await;
        let one = handle(&session, "w-1");
        let copy = one.clone();

        one.close().await.unwrap();
        assert!(copy.is_destroyed());
        assert!(copy.same_handle(&one));
    }

    #[tokio::test]
    async fn test_element_ops_inside_frames() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        driver.add_frame("w-1", &FramePath::new(), "editor", None);
        let frames = FramePath::new().name("editor");
        let field = driver.add_element("w-1", &frames, Locator::id("body"), "");
        let session = session(&driver).await;
        let one = handle(&session, "w-1");

        one.type_text(&frames, &Locator::id("body"), "hello").await.unwrap();
        assert_eq!(driver.element_value(&field).as_deref(), Some("hello"));

        let err = one
            .click(&FramePath::new(), &Locator::id("body"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ElementNotFound { .. }));
    }

    #[tokio::test]
    async fn test_verify_frames_reports_missing_frame() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        let session = session(&driver).await;
        let one = handle(&session, "w-1");

        let err = one
            .verify_frames(&FramePath::new().index(2))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FrameNotFound { .. }));
        assert!(!one.is_destroyed());
    }

    #[tokio::test]
    async fn test_content_strategy_selects_page() {
        let driver = MemoryDriver::new();
        driver.open_surface("WEBVIEW_1", "", "");
        driver.set_pages(
            "WEBVIEW_1",
            vec![
                PageInfo::new("p-1", "https://shop/cart"),
                PageInfo::new("p-2", "https://shop/checkout"),
            ],
        );
        let session = session(&driver).await;
        let view = handle(&session, "WEBVIEW_1")
            .with_content(ContentStrategy::new().with_url("checkout").unwrap());

        view.is_ready().await.unwrap();
        assert_eq!(driver.current_page("WEBVIEW_1").as_deref(), Some("p-2"));

        let missing = handle(&session, "WEBVIEW_1")
            .with_content(ContentStrategy::new().with_index(5));
        assert!(matches!(missing.is_ready().await, Err(Error::PageNotFound { .. })));
    }

    #[tokio::test]
    async fn test_session_closed_after_destroy() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        let session = session(&driver).await;
        let one = handle(&session, "w-1");

        session.destroy().await;
        assert!(matches!(one.title().await, Err(Error::SessionClosed)));
    }

    #[test]
    fn test_handle_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<Handle>();
    }

    #[test]
    fn test_handle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Handle>();
    }
}
