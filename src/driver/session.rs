//! Driver session wrapper.
//!
//! A [`DriverSession`] owns exactly one backend connection. The remote
//! protocol is single-focus, so every surface-scoped command goes through a
//! [`FocusGuard`]: the guard holds the session-wide focus lock from the
//! moment focus is switched until the command finishes.
//!
//! # Example
//!
//! ```ignore
//! let session = DriverSession::open_with(&connector, config).await?;
//!
//! for surface in session.list_surface_ids().await? {
//!     let guard = session.focus(&surface).await?;
//!     println!("{surface}: {}", guard.backend().title().await?);
//! }
//!
//! session.destroy().await;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{SessionId, SurfaceId};

use super::backend::{ConnectRequest, Connector, DriverBackend};
use super::capabilities::Capabilities;
use super::config::Configuration;
use super::kind::DriverKind;

// ============================================================================
// Destroyable
// ============================================================================

/// A resource torn down together with its session.
///
/// Destroyables run in reverse registration order after the remote session
/// has been quit.
#[async_trait]
pub trait Destroyable: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Releases the resource. Must not fail.
    async fn destroy(&self);
}

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a session.
pub(crate) struct SessionInner {
    /// Local session identifier.
    id: SessionId,
    /// Snapshot of the configuration the session was opened with.
    config: Arc<Configuration>,
    /// Remote connection.
    backend: Box<dyn DriverBackend>,
    /// Held from focus switch until the focused command completes.
    focus: AsyncMutex<()>,
    /// Set once by `destroy`.
    closed: AtomicBool,
    /// Resources released on destroy.
    destroyables: Mutex<Vec<Arc<dyn Destroyable>>>,
}

// ============================================================================
// DriverSession
// ============================================================================

/// One remote automation connection.
///
/// Cheap to clone; all clones share the same connection.
#[derive(Clone)]
pub struct DriverSession {
    pub(crate) inner: Arc<SessionInner>,
}

impl fmt::Debug for DriverSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverSession")
            .field("id", &self.inner.id)
            .field("kind", &self.kind())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// DriverSession - Constructors
// ============================================================================

impl DriverSession {
    /// Opens a session with default settings for `kind`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `kind` needs a remote address and none is given
    /// - any error reported by the connector
    pub async fn open(
        connector: &dyn Connector,
        kind: DriverKind,
        capabilities: Capabilities,
        remote: Option<Url>,
    ) -> Result<Self> {
        let mut config = Configuration::new().with_kind(kind);
        config.capabilities = capabilities;
        config.driver.remote_address = remote;
        Self::open_with(connector, config).await
    }

    /// Opens a session described by a configuration snapshot.
    ///
    /// Applies the configured timeouts and, for browser kinds, navigates to
    /// the initial URL capability. If either step fails the new session is
    /// destroyed before the error is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the configuration is invalid
    /// - any error reported by the connector or the backend
    pub async fn open_with(connector: &dyn Connector, config: Configuration) -> Result<Self> {
        config.validate()?;

        let kind = config.kind();
        let remote = match &config.driver.remote_address {
            Some(url) if kind.starts_remotely() => Some(url.clone()),
            Some(url) => {
                info!(kind = %kind, remote = %url, "Remote address ignored for local driver");
                None
            }
            None => None,
        };

        let request = ConnectRequest {
            kind,
            capabilities: config.desired_capabilities(),
            remote,
        };

        let backend = connector.connect(&request).await?;
        let session = Self {
            inner: Arc::new(SessionInner {
                id: SessionId::next(),
                config: Arc::new(config),
                backend,
                focus: AsyncMutex::new(()),
                closed: AtomicBool::new(false),
                destroyables: Mutex::new(Vec::new()),
            }),
        };

        info!(session_id = %session.id(), kind = %kind, "Driver session opened");

        if let Err(e) = session.initialize(&request.capabilities).await {
            warn!(session_id = %session.id(), error = %e, "Session initialization failed");
            session.destroy().await;
            return Err(e);
        }

        Ok(session)
    }

    /// Pushes timeouts and opens the initial URL.
    async fn initialize(&self, capabilities: &Capabilities) -> Result<()> {
        let backend = &self.inner.backend;
        backend.set_timeouts(&self.inner.config.timeouts).await?;

        if self.kind().is_browser()
            && let Some(url) = capabilities.initial_url()
        {
            let _lock = self.inner.focus.lock().await;
            debug!(session_id = %self.id(), url, "Opening initial URL");
            backend.navigate(url).await?;
        }

        Ok(())
    }
}

// ============================================================================
// DriverSession - Accessors
// ============================================================================

impl DriverSession {
    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Returns the driver kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DriverKind {
        self.inner.config.kind()
    }

    /// Returns the configuration snapshot.
    #[inline]
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.inner.config
    }

    /// Returns `true` once [`destroy`](Self::destroy) has been called.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Returns `true` if both values share one connection.
    #[inline]
    #[must_use]
    pub fn same_session(&self, other: &DriverSession) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ============================================================================
// DriverSession - Surfaces
// ============================================================================

impl DriverSession {
    /// Lists surface identifiers in endpoint order.
    ///
    /// Listing does not need focus and does not wait for focused commands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] after destroy.
    pub async fn list_surface_ids(&self) -> Result<Vec<SurfaceId>> {
        self.ensure_open()?;
        self.inner.backend.surfaces().await
    }

    /// Switches focus to `surface` and returns the guard to act through.
    ///
    /// Every other focused command on this session waits until the guard
    /// is dropped.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] after destroy
    /// - [`Error::NoSuchSurface`] if the endpoint does not know `surface`
    pub async fn focus(&self, surface: &SurfaceId) -> Result<FocusGuard<'_>> {
        let mut guard = self.acquire().await?;
        guard.switch_to(surface).await?;
        Ok(guard)
    }

    /// Takes the focus lock without switching.
    pub(crate) async fn acquire(&self) -> Result<FocusGuard<'_>> {
        let lock = self.inner.focus.lock().await;
        self.ensure_open()?;
        Ok(FocusGuard {
            _lock: lock,
            backend: self.inner.backend.as_ref(),
            surface: None,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }
}

// ============================================================================
// DriverSession - Lifecycle
// ============================================================================

impl DriverSession {
    /// Adds a resource to release when the session is destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session is already destroyed;
    /// the caller keeps ownership of the teardown in that case.
    pub fn register_destroyable(&self, destroyable: Arc<dyn Destroyable>) -> Result<()> {
        let mut list = self.inner.destroyables.lock();
        self.ensure_open()?;
        debug!(session_id = %self.id(), name = destroyable.name(), "Destroyable registered");
        list.push(destroyable);
        Ok(())
    }

    /// Quits the remote session and releases every registered resource.
    ///
    /// Idempotent. Waits for the focused command in flight, if any; commands
    /// issued afterwards fail with [`Error::SessionClosed`]. A remote end
    /// that is already gone is expected and only logged.
    pub async fn destroy(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!(session_id = %self.id(), "Session already destroyed");
            return;
        }

        {
            let _lock = self.inner.focus.lock().await;
            match self.inner.backend.quit().await {
                Ok(()) => info!(session_id = %self.id(), "Remote session quit"),
                Err(e) if e.is_gone() => {
                    debug!(session_id = %self.id(), error = %e, "Remote session already gone");
                }
                Err(e) => warn!(session_id = %self.id(), error = %e, "Remote quit failed"),
            }
        }

        let destroyables: Vec<_> = std::mem::take(&mut *self.inner.destroyables.lock());
        for destroyable in destroyables.into_iter().rev() {
            debug!(session_id = %self.id(), name = destroyable.name(), "Destroying");
            destroyable.destroy().await;
        }

        info!(session_id = %self.id(), "Driver session destroyed");
    }
}

// ============================================================================
// FocusGuard
// ============================================================================

/// Exclusive access to the focused surface.
///
/// While the guard lives no other command of the session can move focus.
pub struct FocusGuard<'a> {
    _lock: AsyncMutexGuard<'a, ()>,
    backend: &'a dyn DriverBackend,
    surface: Option<SurfaceId>,
}

impl fmt::Debug for FocusGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusGuard")
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl FocusGuard<'_> {
    /// The backend, focused on [`surface`](Self::surface).
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &dyn DriverBackend {
        self.backend
    }

    /// The surface currently holding focus through this guard.
    #[inline]
    #[must_use]
    pub fn surface(&self) -> Option<&SurfaceId> {
        self.surface.as_ref()
    }

    /// Moves focus while keeping the lock.
    pub(crate) async fn switch_to(&mut self, surface: &SurfaceId) -> Result<()> {
        trace!(surface = %surface, "Switching focus");
        self.backend.switch_to_surface(surface).await?;
        self.surface = Some(surface.clone());
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    use serde_json::json;

    use crate::driver::capabilities::INITIAL_URL;
    use crate::driver::memory::{MemoryConnector, MemoryDriver};

    struct Counter {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
        hits: AtomicUsize,
    }

    #[async_trait]
    impl Destroyable for Counter {
        fn name(&self) -> &str {
            self.name
        }

        async fn destroy(&self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.order.lock().push(self.name);
        }
    }

    async fn open(driver: &MemoryDriver) -> DriverSession {
        DriverSession::open(
            &MemoryConnector::new(driver.clone()),
            DriverKind::Chrome,
            Capabilities::new(),
            None,
        )
        .await
        .expect("session")
    }

    #[tokio::test]
    async fn test_remote_kind_requires_address() {
        let driver = MemoryDriver::new();
        let err = DriverSession::open(
            &MemoryConnector::new(driver.clone()),
            DriverKind::Android,
            Capabilities::new(),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(driver.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_local_kind_ignores_remote_address() {
        let driver = MemoryDriver::new();
        let connector = MemoryConnector::new(driver.clone());
        let remote = Url::parse("http://grid:4444/").unwrap();

        let session =
            DriverSession::open(&connector, DriverKind::Firefox, Capabilities::new(), Some(remote))
                .await
                .unwrap();

        assert_eq!(connector.last_request().and_then(|r| r.remote), None);
        session.destroy().await;
    }

    #[tokio::test]
    async fn test_initial_url_opened_for_browsers() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "Blank", "about:blank");
        let caps = Capabilities::new().with(INITIAL_URL, json!("https://example.com/"));

        let session =
            DriverSession::open(&MemoryConnector::new(driver.clone()), DriverKind::Chrome, caps, None)
                .await
                .unwrap();

        assert_eq!(driver.surface_url("w-1").as_deref(), Some("https://example.com/"));
        session.destroy().await;
    }

    #[tokio::test]
    async fn test_list_and_focus() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        driver.open_surface("w-2", "Two", "https://two/");
        let session = open(&driver).await;

        let ids = session.list_surface_ids().await.unwrap();
        assert_eq!(ids, vec![SurfaceId::new("w-1"), SurfaceId::new("w-2")]);

        let guard = session.focus(&ids[1]).await.unwrap();
        assert_eq!(guard.surface(), Some(&ids[1]));
        assert_eq!(guard.backend().title().await.unwrap(), "Two");
    }

    #[tokio::test]
    async fn test_focus_unknown_surface() {
        let driver = MemoryDriver::new();
        let session = open(&driver).await;
        let err = session.focus(&SurfaceId::new("nope")).await.unwrap_err();
        assert!(matches!(err, Error::NoSuchSurface { .. }));
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let driver = MemoryDriver::new();
        let session = open(&driver).await;

        session.destroy().await;
        session.destroy().await;

        assert!(session.is_closed());
        assert_eq!(driver.quit_count(), 1);
        assert!(matches!(
            session.list_surface_ids().await,
            Err(Error::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn test_destroy_absorbs_already_gone() {
        let driver = MemoryDriver::new();
        let session = open(&driver).await;
        driver.fail_quit_with(Error::NoSuchSession);

        session.destroy().await;
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_destroyables_run_in_reverse_order() {
        let driver = MemoryDriver::new();
        let session = open(&driver).await;
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            session
                .register_destroyable(Arc::new(Counter {
                    name,
                    order: Arc::clone(&order),
                    hits: AtomicUsize::new(0),
                }))
                .unwrap();
        }

        session.destroy().await;
        session.destroy().await;

        assert_eq!(*order.lock(), vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_register_after_destroy_rejected() {
        let driver = MemoryDriver::new();
        let session = open(&driver).await;
        session.destroy().await;

        let result = session.register_destroyable(Arc::new(Counter {
            name: "late",
            order: Arc::new(Mutex::new(Vec::new())),
            hits: AtomicUsize::new(0),
        }));
        assert!(matches!(result, Err(Error::SessionClosed)));
    }

    #[test]
    fn test_session_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<DriverSession>();
    }

    #[test]
    fn test_session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DriverSession>();
    }
}
