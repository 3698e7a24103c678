//! Handle registry.
//!
//! The [`Registry`] owns the mapping from surface identifier to [`Handle`]
//! for one [`DriverSession`]. Every query re-lists the surfaces and brings
//! the table in line with the listing:
//!
//! | Listing | Table | Action |
//! |---------|-------|--------|
//! | present | absent or destroyed | materialize a new handle |
//! | present | live handle | keep |
//! | absent | live handle | destroy and remove |
//!
//! Listing and table mutation are serialized by one async lock, so two
//! callers asking for "handle #0" concurrently each get a consistent
//! snapshot. Handles retired while a listing is in flight are recorded and
//! never rematerialized from that listing.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::driver::config::saturating_millis;
use crate::driver::{Destroyable, DriverSession, SurfaceProperties};
use crate::error::{Error, Result};
use crate::identifiers::{HandleId, SurfaceId};
use crate::surface::{Handle, HandleKind};

use super::query::{HandleQuery, SurfaceMatcher};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a registry.
pub(crate) struct RegistryInner {
    /// Session whose surfaces are tracked.
    session: DriverSession,
    /// Kind given to new handles.
    kind: HandleKind,
    /// Serializes listing with table mutation.
    sync: AsyncMutex<()>,
    /// Live handles and in-flight retirements.
    table: Mutex<Table>,
    /// Delay between listings while waiting.
    poll_interval: Duration,
}

#[derive(Default)]
struct Table {
    /// Live handles by surface.
    handles: FxHashMap<SurfaceId, Handle>,
    /// Surfaces retired since the current listing was requested.
    retired: FxHashSet<SurfaceId>,
}

impl RegistryInner {
    /// Removes `handle` from the table if it is still the tracked one.
    ///
    /// A reincarnated identifier already bound to a newer handle is kept.
    /// The surface is also recorded as retired so a listing sent before the
    /// retirement cannot bring it back.
    pub(crate) fn forget(&self, handle: &Handle) {
        let mut table = self.table.lock();
        table.retired.insert(handle.surface().clone());
        if table
            .handles
            .get(handle.surface())
            .is_some_and(|tracked| tracked.same_handle(handle))
        {
            table.handles.remove(handle.surface());
            trace!(surface = %handle.surface(), "Handle forgotten");
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Tracks the live surfaces of one session.
///
/// Cheap to clone; all clones share one table.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("session", &self.inner.session.id())
            .field("tracked", &self.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Registry - Constructors
// ============================================================================

impl Registry {
    /// Creates the registry for `session`.
    ///
    /// The registry registers itself for teardown: when the session is
    /// destroyed every handle it tracks is destroyed too.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session is already destroyed.
    pub fn new(session: DriverSession) -> Result<Self> {
        let kind = if session.kind().is_mobile() {
            HandleKind::Screen
        } else {
            HandleKind::Window
        };
        let poll_interval = session.configuration().poll_interval();

        let registry = Self {
            inner: Arc::new(RegistryInner {
                session: session.clone(),
                kind,
                sync: AsyncMutex::new(()),
                table: Mutex::new(Table::default()),
                poll_interval,
            }),
        };

        session.register_destroyable(Arc::new(Teardown {
            registry: Arc::downgrade(&registry.inner),
        }))?;

        debug!(session_id = %session.id(), ?kind, ?poll_interval, "Registry created");
        Ok(registry)
    }
}

// ============================================================================
// Registry - Accessors
// ============================================================================

impl Registry {
    /// Returns the session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &DriverSession {
        &self.inner.session
    }

    /// Returns the delay between listings while waiting.
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// Snapshot of every tracked handle.
    #[must_use]
    pub fn instantiated(&self) -> Vec<Handle> {
        self.inner.table.lock().handles.values().cloned().collect()
    }

    /// The tracked handle for `surface`, without listing.
    #[must_use]
    pub fn tracked(&self, surface: &SurfaceId) -> Option<Handle> {
        self.inner.table.lock().handles.get(surface).cloned()
    }

    /// Number of tracked handles.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.table.lock().handles.len()
    }

    /// Returns `true` if no handle is tracked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Registry - Queries
// ============================================================================

impl Registry {
    /// Lists surfaces and reconciles the table.
    ///
    /// Returns the handles in listing order. Surfaces retired while the
    /// listing was in flight are left out even if the listing reports them.
    ///
    /// # Errors
    ///
    /// Returns the listing error ([`Error::SessionClosed`] after destroy).
    pub async fn refresh(&self) -> Result<Vec<Handle>> {
        let _sync = self.inner.sync.lock().await;
        self.inner.table.lock().retired.clear();
        let ids = self.inner.session.list_surface_ids().await?;

        let (snapshot, vanished) = {
            let mut guard = self.inner.table.lock();
            let table = &mut *guard;

            let listed: FxHashSet<&SurfaceId> = ids.iter().collect();
            let gone: Vec<SurfaceId> = table
                .handles
                .keys()
                .filter(|id| !listed.contains(id))
                .cloned()
                .collect();
            let vanished: Vec<Handle> = gone
                .iter()
                .filter_map(|id| table.handles.remove(id))
                .collect();

            let mut snapshot = Vec::with_capacity(ids.len());
            for id in &ids {
                if table.retired.contains(id) {
                    trace!(surface = %id, "Skipping surface retired during listing");
                    continue;
                }
                let handle = match table.handles.get(id) {
                    Some(handle) if !handle.is_destroyed() => handle.clone(),
                    _ => {
                        let handle = Handle::new(
                            self.inner.session.clone(),
                            id.clone(),
                            self.inner.kind,
                            Arc::downgrade(&self.inner),
                        );
                        table.handles.insert(id.clone(), handle.clone());
                        handle
                    }
                };
                snapshot.push(handle);
            }
            (snapshot, vanished)
        };

        for handle in vanished {
            handle.mark_destroyed();
            debug!(surface = %handle.surface(), "Surface vanished from listing");
        }

        trace!(surfaces = snapshot.len(), "Registry refreshed");
        Ok(snapshot)
    }

    /// Returns the handle at position `index` of the current listing.
    ///
    /// Listing order is whatever the endpoint reports; re-resolve by
    /// [`Handle::surface`] to keep a stable reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if fewer surfaces are open.
    pub async fn get_handle(&self, index: usize) -> Result<Handle> {
        let snapshot = self.refresh().await?;
        let len = snapshot.len();
        snapshot
            .into_iter()
            .nth(index)
            .ok_or_else(|| Error::index_out_of_range(index, len))
    }

    /// Polls until a surface satisfies `matcher`.
    ///
    /// Candidates that vanish while their properties are read are skipped.
    /// Handles materialized while polling stay tracked after a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] once `timeout` elapses without a match.
    pub async fn get_handle_matching(
        &self,
        matcher: &dyn SurfaceMatcher,
        timeout: Duration,
    ) -> Result<Handle> {
        self.poll(matcher, timeout, &FxHashSet::default()).await
    }

    /// Like [`get_handle_matching`](Self::get_handle_matching), but only
    /// surfaces that were not tracked when the call began qualify.
    pub async fn wait_for_new(
        &self,
        matcher: &dyn SurfaceMatcher,
        timeout: Duration,
    ) -> Result<Handle> {
        let known: FxHashSet<HandleId> = self.refresh().await?.iter().map(Handle::id).collect();
        self.poll(matcher, timeout, &known).await
    }

    /// Resolves a [`HandleQuery`], attaching its content strategy.
    pub async fn find(&self, query: &HandleQuery, timeout: Duration) -> Result<Handle> {
        let handle = self.get_handle_matching(query, timeout).await?;
        Ok(match query.content() {
            Some(strategy) => handle.with_content(strategy.clone()),
            None => handle,
        })
    }

    async fn poll(
        &self,
        matcher: &dyn SurfaceMatcher,
        timeout: Duration,
        exclude: &FxHashSet<HandleId>,
    ) -> Result<Handle> {
        // No deadline when the timeout does not fit the clock.
        let deadline = Instant::now().checked_add(timeout);

        loop {
            for (position, handle) in self.refresh().await?.into_iter().enumerate() {
                if exclude.contains(&handle.id()) {
                    continue;
                }
                match Self::evaluate(matcher, position, &handle).await {
                    Ok(true) => {
                        debug!(surface = %handle.surface(), position, "Handle matched");
                        return Ok(handle);
                    }
                    Ok(false) => {}
                    Err(e) if e.is_surface_missing() || matches!(e, Error::UseOfDestroyedHandle { .. }) => {
                        trace!(surface = %handle.surface(), "Candidate vanished while polling");
                    }
                    Err(e) => return Err(e),
                }
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::timeout(
                            format!("waiting for surface: {}", matcher.describe()),
                            saturating_millis(timeout),
                        ));
                    }
                    self.inner.poll_interval.min(deadline - now)
                }
                None => self.inner.poll_interval,
            };
            tokio::time::sleep(pause).await;
        }
    }

    async fn evaluate(matcher: &dyn SurfaceMatcher, position: usize, handle: &Handle) -> Result<bool> {
        let properties = if matcher.needs_properties() {
            handle.properties().await?
        } else {
            SurfaceProperties {
                surface: handle.surface().clone(),
                title: String::new(),
                url: String::new(),
                activity: None,
            }
        };
        Ok(matcher.matches(position, &properties))
    }
}

// ============================================================================
// Registry - Mutation
// ============================================================================

impl Registry {
    /// Closes the surface `surface`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoSuchSurface`] if the surface is not open
    /// - any error of [`Handle::close`]
    pub async fn close(&self, surface: &SurfaceId) -> Result<()> {
        let handle = match self.tracked(surface) {
            Some(handle) => handle,
            None => self
                .refresh()
                .await?
                .into_iter()
                .find(|h| h.surface() == surface)
                .ok_or_else(|| Error::no_such_surface(surface.clone()))?,
        };
        handle.close().await
    }
}

// ============================================================================
// Teardown
// ============================================================================

/// Destroys every tracked handle when the session dies.
struct Teardown {
    registry: Weak<RegistryInner>,
}

#[async_trait]
impl Destroyable for Teardown {
    fn name(&self) -> &str {
        "handle-registry"
    }

    async fn destroy(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let handles: Vec<Handle> = registry
            .table
            .lock()
            .handles
            .drain()
            .map(|(_, h)| h)
            .collect();
        for handle in &handles {
            handle.mark_destroyed();
        }
        info!(handles = handles.len(), "Registry torn down");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::driver::{Capabilities, DriverKind, MemoryConnector, MemoryDriver};

    async fn registry(driver: &MemoryDriver) -> Registry {
        let session = DriverSession::open(
            &MemoryConnector::new(driver.clone()),
            DriverKind::Chrome,
            Capabilities::new(),
            None,
        )
        .await
        .expect("session");
        Registry::new(session).expect("registry")
    }

    fn two_windows() -> MemoryDriver {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "One", "https://one/");
        driver.open_surface("w-2", "Two", "https://two/");
        driver
    }

    #[tokio::test]
    async fn test_refresh_materializes_in_listing_order() {
        let driver = two_windows();
        let registry = registry(&driver).await;
        assert!(registry.is_empty());

        let handles = registry.refresh().await.unwrap();
        let ids: Vec<_> = handles.iter().map(|h| h.surface().as_str()).collect();
        assert_eq!(ids, vec!["w-1", "w-2"]);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_get_handle_is_stable_without_changes() {
        let driver = two_windows();
        let registry = registry(&driver).await;

        let first = registry.get_handle(1).await.unwrap();
        let second = registry.get_handle(1).await.unwrap();
        assert!(first.same_handle(&second));
    }

    #[tokio::test]
    async fn test_get_handle_out_of_range() {
        let driver = two_windows();
        let registry = registry(&driver).await;

        let err = registry.get_handle(5).await.unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 5, len: 2 }));
    }

    #[tokio::test]
    async fn test_vanished_surface_is_destroyed() {
        let driver = two_windows();
        let registry = registry(&driver).await;
        let two = registry.get_handle(1).await.unwrap();

        driver.close_surface_remotely("w-2");
        registry.refresh().await.unwrap();

        assert!(two.is_destroyed());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_reincarnated_identifier_gets_new_handle() {
        let driver = two_windows();
        let registry = registry(&driver).await;
        let old = registry.get_handle(1).await.unwrap();

        old.close().await.unwrap();
        driver.open_surface("w-2", "Again", "https://again/");
        let new = registry.get_handle(1).await.unwrap();

        assert!(!new.same_handle(&old));
        assert_ne!(new.id(), old.id());
        assert_eq!(new.title().await.unwrap(), "Again");
        assert!(matches!(
            old.title().await,
            Err(Error::UseOfDestroyedHandle { .. })
        ));
    }

    #[tokio::test]
    async fn test_stale_forget_keeps_new_handle() {
        let driver = two_windows();
        let registry = registry(&driver).await;
        let old = registry.get_handle(0).await.unwrap();

        driver.close_surface_remotely("w-1");
        registry.refresh().await.unwrap();
        driver.open_surface("w-1", "Back", "https://back/");
        let new = registry.refresh().await.unwrap().remove(1);

        registry.inner.forget(&old);
        assert!(registry.tracked(new.surface()).is_some_and(|h| h.same_handle(&new)));
    }

    #[tokio::test]
    async fn test_close_forgets_handle() {
        let driver = two_windows();
        let registry = registry(&driver).await;
        registry.refresh().await.unwrap();

        registry.close(&SurfaceId::new("w-1")).await.unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.tracked(&SurfaceId::new("w-1")).is_none());

        let err = registry.close(&SurfaceId::new("w-9")).await.unwrap_err();
        assert!(matches!(err, Error::NoSuchSurface { .. }));
    }

    #[tokio::test]
    async fn test_matcher_by_title() {
        let driver = two_windows();
        let registry = registry(&driver).await;

        let query = HandleQuery::new().with_title("^Two$").unwrap();
        let handle = registry
            .get_handle_matching(&query, Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(handle.surface().as_str(), "w-2");
    }

    #[tokio::test]
    async fn test_matcher_timeout_keeps_materialized_handles() {
        let driver = two_windows();
        let registry = registry(&driver).await;

        let query = HandleQuery::new().with_title("never").unwrap();
        let started = std::time::Instant::now();
        let err = registry
            .get_handle_matching(&query, Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_new_ignores_known_surfaces() {
        let driver = two_windows();
        let registry = registry(&driver).await;

        let popup_driver = driver.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            popup_driver.open_surface("w-3", "Popup", "https://popup/");
        });

        let any = HandleQuery::new();
        let handle = registry
            .wait_for_new(&any, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(handle.surface().as_str(), "w-3");
    }

    #[tokio::test]
    async fn test_destroying_session_destroys_handles() {
        let driver = two_windows();
        let registry = registry(&driver).await;
        let handles = registry.refresh().await.unwrap();

        registry.session().destroy().await;

        assert!(registry.is_empty());
        assert!(handles.iter().all(Handle::is_destroyed));
        assert!(matches!(registry.refresh().await, Err(Error::SessionClosed)));
    }

    #[tokio::test]
    async fn test_close_during_listing_is_not_rematerialized() {
        let driver = two_windows();
        let registry = registry(&driver).await;
        registry.refresh().await.unwrap();
        driver.set_listing_delay(Duration::from_millis(150));

        let closer = async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            registry.close(&SurfaceId::new("w-2")).await
        };
        let (listed, closed) = tokio::join!(registry.refresh(), closer);
        closed.unwrap();

        let listed = listed.unwrap();
        assert_eq!(driver.surface_count(), 1);
        assert!(listed.iter().all(|h| h.surface().as_str() == "w-1"));
        assert!(registry.tracked(&SurfaceId::new("w-2")).is_none());
        assert_eq!(registry.len(), 1);

        driver.set_listing_delay(Duration::ZERO);
        assert_eq!(registry.refresh().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unbounded_wait_does_not_overflow() {
        let driver = two_windows();
        let registry = registry(&driver).await;

        let query = HandleQuery::new().with_title("^Two$").unwrap();
        let handle = registry
            .get_handle_matching(&query, Duration::MAX)
            .await
            .unwrap();
        assert_eq!(handle.surface().as_str(), "w-2");

        let popup_driver = driver.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            popup_driver.open_surface("w-3", "Late", "https://late/");
        });
        let late = HandleQuery::new().with_title("^Late$").unwrap();
        let handle = registry
            .get_handle_matching(&late, Duration::MAX)
            .await
            .unwrap();
        assert_eq!(handle.surface().as_str(), "w-3");
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
