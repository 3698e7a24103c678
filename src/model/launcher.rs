//! Application launcher.
//!
//! The [`Launcher`] is the entry point: it opens a driver session, creates
//! the handle registry, waits for the first surface and builds the
//! requested application type through the [`Decomposer`].
//!
//! # Example
//!
//! ```ignore
//! use surface_keeper::{Configuration, DriverKind, Launcher, Logging};
//!
//! let shop = Launcher::new(connector)
//!     .configuration(Configuration::from_json_file("session.json")?)
//!     .interceptor(Logging)
//!     .launch::<Shop>()
//!     .await?;
//!
//! shop.quit().await;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::driver::{Capabilities, Configuration, Connector, DriverKind, DriverSession, LocalServer};
use crate::error::{Error, Result};
use crate::registry::{HandleQuery, Registry};

use super::decompose::Decomposer;
use super::intercept::{ChainBuilder, Intercepted, InterceptorChain, Interceptor};
use super::part::Part;

// ============================================================================
// Target
// ============================================================================

/// Platform an application is designed for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Target {
    /// Runs on any driver kind.
    #[default]
    Any,
    /// Browser applications only.
    Browser,
    /// Mobile applications only.
    Mobile,
}

impl Target {
    /// Returns `true` if `kind` can run an application of this target.
    #[must_use]
    pub const fn accepts(self, kind: DriverKind) -> bool {
        match self {
            Self::Any => true,
            Self::Browser => kind.is_browser(),
            Self::Mobile => kind.is_mobile(),
        }
    }
}

// ============================================================================
// Launcher
// ============================================================================

/// Builds an application on a fresh driver session.
pub struct Launcher {
    connector: Arc<dyn Connector>,
    config: Configuration,
    chain: ChainBuilder,
    target: Target,
}

impl fmt::Debug for Launcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Launcher")
            .field("kind", &self.config.kind())
            .field("target", &self.target)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl Launcher {
    /// Creates a launcher with the default configuration.
    #[must_use]
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self::with_connector(Arc::new(connector))
    }

    /// Creates a launcher from a shared connector.
    #[must_use]
    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            config: Configuration::new(),
            chain: InterceptorChain::builder(),
            target: Target::Any,
        }
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn configuration(mut self, config: Configuration) -> Self {
        self.config = config;
        self
    }

    /// Sets the driver kind.
    #[must_use]
    pub fn kind(mut self, kind: DriverKind) -> Self {
        self.config.driver.kind = kind;
        self
    }

    /// Merges `capabilities` over the configured ones.
    #[must_use]
    pub fn capabilities(mut self, capabilities: &Capabilities) -> Self {
        self.config.capabilities = self.config.capabilities.merge(capabilities);
        self
    }

    /// Sets one capability.
    #[must_use]
    pub fn capability(mut self, name: impl Into<String>, value: Value) -> Self {
        self.config.capabilities.set(name, value);
        self
    }

    /// Sets the remote endpoint address.
    #[must_use]
    pub fn remote(mut self, address: Url) -> Self {
        self.config.driver.remote_address = Some(address);
        self
    }

    /// Appends an interceptor to the chain of every built part.
    #[must_use]
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.chain = self.chain.with(interceptor);
        self
    }

    /// Declares the platform the application is designed for.
    #[must_use]
    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Launches application `A`.
    ///
    /// Opens the session (starting the local server first, if configured),
    /// waits up to the configured handle wait for the first surface and
    /// builds `A` bound to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LaunchFailure`] wrapping the first failing step.
    /// The partially built session is destroyed before returning.
    pub async fn launch<A: Part>(self) -> Result<Intercepted<A>> {
        let Self {
            connector,
            config,
            chain,
            target,
        } = self;
        let chain = chain.build();
        let kind = config.kind();

        if !target.accepts(kind) {
            return Err(Error::launch_failure(Error::config(format!(
                "Application {} targets {target:?} and cannot run on {kind}",
                std::any::type_name::<A>()
            ))));
        }

        let server = match &config.local_server {
            Some(settings) => Some(Arc::new(
                LocalServer::start(settings)
                    .await
                    .map_err(Error::launch_failure)?,
            )),
            None => None,
        };

        let handle_wait = config.handle_wait();
        let session = match DriverSession::open_with(connector.as_ref(), config).await {
            Ok(session) => session,
            Err(e) => {
                if let Some(server) = server {
                    server.stop().await;
                }
                return Err(Error::launch_failure(e));
            }
        };

        let built = async {
            if let Some(server) = server {
                session.register_destroyable(server)?;
            }
            let registry = Registry::new(session.clone())?;
            let first = registry.find(&HandleQuery::index(0), handle_wait).await?;
            Decomposer::new(registry, chain).root::<A>(first).await
        };

        match built.await {
            Ok(app) => {
                info!(session_id = %session.id(), kind = %kind, "Application launched");
                Ok(app)
            }
            Err(e) => {
                warn!(session_id = %session.id(), error = %e, "Launch failed, destroying session");
                session.destroy().await;
                Err(Error::launch_failure(e))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::driver::{MemoryConnector, MemoryDriver};
    use crate::model::part::{Constructor, Field, Scope, Slot};
    use crate::model::Logging;
    use crate::surface::{FramePath, Locator};

    struct SearchBox {
        scope: Scope,
    }

    impl Part for SearchBox {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::handle_locator(|scope| Ok(SearchBox { scope }))]
        }
    }

    struct Portal {
        search: Slot<SearchBox>,
    }

    impl Part for Portal {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::handle(|_| {
                Ok(Portal {
                    search: Slot::new().with_locator(Locator::id("q")),
                })
            })]
        }

        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::new("search", &mut self.search)]
        }
    }

    struct Broken;

    impl Part for Broken {
        fn constructors() -> Vec<Constructor<Self>> {
            Vec::new()
        }
    }

    fn quick() -> Configuration {
        Configuration::new()
            .with_kind(DriverKind::Chrome)
            .with_handle_wait(Duration::from_millis(150))
    }

    #[tokio::test]
    async fn test_launch_builds_populated_app() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "Portal", "https://portal/");
        driver.add_element("w-1", &FramePath::new(), Locator::id("q"), "");

        let portal = Launcher::new(MemoryConnector::new(driver.clone()))
            .configuration(quick())
            .interceptor(Logging)
            .launch::<Portal>()
            .await
            .unwrap();

        let search = portal.field(|p| &p.search).unwrap();
        search
            .invoke("type", async |s: &SearchBox| {
                s.scope.type_text(&Locator::id("q"), "rust").await
            })
            .await
            .unwrap();
        assert_eq!(portal.chain().names(), vec!["logging"]);

        portal.quit().await;
        assert_eq!(driver.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_destroys_session() {
        let driver = MemoryDriver::new();
        driver.open_surface("w-1", "Portal", "https://portal/");

        let err = Launcher::new(MemoryConnector::new(driver.clone()))
            .configuration(quick())
            .launch::<Broken>()
            .await
            .unwrap_err();

        let Error::LaunchFailure { source } = err else {
            panic!("expected launch failure");
        };
        assert!(matches!(*source, Error::AmbiguousOrMissingConstructor { .. }));
        assert_eq!(driver.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_no_surface_times_out() {
        let driver = MemoryDriver::new();

        let err = Launcher::new(MemoryConnector::new(driver.clone()))
            .configuration(quick())
            .launch::<Portal>()
            .await
            .unwrap_err();

        let Error::LaunchFailure { source } = err else {
            panic!("expected launch failure");
        };
        assert!(source.is_timeout());
        assert_eq!(driver.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_target_mismatch_never_connects() {
        let driver = MemoryDriver::new();

        let err = Launcher::new(MemoryConnector::new(driver.clone()))
            .configuration(quick())
            .target(Target::Mobile)
            .launch::<Portal>()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LaunchFailure { .. }));
        assert_eq!(driver.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_failure_is_wrapped() {
        let driver = MemoryDriver::new();
        let connector = MemoryConnector::new(driver.clone());
        connector.fail_next_with(Error::ConnectionClosed);

        let err = Launcher::new(connector)
            .configuration(quick())
            .launch::<Portal>()
            .await
            .unwrap_err();

        let Error::LaunchFailure { source } = err else {
            panic!("expected launch failure");
        };
        assert!(matches!(*source, Error::ConnectionClosed));
    }

    #[test]
    fn test_target_accepts() {
        assert!(Target::Any.accepts(DriverKind::Ios));
        assert!(Target::Browser.accepts(DriverKind::Safari));
        assert!(!Target::Browser.accepts(DriverKind::Android));
        assert!(Target::Mobile.accepts(DriverKind::Android));
    }
}
