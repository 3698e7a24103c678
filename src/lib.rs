//! Surface Keeper - page-object automation over multi-surface drivers.
//!
//! This library models an application under test as a tree of parts bound
//! to the windows, native screens and web-view contexts ("surfaces") of a
//! remote automation session.
//!
//! # Architecture
//!
//! The remote endpoint only ever addresses its focused surface. The crate
//! turns that single-focus protocol into independent surface handles:
//!
//! - One [`DriverSession`] per remote connection, with a session-wide focus lock
//! - One [`Handle`] per surface identifier, tracked by the [`Registry`]
//! - Every handle operation refocuses its surface under the lock
//! - Parts are built by the [`Decomposer`] and proxied through interceptors
//!
//! # Quick Start
//!
//! ```ignore
//! use surface_keeper::{Constructor, Launcher, Locator, Logging, Part, Result, Scope};
//!
//! struct Home {
//!     scope: Scope,
//! }
//!
//! impl Part for Home {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::handle(|scope| Ok(Home { scope }))]
//!     }
//! }
//!
//! async fn run(connector: impl surface_keeper::Connector + 'static) -> Result<()> {
//!     let home = Launcher::new(connector)
//!         .interceptor(Logging)
//!         .launch::<Home>()
//!         .await?;
//!
//!     home.invoke("search", async |h: &Home| {
//!         h.scope.type_text(&Locator::name("q"), "rust").await
//!     })
//!     .await?;
//!
//!     home.quit().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`driver`] | Sessions, backends, configuration, local server |
//! | [`surface`] | [`Handle`], frames, locators, content strategies |
//! | [`registry`] | Handle discovery and queries |
//! | [`model`] | Parts, decomposition, interceptors, launcher |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Driver session layer.
///
/// Use [`DriverSession::open_with()`] or the [`Launcher`] to connect.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for sessions, handles, surfaces and elements.
pub mod identifiers;

/// Application model: parts, decomposition and interception.
pub mod model;

/// Handle registry.
pub mod registry;

/// Surfaces and the handles that track them.
pub mod surface;

// ============================================================================
// Re-exports
// ============================================================================

// Driver types
pub use driver::{
    Capabilities, Configuration, ConnectRequest, Connector, DriverBackend, DriverKind,
    DriverSession, LocalServer, LocalServerSettings, MemoryConnector, MemoryDriver, PageInfo,
    SurfaceProperties, Timeouts, WindowRect,
};

// Surface types
pub use surface::{ContentStrategy, FramePath, FrameStep, Handle, HandleKind, Locator};

// Registry types
pub use registry::{HandleQuery, Registry, SurfaceMatcher};

// Model types
pub use model::{
    AwaitReady, Constructor, Decomposer, Descriptor, Field, Intercepted, Interceptor,
    InterceptorChain, Invocation, Launcher, Logging, Part, RetryOnRecoverable, Scope, Shape,
    Slot, Target,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ElementId, HandleId, SessionId, SurfaceId};
