//! Driver session layer.
//!
//! This module owns the connection to the remote automation endpoint and
//! the per-session configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DriverSession`] | One remote connection with a session-wide focus lock |
//! | [`DriverBackend`] | Single-focus command surface of an endpoint |
//! | [`Connector`] | Opens backends from a [`ConnectRequest`] |
//! | [`Configuration`] | Immutable per-session settings |
//! | [`DriverKind`] | Browser or mobile driver flavour |
//! | [`LocalServer`] | Automation server process started before connecting |
//! | [`MemoryDriver`] | In-process endpoint for tests and demos |
//!
//! # Example
//!
//! ```ignore
//! use surface_keeper::driver::{Configuration, DriverKind, DriverSession};
//!
//! let config = Configuration::new()
//!     .with_kind(DriverKind::Android)
//!     .with_remote_address("http://127.0.0.1:4723/")?;
//!
//! let session = DriverSession::open_with(&connector, config).await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Backend and connector traits plus their value types.
pub mod backend;

/// Desired capabilities.
pub mod capabilities;

/// Session configuration.
pub mod config;

/// Driver kinds.
pub mod kind;

/// In-process endpoint.
pub mod memory;

/// Local automation server process.
pub mod server;

/// Driver session and focus lock.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use backend::{ConnectRequest, Connector, DriverBackend, PageInfo, SurfaceProperties, WindowRect};
pub use capabilities::Capabilities;
pub use config::{Configuration, LocalServerSettings, Timeouts};
pub use kind::DriverKind;
pub use memory::{MemoryConnector, MemoryDriver};
pub use server::LocalServer;
pub use session::{Destroyable, DriverSession, FocusGuard};
