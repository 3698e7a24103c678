//! Session configuration.
//!
//! A [`Configuration`] is read once when a session launches and is treated
//! as an immutable snapshot afterwards. It can be deserialized from a JSON
//! settings file or assembled with `with_*` builder methods.
//!
//! # Example
//!
//! ```ignore
//! use surface_keeper::{Configuration, DriverKind};
//!
//! let config = Configuration::new()
//!     .with_kind(DriverKind::Android)
//!     .with_remote_address("http://127.0.0.1:4723/")?
//!     .with_handle_wait(Duration::from_secs(10));
//! config.validate()?;
//! ```
//!
//! Settings file layout:
//!
//! ```json
//! {
//!   "driver": { "kind": "chrome" },
//!   "capabilities": { "browserInitialUrl": "https://example.com" },
//!   "timeouts": { "implicit_ms": 0, "page_load_ms": 30000, "script_ms": 30000 },
//!   "handles": { "wait_timeout_ms": 5000, "poll_interval_ms": 250 },
//!   "local_server": { "program": "/usr/bin/chromedriver", "args": ["--port=9515"] }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

use super::capabilities::Capabilities;
use super::kind::DriverKind;

// ============================================================================
// Constants
// ============================================================================

/// Fastest allowed registry poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default registry poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default time to wait for a surface to appear.
pub const DEFAULT_HANDLE_WAIT: Duration = Duration::from_secs(5);

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
#[inline]
#[must_use]
pub fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Sections
// ============================================================================

/// Driver selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Driver kind.
    pub kind: DriverKind,
    /// Remote endpoint, for kinds that run remotely.
    pub remote_address: Option<Url>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            kind: DriverKind::Firefox,
            remote_address: None,
        }
    }
}

/// Session timeouts pushed to the endpoint at launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Implicit element wait in milliseconds.
    pub implicit_ms: u64,
    /// Page load timeout in milliseconds.
    pub page_load_ms: u64,
    /// Script timeout in milliseconds.
    pub script_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            implicit_ms: 0,
            page_load_ms: 300_000,
            script_ms: 30_000,
        }
    }
}

/// Handle registry tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleSettings {
    /// How long to wait for an expected surface, in milliseconds.
    pub wait_timeout_ms: u64,
    /// Delay between surface listings while waiting, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for HandleSettings {
    fn default() -> Self {
        Self {
            wait_timeout_ms: saturating_millis(DEFAULT_HANDLE_WAIT),
            poll_interval_ms: saturating_millis(DEFAULT_POLL_INTERVAL),
        }
    }
}

/// Automation server to start locally before connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalServerSettings {
    /// Server executable.
    pub program: PathBuf,
    /// Command-line arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Delay before connecting, in milliseconds.
    #[serde(default)]
    pub startup_delay_ms: u64,
}

// ============================================================================
// Configuration
// ============================================================================

/// Immutable per-session settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Driver selection.
    pub driver: DriverSettings,
    /// Desired capabilities merged over the kind's defaults.
    pub capabilities: Capabilities,
    /// Session timeouts.
    pub timeouts: Timeouts,
    /// Registry tuning.
    pub handles: HandleSettings,
    /// Optional local automation server.
    pub local_server: Option<LocalServerSettings>,
}

// ============================================================================
// Constructors
// ============================================================================

impl Configuration {
    /// Creates the default configuration (local Firefox).
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed input.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a configuration from a JSON settings file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, [`Error::Json`] if
    /// it is malformed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Configuration {
    /// Sets the driver kind.
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: DriverKind) -> Self {
        self.driver.kind = kind;
        self
    }

    /// Sets the remote endpoint address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the address does not parse.
    pub fn with_remote_address(mut self, address: &str) -> Result<Self> {
        self.driver.remote_address = Some(Url::parse(address)?);
        Ok(self)
    }

    /// Sets one desired capability.
    #[must_use]
    pub fn with_capability(mut self, name: impl Into<String>, value: Value) -> Self {
        self.capabilities.set(name, value);
        self
    }

    /// Sets the session timeouts.
    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets how long to wait for expected surfaces.
    #[inline]
    #[must_use]
    pub fn with_handle_wait(mut self, wait: Duration) -> Self {
        self.handles.wait_timeout_ms = saturating_millis(wait);
        self
    }

    /// Sets the registry poll interval.
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.handles.poll_interval_ms = saturating_millis(interval);
        self
    }

    /// Starts a local automation server before connecting.
    #[must_use]
    pub fn with_local_server(
        mut self,
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.local_server = Some(LocalServerSettings {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            startup_delay_ms: 0,
        });
        self
    }
}

// ============================================================================
// Derived Values
// ============================================================================

impl Configuration {
    /// Driver kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DriverKind {
        self.driver.kind
    }

    /// Kind defaults with configured capabilities merged on top.
    #[must_use]
    pub fn desired_capabilities(&self) -> Capabilities {
        self.driver
            .kind
            .default_capabilities()
            .merge(&self.capabilities)
    }

    /// How long to wait for expected surfaces.
    #[inline]
    #[must_use]
    pub fn handle_wait(&self) -> Duration {
        Duration::from_millis(self.handles.wait_timeout_ms)
    }

    /// Registry poll interval, never below [`MIN_POLL_INTERVAL`].
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.handles.poll_interval_ms).max(MIN_POLL_INTERVAL)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a remote address is required but
    /// missing, or if the local server program is empty.
    pub fn validate(&self) -> Result<()> {
        let kind = self.driver.kind;
        if kind.requires_remote_address() && self.driver.remote_address.is_none() {
            return Err(Error::config(format!(
                "Driver '{kind}' requires a remote address.\n\
                 Set driver.remote_address in the settings file or use with_remote_address()"
            )));
        }

        if let Some(server) = &self.local_server
            && server.program.as_os_str().is_empty()
        {
            return Err(Error::config("local_server.program must not be empty"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
