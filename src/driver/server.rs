//! Locally started automation server.
//!
//! When a configuration names a [`LocalServerSettings`] program, the
//! launcher starts it before connecting and registers the resulting
//! [`LocalServer`] as a [`Destroyable`] so the process dies with the
//! session. The child is spawned with `kill_on_drop`, so dropping a server
//! that was never stopped still signals the process.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;

use super::config::LocalServerSettings;
use super::session::Destroyable;

// ============================================================================
// LocalServer
// ============================================================================

/// A running automation server process.
pub struct LocalServer {
    program: PathBuf,
    pid: u32,
    /// `None` once stopped.
    child: Mutex<Option<Child>>,
}

impl fmt::Debug for LocalServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalServer")
            .field("program", &self.program)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl LocalServer {
    /// Starts the server and waits for its startup delay.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the program cannot be spawned.
    pub async fn start(settings: &LocalServerSettings) -> Result<Self> {
        let mut cmd = Command::new(&settings.program);
        cmd.args(&settings.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = cmd.spawn()?;
        let pid = child.id().unwrap_or(0);
        info!(pid, program = %settings.program.display(), "Automation server started");

        if settings.startup_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(settings.startup_delay_ms)).await;
        }

        Ok(Self {
            program: settings.program.clone(),
            pid,
            child: Mutex::new(Some(child)),
        })
    }

    /// Process ID (0 if the platform did not report one).
    #[inline]
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns `true` while the process has not exited.
    pub async fn is_running(&self) -> bool {
        match self.child.lock().await.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Kills the process and reaps it. Idempotent.
    pub async fn stop(&self) {
        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };
        debug!(pid = self.pid, "Stopping automation server");
        if let Err(e) = child.kill().await {
            debug!(pid = self.pid, error = %e, "Automation server already gone");
        }
        info!(pid = self.pid, "Automation server stopped");
    }
}

#[async_trait]
impl Destroyable for LocalServer {
    fn name(&self) -> &str {
        "local-server"
    }

    async fn destroy(&self) {
        self.stop().await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;

    fn settings(program: &str, args: &[&str]) -> LocalServerSettings {
        LocalServerSettings {
            program: PathBuf::from(program),
            args: args.iter().map(|a| a.to_string()).collect(),
            startup_delay_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let err = LocalServer::start(&settings("/nonexistent/automation-server", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_destroy_kills_process() {
        let server = LocalServer::start(&settings("sleep", &["30"])).await.unwrap();
        assert!(server.is_running().await);

        server.destroy().await;
        assert!(!server.is_running().await);

        // second stop is a no-op
        server.stop().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_after_exit() {
        let server = LocalServer::start(&settings("true", &[])).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!server.is_running().await);

        server.stop().await;
        assert!(!server.is_running().await);
    }

    #[test]
    fn test_local_server_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LocalServer>();
    }
}
