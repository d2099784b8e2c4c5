//! Database handle — the single logical writer.
//!
//! Replaces the ambient global connection of older scan managers with an
//! explicit object: the daemon opens one `Database`, every subsystem borrows
//! it, and dropping it closes the connection. No code outside this crate
//! touches a raw `&Connection` for daemon state.

pub mod pragmas;

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{info, warn};
use vigil_core::{StoreConfig, StoreError};

use crate::functions::FunctionRegistry;
use crate::migrations;
use crate::runner::is_busy;

/// Handle to the daemon's SQLite store.
///
/// One per process. Not `Sync` — all operations are synchronous and run on
/// the thread that owns the handle, relying on the engine's busy/locked
/// signaling for cross-process write contention.
pub struct Database {
    conn: Connection,
    retry_interval: Duration,
    give_up_retries: u32,
}

impl Database {
    /// Open a file-backed store: applies PRAGMAs, installs the scalar
    /// functions, and migrates the schema to the current version.
    pub fn open(path: &Path, registry: &FunctionRegistry) -> Result<Self, StoreError> {
        Self::open_with_config(&StoreConfig::default(), Some(path), registry)
    }

    /// Open an in-memory store (tests and dry runs).
    pub fn open_in_memory(registry: &FunctionRegistry) -> Result<Self, StoreError> {
        Self::open_with_config(&StoreConfig::default(), None, registry)
    }

    /// Open with explicit configuration. `path` overrides `config.path`;
    /// both absent means in-memory.
    pub fn open_with_config(
        config: &StoreConfig,
        path: Option<&Path>,
        registry: &FunctionRegistry,
    ) -> Result<Self, StoreError> {
        let conn = match (path, config.path.as_deref()) {
            (Some(p), _) => Connection::open(p)?,
            (None, Some(p)) => Connection::open(p)?,
            (None, None) => Connection::open_in_memory()?,
        };
        pragmas::apply_pragmas(&conn, config.effective_busy_timeout_ms())?;
        registry.install(&conn)?;

        let db = Self {
            conn,
            retry_interval: Duration::from_millis(config.effective_retry_interval_ms()),
            give_up_retries: config.effective_give_up_retries(),
        };
        let version = migrations::migrate(&db)?;
        info!(version, "store opened");
        Ok(db)
    }

    /// Execute a closure with the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        f(&self.conn)
    }

    /// Prepare a statement, retrying while the engine reports busy/locked.
    ///
    /// Preparation only takes the schema lock, so contention here clears as
    /// soon as a competing writer commits; the loop is unbounded by design.
    pub fn prepare(&self, sql: &str) -> Result<rusqlite::Statement<'_>, StoreError> {
        let mut reported = false;
        loop {
            match self.conn.prepare(sql) {
                Ok(stmt) => return Ok(stmt),
                Err(e) if is_busy(&e) => {
                    if !reported {
                        warn!(sql, "prepare contended, retrying");
                        reported = true;
                    }
                    std::thread::sleep(self.retry_interval);
                }
                Err(e) => {
                    return Err(StoreError::fatal(format!("prepare failed: {e} ({sql})")))
                }
            }
        }
    }

    /// Close the store explicitly, surfacing any close-time error.
    /// Dropping the handle closes it too; this variant is for shutdown paths
    /// that want the failure logged and reported.
    pub fn close(self) -> Result<(), StoreError> {
        let Self { conn, .. } = self;
        conn.close().map_err(|(_, e)| {
            warn!(error = %e, "store close failed");
            e.into()
        })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub(crate) fn give_up_retries(&self) -> u32 {
        self.give_up_retries
    }
}
