//! Statement runner — fire-and-forget writes and DDL with contention retry.
//!
//! Three variants share one mechanism and differ only in visibility:
//! [`Database::run`] traces every statement and retries persistently,
//! [`Database::run_or_give_up`] retries a bounded number of times then
//! silently drops the operation, [`Database::run_quiet`] never logs and never
//! gives up on busy. Choosing among them is caller policy, not a different
//! algorithm.

use rusqlite::types::ToSql;
use tracing::{trace, warn};
use vigil_core::StoreError;

use crate::connection::Database;

/// Behavior on engine busy/locked signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry until the statement succeeds, however long that takes.
    Persistent,
    /// Retry up to the given number of times, then abandon the statement
    /// without surfacing an error.
    GiveUp(u32),
    /// Like `Persistent`, but without any logging. For statements running
    /// inside logging itself or on shutdown paths.
    Quiet,
}

impl RetryPolicy {
    fn logs(self) -> bool {
        !matches!(self, Self::Quiet)
    }
}

/// True when the engine reports the backing store is held by another writer.
/// These outcomes are transient by definition and never escape the retry
/// loops as errors.
pub(crate) fn is_busy(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if matches!(
            err.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        )
    )
}

impl Database {
    /// Run a statement to completion, tracing it first. Retries contention
    /// persistently; any other failure is fatal.
    pub fn run(&self, sql: &str, params: &[&dyn ToSql]) -> Result<(), StoreError> {
        trace!(sql, "run");
        self.exec(sql, params, RetryPolicy::Persistent)
    }

    /// Run a statement, giving up silently after the configured retry budget.
    /// An abandoned statement is not an error: the caller opted into losing
    /// the write under sustained contention.
    pub fn run_or_give_up(&self, sql: &str, params: &[&dyn ToSql]) -> Result<(), StoreError> {
        self.exec(sql, params, RetryPolicy::GiveUp(self.give_up_retries()))
    }

    /// Run a statement without logging. Never gives up on busy; other errors
    /// are fatal as usual.
    pub fn run_quiet(&self, sql: &str, params: &[&dyn ToSql]) -> Result<(), StoreError> {
        self.exec(sql, params, RetryPolicy::Quiet)
    }

    /// Run a statement under an explicit policy.
    pub fn run_with_policy(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        policy: RetryPolicy,
    ) -> Result<(), StoreError> {
        self.exec(sql, params, policy)
    }

    fn exec(&self, sql: &str, params: &[&dyn ToSql], policy: RetryPolicy) -> Result<(), StoreError> {
        let mut attempts: u32 = 0;
        loop {
            match self.exec_once(sql, params) {
                Ok(()) => return Ok(()),
                Err(e) if is_busy(&e) => {
                    if let RetryPolicy::GiveUp(budget) = policy {
                        if attempts >= budget {
                            warn!(sql, attempts, "giving up on contended statement");
                            return Ok(());
                        }
                    }
                    if policy.logs() && attempts == 0 {
                        trace!(sql, "statement contended, retrying");
                    }
                    attempts += 1;
                    std::thread::sleep(self.retry_interval());
                }
                // rusqlite resets the statement on step failure, so the code
                // seen here is the true underlying error, not a generic
                // SQLITE_ERROR. Anything non-transient means the statement or
                // schema is wrong: invalid state, not an empty result.
                Err(e) => {
                    return Err(StoreError::fatal(format!("statement failed: {e} ({sql})")))
                }
            }
        }
    }

    /// Prepare, bind, and step one statement to completion. Rows produced by
    /// statements not expected to return any are drained and ignored. The
    /// statement handle is finalized on every exit path by drop order.
    fn exec_once(&self, sql: &str, params: &[&dyn ToSql]) -> Result<(), rusqlite::Error> {
        let mut stmt = self.conn().prepare(sql)?;
        let mut rows = stmt.query(params)?;
        while (rows.next()?).is_some() {}
        Ok(())
    }
}
