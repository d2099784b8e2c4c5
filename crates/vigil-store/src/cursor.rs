//! Lazy, forward-only cursor over a statement's result rows.
//!
//! A cursor either borrows a statement the caller prepared and keeps
//! ([`Cursor::over`]) or lives inside a [`Database::with_cursor`] scope that
//! prepares and finalizes the statement around it. Either way the statement
//! is released exactly once on every exit path — the scope (or the caller's
//! own drop) guarantees it.
//!
//! Once a cursor reports exhaustion, column access is invalid: the engine no
//! longer holds a row, and reading would return garbage. Accessors return
//! the fatal error tier instead.

use fallible_streaming_iterator::FallibleStreamingIterator;
use rusqlite::types::ToSql;
use rusqlite::{Row, Rows, Statement};
use tracing::trace;
use vigil_core::{CryptContext, StoreError};

use crate::connection::Database;
use crate::runner::is_busy;

/// Forward-only view over live query rows.
pub struct Cursor<'s> {
    rows: Rows<'s>,
    exhausted: bool,
    decrypt: Option<Box<dyn CryptContext>>,
}

impl<'s> Cursor<'s> {
    /// Wrap a statement prepared and owned by the caller. The caller keeps
    /// ownership: when this cursor goes away the statement may be reused.
    pub fn over(
        stmt: &'s mut Statement<'_>,
        params: &[&dyn ToSql],
    ) -> Result<Self, StoreError> {
        let rows = stmt.query(params)?;
        Ok(Self {
            rows,
            exhausted: false,
            decrypt: None,
        })
    }

    /// Like [`Cursor::over`], with a per-row decryption hook. The hook is
    /// flushed before every step and released exactly once at cleanup.
    pub fn with_hook(
        stmt: &'s mut Statement<'_>,
        params: &[&dyn ToSql],
        hook: Box<dyn CryptContext>,
    ) -> Result<Self, StoreError> {
        let mut cursor = Self::over(stmt, params)?;
        cursor.decrypt = Some(hook);
        Ok(cursor)
    }

    /// Step to the next row. Returns false when the result set is finished;
    /// after that the cursor is exhausted and stays so.
    ///
    /// Contention during stepping is absorbed by the engine's busy window
    /// (PRAGMA busy_timeout). A busy that outlives the window has already
    /// invalidated the statement position, so it surfaces as fatal rather
    /// than silently restarting the result set.
    pub fn advance(&mut self) -> Result<bool, StoreError> {
        if self.exhausted {
            return Ok(false);
        }
        // Drain buffered plaintext for the row being left behind, so stale
        // decrypted values never leak into the next row.
        if let Some(hook) = self.decrypt.as_mut() {
            hook.flush();
        }
        match self.rows.advance() {
            Ok(()) => {
                if self.rows.get().is_some() {
                    Ok(true)
                } else {
                    self.exhausted = true;
                    Ok(false)
                }
            }
            Err(e) if is_busy(&e) => {
                self.exhausted = true;
                Err(StoreError::fatal(format!(
                    "cursor step contended beyond the engine busy window: {e}"
                )))
            }
            Err(e) => {
                self.exhausted = true;
                Err(StoreError::fatal(format!("cursor step failed: {e}")))
            }
        }
    }

    /// Number of columns in the current row.
    pub fn column_count(&self) -> Result<usize, StoreError> {
        Ok(self.current()?.as_ref().column_count())
    }

    /// Name of column `i` in the current row.
    pub fn column_name(&self, i: usize) -> Result<String, StoreError> {
        let row = self.current()?;
        row.as_ref()
            .column_name(i)
            .map(str::to_string)
            .map_err(|e| StoreError::fatal(format!("column name {i}: {e}")))
    }

    /// Integer value of column `i`. SQL NULL reads as 0, matching the
    /// engine's own coercion for integer contexts.
    pub fn column_i64(&self, i: usize) -> Result<i64, StoreError> {
        let row = self.current()?;
        row.get::<_, Option<i64>>(i)
            .map(|v| v.unwrap_or(0))
            .map_err(|e| StoreError::fatal(format!("column {i}: {e}")))
    }

    /// Text value of column `i`; None for SQL NULL.
    pub fn column_string(&self, i: usize) -> Result<Option<String>, StoreError> {
        let row = self.current()?;
        row.get::<_, Option<String>>(i)
            .map_err(|e| StoreError::fatal(format!("column {i}: {e}")))
    }

    /// Release the decryption hook. Idempotent; also runs on drop.
    pub fn close(&mut self) {
        if let Some(mut hook) = self.decrypt.take() {
            hook.release();
        }
    }

    fn current(&self) -> Result<&Row<'s>, StoreError> {
        if self.exhausted {
            return Err(StoreError::fatal("column access on exhausted cursor"));
        }
        self.rows
            .get()
            .ok_or_else(|| StoreError::fatal("column access before first advance"))
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        if self.decrypt.is_some() {
            trace!("cursor dropped with live decrypt hook, releasing");
            self.close();
        }
    }
}

impl Database {
    /// Run `f` over a cursor for `sql`. The statement is prepared here and
    /// finalized when the scope ends, success or error.
    pub fn with_cursor<T, F>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        f: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Cursor<'_>) -> Result<T, StoreError>,
    {
        let mut stmt = self.prepare(sql)?;
        let mut cursor = Cursor::over(&mut stmt, params)?;
        let result = f(&mut cursor);
        cursor.close();
        result
    }

    /// [`Database::with_cursor`] with a credential-decryption hook attached.
    pub fn with_decrypting_cursor<T, F>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        hook: Box<dyn CryptContext>,
        f: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Cursor<'_>) -> Result<T, StoreError>,
    {
        let mut stmt = self.prepare(sql)?;
        let mut cursor = Cursor::with_hook(&mut stmt, params, hook)?;
        let result = f(&mut cursor);
        cursor.close();
        result
    }
}
