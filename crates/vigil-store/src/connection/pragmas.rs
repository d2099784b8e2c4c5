//! SQLite PRAGMA configuration.
//!
//! Must be applied to every connection immediately after opening.

use rusqlite::Connection;
use vigil_core::StoreError;

/// Configure a connection with the daemon's PRAGMA set.
///
/// - WAL for concurrent readers during writes
/// - busy_timeout as the engine-level contention window; the statement
///   runner's retry loops sit on top of it
/// - NORMAL synchronous for WAL durability trade-off
/// - mmap for faster reads on large result tables
pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u32) -> Result<(), StoreError> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA cache_size = -8000;
        PRAGMA mmap_size = 268435456;
        PRAGMA temp_store = MEMORY;
        ",
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pragmas_apply_on_fresh_connection() {
        let conn = Connection::open_in_memory().unwrap();
        apply_pragmas(&conn, 5000).unwrap();

        let timeout: i64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);

        let fk: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
