//! Schema versioning and migration helpers.
//!
//! Version tracking uses `PRAGMA user_version` — no extra tables. Each
//! version bump is a const SQL string applied in order by [`migrate`].

use tracing::{info, trace};
use vigil_core::StoreError;

use crate::connection::Database;
use crate::quote::is_identifier;

/// Current schema version. Bump this when adding new migrations.
pub const CURRENT_VERSION: u32 = 1;

/// v1 schema — the daemon state this layer persists.
pub const SCHEMA_V1: &str = r#"
-- Daemon bookkeeping (installation id, nvt feed checksums, ...)
CREATE TABLE IF NOT EXISTS meta (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL
) STRICT;

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    owner INTEGER,
    name TEXT NOT NULL,
    comment TEXT,
    hosts TEXT,
    run_status INTEGER NOT NULL DEFAULT 2,
    start_time INTEGER,
    end_time INTEGER,
    creation_time INTEGER,
    modification_time INTEGER
) STRICT;

CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner);

CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    owner INTEGER,
    task INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    name TEXT,
    start_time INTEGER,
    end_time INTEGER,
    scan_run_status INTEGER NOT NULL DEFAULT 2
) STRICT;

CREATE INDEX IF NOT EXISTS idx_reports_task ON reports(task);

CREATE TABLE IF NOT EXISTS credentials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    owner INTEGER,
    name TEXT NOT NULL,
    login TEXT,
    secret BLOB,
    comment TEXT,
    creation_time INTEGER,
    modification_time INTEGER
) STRICT;

CREATE INDEX IF NOT EXISTS idx_credentials_owner ON credentials(owner);
"#;

/// Read the schema version via `PRAGMA user_version`.
pub fn current_version(db: &Database) -> Result<u32, StoreError> {
    db.with_conn(|conn| {
        let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        Ok(version)
    })
}

fn set_version(db: &Database, version: u32) -> Result<(), StoreError> {
    db.with_conn(|conn| {
        conn.pragma_update(None, "user_version", version)?;
        Ok(())
    })
}

/// Run all pending migrations up to [`CURRENT_VERSION`]. Idempotent.
/// Returns the version the database ends at.
pub fn migrate(db: &Database) -> Result<u32, StoreError> {
    let from = current_version(db)?;
    if from >= CURRENT_VERSION {
        return Ok(from);
    }

    if from < 1 {
        info!("migrating schema: 0 -> 1 (initial tables)");
        db.with_conn(|conn| {
            conn.execute_batch(SCHEMA_V1)
                .map_err(|e| StoreError::MigrationFailed {
                    version: 1,
                    message: e.to_string(),
                })
        })?;
        set_version(db, 1)?;
    }

    // Future migrations go here, lowest version first.

    let to = current_version(db)?;
    info!(from, to, "schema migration complete");
    Ok(to)
}

/// Copy every row of `old_table` into `new_table`, renaming `old_name` to
/// `new_name` on the way.
///
/// The live column set is discovered from the first row by name, not from
/// any static schema description, so this works across versions that added
/// or dropped other columns. An empty source table is a successful no-op.
/// Creating `new_table` is the caller's responsibility.
pub fn rename_column(
    db: &Database,
    old_table: &str,
    new_table: &str,
    old_name: &str,
    new_name: &str,
) -> Result<(), StoreError> {
    for name in [old_table, new_table] {
        if !is_identifier(name) {
            return Err(StoreError::fatal(format!("invalid table name {name:?}")));
        }
    }

    let probe = format!("SELECT * FROM {old_table} LIMIT 1");
    let columns = db.with_cursor(&probe, &[], |cursor| {
        if !cursor.advance()? {
            return Ok(None);
        }
        let count = cursor.column_count()?;
        let mut names = Vec::with_capacity(count);
        for i in 0..count {
            names.push(cursor.column_name(i)?);
        }
        Ok(Some(names))
    })?;

    let Some(columns) = columns else {
        trace!(old_table, "rename_column: source empty, nothing to copy");
        return Ok(());
    };

    let source = columns.join(", ");
    let dest = columns
        .iter()
        .map(|c| if c == old_name { new_name } else { c.as_str() })
        .collect::<Vec<_>>()
        .join(", ");

    db.run(
        &format!("INSERT INTO {new_table} ({dest}) SELECT {source} FROM {old_table}"),
        &[],
    )
}
