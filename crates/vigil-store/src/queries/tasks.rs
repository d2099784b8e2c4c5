//! tasks table queries.

use rusqlite::params;
use vigil_core::StoreError;

use crate::connection::Database;

/// A task row.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: i64,
    pub uuid: String,
    pub owner: Option<i64>,
    pub name: String,
    pub comment: Option<String>,
    pub hosts: Option<String>,
    pub run_status: i64,
}

/// Task list row with the domain summaries computed by the engine.
#[derive(Debug, Clone)]
pub struct TaskSummaryRow {
    pub id: i64,
    pub name: String,
    pub status_name: String,
    pub trend: String,
    pub threat: String,
}

/// Insert a task. The uuid, canonical host list, and timestamps are produced
/// by the scalar functions inside the statement.
pub fn create_task(
    db: &Database,
    owner: Option<i64>,
    name: &str,
    hosts: &str,
    comment: Option<&str>,
) -> Result<TaskRecord, StoreError> {
    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO tasks
             (uuid, owner, name, hosts, comment, creation_time, modification_time)
             VALUES (make_uuid(), ?1, ?2, clean_hosts(?3), ?4, now(), now())",
            params![owner, name, hosts, comment],
        )?;
        Ok(conn.last_insert_rowid())
    })?;
    get_task(db, id)?.ok_or_else(|| StoreError::fatal("task row vanished after insert"))
}

/// Duplicate a task under a fresh uuid and a uniquified name
/// (`"{name} Copy 1"`, `"{name} Copy 2"`, …).
pub fn copy_task(db: &Database, id: i64) -> Result<Option<TaskRecord>, StoreError> {
    let copied = db.with_conn(|conn| {
        let n = conn.execute(
            "INSERT INTO tasks
             (uuid, owner, name, hosts, comment, run_status, creation_time, modification_time)
             SELECT make_uuid(), owner, uniquify('task', name, owner, ' Copy'),
                    hosts, comment, 2, now(), now()
             FROM tasks WHERE id = ?1",
            params![id],
        )?;
        Ok((n > 0).then(|| conn.last_insert_rowid()))
    })?;
    match copied {
        Some(new_id) => get_task(db, new_id),
        None => Ok(None),
    }
}

/// Fetch a task by rowid.
pub fn get_task(db: &Database, id: i64) -> Result<Option<TaskRecord>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT id, uuid, owner, name, comment, hosts, run_status
             FROM tasks WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], |row| {
            Ok(TaskRecord {
                id: row.get(0)?,
                uuid: row.get(1)?,
                owner: row.get(2)?,
                name: row.get(3)?,
                comment: row.get(4)?,
                hosts: row.get(5)?,
                run_status: row.get(6)?,
            })
        })?;
        rows.next().transpose().map_err(Into::into)
    })
}

/// Rename a task, bumping its modification time inside the statement.
pub fn set_task_name(db: &Database, id: i64, name: &str) -> Result<(), StoreError> {
    db.run(
        "UPDATE tasks SET name = ?1, modification_time = now() WHERE id = ?2",
        rusqlite::params![name, id],
    )
}

/// Update a task's run status. Contended freely with the scanner process, so
/// this goes through the bounded-retry runner: a status tick lost under
/// sustained contention is caught by the next tick.
pub fn set_task_run_status(db: &Database, id: i64, status: i64) -> Result<(), StoreError> {
    db.run_or_give_up(
        "UPDATE tasks SET run_status = ?1, modification_time = now() WHERE id = ?2",
        rusqlite::params![status, id],
    )
}

/// Rowids of tasks whose host list contains `host` (trimmed-token match,
/// evaluated by the engine via `hosts_contains`).
pub fn tasks_scanning_host(db: &Database, host: &str) -> Result<Vec<i64>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT id FROM tasks WHERE hosts IS NOT NULL AND hosts_contains(hosts, ?1)
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![host], |row| row.get(0))?;
        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    })
}

/// One row per task with status name, trend, and threat level computed by
/// the task-domain scalar functions.
pub fn task_summaries(db: &Database, overrides: bool) -> Result<Vec<TaskSummaryRow>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, run_status_name(run_status),
                    task_trend(id, ?1), threat_level(id, ?1)
             FROM tasks ORDER BY id",
        )?;
        let rows = stmt.query_map(params![overrides as i64], |row| {
            Ok(TaskSummaryRow {
                id: row.get(0)?,
                name: row.get(1)?,
                status_name: row.get(2)?,
                trend: row.get(3)?,
                threat: row.get(4)?,
            })
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    })
}

/// Creation and modification times of a task as ISO-8601 text, formatted by
/// the engine. Unset times render as empty strings.
pub fn task_times(db: &Database, id: i64) -> Result<Option<(String, String)>, StoreError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT iso_time(creation_time), iso_time(modification_time)
             FROM tasks WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.next().transpose().map_err(Into::into)
    })
}
