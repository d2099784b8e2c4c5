//! Domain scalar functions installed into the query engine.
//!
//! These are not called by Rust code — SQLite invokes them while evaluating
//! SQL text submitted through the runner or a cursor, which lets host-list
//! semantics, feed-time parsing, name uniquification, and task summaries run
//! inside queries (`SELECT task_trend(id, 1) FROM tasks`).
//!
//! Arity is fixed at registration, so the engine rejects mismatched calls
//! before a callback ever runs. A required argument arriving as SQL NULL is
//! reported back to the engine as a function error — it fails the statement,
//! never the process.

pub mod time;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::Connection;
use tracing::trace;
use uuid::Uuid;
use vigil_core::{ClockOracle, HostOracle, StoreError, TaskDomain, TaskId};

use crate::quote::is_identifier;

/// The set of scalar functions and the capabilities they close over.
///
/// Capabilities are injected here once, at setup time; the registry is then
/// installed on the daemon's connection. Nothing global: tests install it on
/// in-memory connections with stub capabilities.
pub struct FunctionRegistry {
    domain: Arc<dyn TaskDomain>,
    hosts: Arc<dyn HostOracle>,
    clock: Arc<dyn ClockOracle>,
}

impl FunctionRegistry {
    pub fn new(
        domain: Arc<dyn TaskDomain>,
        hosts: Arc<dyn HostOracle>,
        clock: Arc<dyn ClockOracle>,
    ) -> Self {
        Self {
            domain,
            hosts,
            clock,
        }
    }

    /// Install every function on `conn`. Called once per connection, right
    /// after the PRAGMAs.
    pub fn install(&self, conn: &Connection) -> Result<(), StoreError> {
        let pure = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
        let volatile = FunctionFlags::SQLITE_UTF8;

        conn.create_scalar_function("make_uuid", 0, volatile, |_ctx| {
            Ok(Uuid::new_v4().to_string())
        })?;

        conn.create_scalar_function("hosts_contains", 2, pure, |ctx| {
            let hosts = text_arg(ctx, 0, "hosts_contains", "hosts")?;
            let host = text_arg(ctx, 1, "hosts_contains", "host")?;
            Ok(hosts_contains(&hosts, &host))
        })?;

        // The engine calls these under its own unwind boundary; the Arc'd
        // capabilities are wrapped so the closures satisfy rusqlite's
        // UnwindSafe bound.
        let hosts = AssertUnwindSafe(Arc::clone(&self.hosts));
        conn.create_scalar_function("clean_hosts", 1, volatile, move |ctx| {
            let list = text_arg(ctx, 0, "clean_hosts", "hosts")?;
            Ok(hosts.clean_hosts(&list))
        })?;

        conn.create_scalar_function("uniquify", 4, volatile, uniquify)?;

        conn.create_scalar_function("iso_time", 1, pure, |ctx| {
            let epoch = ctx.get::<Option<i64>>(0)?.unwrap_or(0);
            time::iso_time(epoch)
                .ok_or_else(|| user_err("iso_time", format!("epoch {epoch} out of range")))
        })?;

        conn.create_scalar_function("parse_time", 1, pure, |ctx| {
            let text = ctx.get::<Option<String>>(0)?.unwrap_or_default();
            Ok(time::parse_time(&text))
        })?;

        let clock = AssertUnwindSafe(Arc::clone(&self.clock));
        conn.create_scalar_function("now", 0, volatile, move |_ctx| Ok(clock.now()))?;

        conn.create_scalar_function("tag", 2, pure, |ctx| {
            let tags = ctx.get::<Option<String>>(0)?.unwrap_or_default();
            let key = ctx.get::<Option<String>>(1)?.unwrap_or_default();
            Ok(tag_value(&tags, &key))
        })?;

        let hosts = AssertUnwindSafe(Arc::clone(&self.hosts));
        conn.create_scalar_function("max_hosts", 1, volatile, move |ctx| {
            Ok(match ctx.get::<Option<String>>(0)? {
                None => "0".to_string(),
                Some(list) => hosts.max_hosts(&list).to_string(),
            })
        })?;

        conn.create_scalar_function("common_cve", 2, pure, |ctx| {
            let a = text_arg(ctx, 0, "common_cve", "first list")?;
            let b = text_arg(ctx, 1, "common_cve", "second list")?;
            Ok(common_cve(&a, &b))
        })?;

        let clock = AssertUnwindSafe(Arc::clone(&self.clock));
        conn.create_scalar_function("current_offset", 1, volatile, move |ctx| {
            let zone = ctx.get::<Option<String>>(0)?.unwrap_or_default();
            Ok(clock.current_offset(&zone))
        })?;

        let domain = AssertUnwindSafe(Arc::clone(&self.domain));
        conn.create_scalar_function("task_trend", 2, volatile, move |ctx| {
            let task = TaskId(ctx.get::<Option<i64>>(0)?.unwrap_or(0));
            let overrides = ctx.get::<Option<i64>>(1)?.unwrap_or(0) != 0;
            if task.is_none() {
                return Ok(String::new());
            }
            Ok(domain.trend(task, overrides).as_str().to_string())
        })?;

        let domain = AssertUnwindSafe(Arc::clone(&self.domain));
        conn.create_scalar_function("threat_level", 2, volatile, move |ctx| {
            let task = TaskId(ctx.get::<Option<i64>>(0)?.unwrap_or(0));
            let overrides = ctx.get::<Option<i64>>(1)?.unwrap_or(0) != 0;
            if task.is_none() {
                return Ok(String::new());
            }
            Ok(match domain.threat_level(task, overrides) {
                Some(level) => level.as_str().to_string(),
                // No computed threat: a task with a report has the literal
                // "None", a task with no reports at all has no level yet.
                None if domain.last_report(task).is_some() => "None".to_string(),
                None => String::new(),
            })
        })?;

        let domain = AssertUnwindSafe(Arc::clone(&self.domain));
        conn.create_scalar_function("run_status_name", 1, volatile, move |ctx| {
            let status = ctx.get::<Option<i64>>(0)?.unwrap_or(0);
            Ok(domain.run_status_name(status))
        })?;

        trace!("scalar functions installed");
        Ok(())
    }
}

/// Trimmed-token membership test over a comma-separated host list.
pub fn hosts_contains(hosts: &str, host: &str) -> bool {
    let needle = host.trim();
    hosts.split(',').any(|token| token.trim() == needle)
}

/// Look up `key` in a pipe-delimited `key=value` tag blob. Keys match by
/// exact prefix plus `=`; `|` and `=` are not escapable inside values (an
/// accepted format limitation). Empty string when the key is missing.
pub fn tag_value(tags: &str, key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    for segment in tags.split('|') {
        if let Some(value) = segment.strip_prefix(key) {
            if let Some(value) = value.strip_prefix('=') {
                return value.to_string();
            }
        }
    }
    String::new()
}

/// True when any identifier of list `a` trim-equals any identifier of list
/// `b`. Short-circuits on the first match; duplicates are irrelevant since
/// only existence is reported.
pub fn common_cve(a: &str, b: &str) -> bool {
    for outer in a.split(',') {
        let outer = outer.trim();
        for inner in b.split(',') {
            if outer == inner.trim() {
                return true;
            }
        }
    }
    false
}

/// `uniquify(type, name, owner, suffix)` — first free name of the form
/// `"{name}{suffix} {n}"`, n = 1, 2, …, under the `{type}s` table and the
/// owner-visibility rule (`owner IS NULL OR owner = :owner`).
///
/// The existence probe is a plain read on the invoking connection, so it can
/// never deadlock against the statement that called it. It is race-free only
/// within whatever transaction the caller already holds — this function adds
/// no atomicity of its own.
fn uniquify(ctx: &Context<'_>) -> Result<String, rusqlite::Error> {
    let kind = text_arg(ctx, 0, "uniquify", "type")?;
    let proposed = text_arg(ctx, 1, "uniquify", "name")?;
    let owner = ctx.get::<Option<i64>>(2)?;
    let suffix = ctx.get::<Option<String>>(3)?.unwrap_or_default();

    if !is_identifier(&kind) {
        return Err(user_err("uniquify", format!("invalid type {kind:?}")));
    }
    // Table name follows the daemon-wide convention: the logical type
    // pluralized with a trailing "s".
    let probe = format!(
        "SELECT count(*) FROM {kind}s WHERE name = ?1 AND (owner IS NULL OR owner = ?2)"
    );

    // SAFETY: the probe is a read-only SELECT on the connection currently
    // evaluating this function; no statement state is modified through it.
    let conn = unsafe { ctx.get_connection()? };
    let mut n: i64 = 1;
    loop {
        let candidate = format!("{proposed}{suffix} {n}");
        let count: i64 =
            conn.query_row(&probe, rusqlite::params![candidate, owner], |row| row.get(0))?;
        if count == 0 {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn text_arg(
    ctx: &Context<'_>,
    i: usize,
    function: &'static str,
    name: &str,
) -> Result<String, rusqlite::Error> {
    ctx.get::<Option<String>>(i)?
        .ok_or_else(|| user_err(function, format!("{name} argument is NULL")))
}

fn user_err(function: &'static str, message: String) -> rusqlite::Error {
    rusqlite::Error::UserFunctionError(Box::new(StoreError::function(function, message)))
}
