//! Capability traits injected into the scalar-function registry.
//!
//! The SQL layer never reaches into the scheduler, report computation, or
//! credential decryption directly. Those subsystems hand it these trait
//! objects at setup time, which keeps the registry testable without a live
//! daemon.

use chrono::{FixedOffset, Local, Offset, Utc};
use tracing::warn;

use crate::types::identifiers::{ReportId, TaskId};
use crate::types::task::{ThreatLevel, Trend};

/// Task-domain computations surfaced into SQL results.
///
/// `overrides` selects whether user severity overrides are applied when
/// computing trend and threat level.
pub trait TaskDomain: Send + Sync {
    fn trend(&self, task: TaskId, overrides: bool) -> Trend;
    fn threat_level(&self, task: TaskId, overrides: bool) -> Option<ThreatLevel>;
    fn last_report(&self, task: TaskId) -> Option<ReportId>;
    fn run_status_name(&self, status: i64) -> String;
}

/// Per-row credential decryption hook attached to a cursor.
///
/// `flush` drains buffered decrypted values for the row just consumed, so
/// stale plaintext never leaks into the next row. `release` is called exactly
/// once during cursor cleanup.
pub trait CryptContext {
    fn flush(&mut self);
    fn release(&mut self);
}

/// Host-list canonicalization and sizing, provided by the scan subsystem.
pub trait HostOracle: Send + Sync {
    /// Canonicalize a comma-separated host list.
    fn clean_hosts(&self, hosts: &str) -> String;
    /// Estimate the number of addresses a host list expands to.
    fn max_hosts(&self, hosts: &str) -> i64;
}

/// Wall-clock access, injectable so time-dependent SQL is testable.
pub trait ClockOracle: Send + Sync {
    /// Current epoch seconds.
    fn now(&self) -> i64;
    /// Offset from UTC in seconds, right now, for the given zone text.
    fn current_offset(&self, zone: &str) -> i64;
}

/// Default clock backed by the system time.
///
/// Zone handling is deliberately narrow: the empty string and "UTC" are zero,
/// numeric forms ("+02:00", "-0500", "UTC+2") are decoded, anything else
/// falls back to the process-local offset. Daemons wanting full zone-database
/// lookups inject their own `ClockOracle`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockOracle for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn current_offset(&self, zone: &str) -> i64 {
        let zone = zone.trim();
        if zone.is_empty() || zone.eq_ignore_ascii_case("utc") {
            return 0;
        }
        if let Some(offset) = parse_numeric_offset(zone) {
            return i64::from(offset.local_minus_utc());
        }
        warn!(zone, "unknown timezone text, using process-local offset");
        i64::from(Local::now().offset().fix().local_minus_utc())
    }
}

/// Decode "+HH:MM", "+HHMM", "+HH", optionally prefixed with "UTC"/"GMT".
fn parse_numeric_offset(zone: &str) -> Option<FixedOffset> {
    let rest = zone
        .strip_prefix("UTC")
        .or_else(|| zone.strip_prefix("GMT"))
        .unwrap_or(zone);
    let (sign, digits) = match rest.as_bytes().first()? {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };
    let digits = digits.replace(':', "");
    if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = if digits.len() <= 2 {
        (digits.parse::<i32>().ok()?, 0)
    } else {
        let split = digits.len() - 2;
        (
            digits[..split].parse::<i32>().ok()?,
            digits[split..].parse::<i32>().ok()?,
        )
    };
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
