//! Shared test fixtures: stub capabilities and store constructors.

// Each integration test binary compiles this module; not every binary uses
// every fixture.
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use vigil_core::{
    ClockOracle, CryptContext, HostOracle, ReportId, RunStatus, TaskDomain, TaskId, ThreatLevel,
    Trend,
};
use vigil_store::{Database, FunctionRegistry};

/// Task domain with canned answers.
pub struct StubDomain {
    pub threat: Option<ThreatLevel>,
    /// Tasks that have at least one report.
    pub reported: Vec<i64>,
}

impl Default for StubDomain {
    fn default() -> Self {
        Self {
            threat: Some(ThreatLevel::High),
            reported: vec![],
        }
    }
}

impl TaskDomain for StubDomain {
    fn trend(&self, _task: TaskId, _overrides: bool) -> Trend {
        Trend::Same
    }

    fn threat_level(&self, _task: TaskId, _overrides: bool) -> Option<ThreatLevel> {
        self.threat
    }

    fn last_report(&self, task: TaskId) -> Option<ReportId> {
        self.reported.contains(&task.0).then_some(ReportId(1))
    }

    fn run_status_name(&self, status: i64) -> String {
        RunStatus::from_i64(status).name().to_string()
    }
}

/// Host oracle that trims tokens and counts them.
pub struct StubHosts;

impl HostOracle for StubHosts {
    fn clean_hosts(&self, hosts: &str) -> String {
        hosts
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn max_hosts(&self, hosts: &str) -> i64 {
        hosts.split(',').filter(|t| !t.trim().is_empty()).count() as i64
    }
}

/// Clock pinned to a fixed instant.
pub struct FixedClock {
    pub now: i64,
    pub offset: i64,
}

impl ClockOracle for FixedClock {
    fn now(&self) -> i64 {
        self.now
    }

    fn current_offset(&self, _zone: &str) -> i64 {
        self.offset
    }
}

pub const FIXED_NOW: i64 = 1_700_000_000;

/// Registry wired to the stubs above.
pub fn stub_registry(domain: StubDomain) -> FunctionRegistry {
    FunctionRegistry::new(
        Arc::new(domain),
        Arc::new(StubHosts),
        Arc::new(FixedClock {
            now: FIXED_NOW,
            offset: 4711,
        }),
    )
}

/// In-memory store with stub capabilities and the v1 schema.
pub fn open_test_db() -> Database {
    vigil_core::tracing::init_tracing();
    Database::open_in_memory(&stub_registry(StubDomain::default())).unwrap()
}

/// Decrypt hook that counts its lifecycle calls.
pub struct RecordingCrypt {
    pub flushes: Rc<Cell<u32>>,
    pub releases: Rc<Cell<u32>>,
}

impl CryptContext for RecordingCrypt {
    fn flush(&mut self) {
        self.flushes.set(self.flushes.get() + 1);
    }

    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}
