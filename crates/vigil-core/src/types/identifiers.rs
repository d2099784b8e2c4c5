//! Typed row identifiers.
//!
//! SQLite rowids are plain i64; these newtypes keep a task id from being
//! passed where a report id belongs. 0 is the daemon-wide "no row" sentinel.

use serde::{Deserialize, Serialize};

/// Rowid of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub i64);

/// Rowid of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub i64);

impl TaskId {
    /// True for the "no task" sentinel.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<i64> for TaskId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

impl From<i64> for ReportId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}
