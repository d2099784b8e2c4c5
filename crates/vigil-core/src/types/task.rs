//! Task summary values surfaced into query results by the scalar functions.

use serde::{Deserialize, Serialize};

/// Direction a task's findings are moving between its last two reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    More,
    Less,
    Same,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::More => "more",
            Self::Less => "less",
            Self::Same => "same",
        }
    }
}

/// Highest severity class among a report's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatLevel {
    High,
    Medium,
    Low,
    Log,
    Debug,
    False,
}

impl ThreatLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Log => "Log",
            Self::Debug => "Debug",
            Self::False => "False",
        }
    }
}

/// Lifecycle state of a scan task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    DeleteRequested,
    Done,
    New,
    Paused,
    Requested,
    Running,
    StopRequested,
    Stopped,
    InternalError,
}

impl RunStatus {
    /// Decode the integer stored in the `run_status` column.
    /// Unknown values map to `InternalError` rather than failing the row.
    pub fn from_i64(v: i64) -> Self {
        match v {
            0 => Self::DeleteRequested,
            1 => Self::Done,
            2 => Self::New,
            3 => Self::Paused,
            4 => Self::Requested,
            5 => Self::Running,
            6 => Self::StopRequested,
            7 => Self::Stopped,
            _ => Self::InternalError,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Self::DeleteRequested => 0,
            Self::Done => 1,
            Self::New => 2,
            Self::Paused => 3,
            Self::Requested => 4,
            Self::Running => 5,
            Self::StopRequested => 6,
            Self::Stopped => 7,
            Self::InternalError => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DeleteRequested => "Delete Requested",
            Self::Done => "Done",
            Self::New => "New",
            Self::Paused => "Paused",
            Self::Requested => "Requested",
            Self::Running => "Running",
            Self::StopRequested => "Stop Requested",
            Self::Stopped => "Stopped",
            Self::InternalError => "Internal Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_roundtrip() {
        for v in 0..=7 {
            assert_eq!(RunStatus::from_i64(v).as_i64(), v);
        }
    }

    #[test]
    fn unknown_status_is_internal_error() {
        assert_eq!(RunStatus::from_i64(99), RunStatus::InternalError);
        assert_eq!(RunStatus::from_i64(99).name(), "Internal Error");
    }
}
