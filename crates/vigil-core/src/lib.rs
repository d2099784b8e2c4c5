//! # vigil-core
//!
//! Foundation crate for the vigil scan manager.
//! Defines shared types, capability traits, errors, config, and the tracing
//! bootstrap. Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

// Re-export the most commonly used items at the crate root.
pub use config::StoreConfig;
pub use errors::error_code::VigilErrorCode;
pub use errors::StoreError;
pub use traits::domain::{ClockOracle, CryptContext, HostOracle, SystemClock, TaskDomain};
pub use types::identifiers::{ReportId, TaskId};
pub use types::task::{RunStatus, ThreatLevel, Trend};
