//! Storage-layer errors for SQLite operations.
//!
//! Contention (busy/locked) is consumed by the retry loops in vigil-store and
//! never appears here. `Fatal` marks invalid internal state — a corrupted
//! statement, an exhausted-cursor read, an arity violation — and must never
//! be treated as an empty result by callers.

use super::error_code::{self, VigilErrorCode};

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    /// Unrecoverable internal state. The connection or statement is no longer
    /// trustworthy; the host process decides whether to exit.
    #[error("fatal storage state: {context}")]
    Fatal { context: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("scalar function {function}: {message}")]
    Function { function: String, message: String },
}

impl StoreError {
    /// Shorthand for the fatal variant.
    pub fn fatal(context: impl Into<String>) -> Self {
        Self::Fatal {
            context: context.into(),
        }
    }

    /// Shorthand for a scalar-function error reported back to the engine.
    pub fn function(function: &str, message: impl Into<String>) -> Self {
        Self::Function {
            function: function.to_string(),
            message: message.into(),
        }
    }

    /// True for the unrecoverable tier. Callers seeing this must not retry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite {
            message: e.to_string(),
        }
    }
}

impl VigilErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => error_code::SQLITE_ERROR,
            Self::Fatal { .. } => error_code::FATAL,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::Function { .. } => error_code::FUNCTION_ERROR,
        }
    }
}
