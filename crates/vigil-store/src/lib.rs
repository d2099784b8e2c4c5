//! # vigil-store
//!
//! SQLite persistence layer for the vigil scan manager.
//! Single write connection, WAL mode, contention-retry statement runner,
//! lazy row cursors, domain scalar functions pushed down into the engine,
//! and `PRAGMA user_version` schema migrations.
//!
//! Callers submit SQL through the runner (fire-and-forget writes/DDL) or a
//! cursor (queries); the registered scalar functions are invoked by SQLite
//! itself while evaluating that SQL, e.g.
//! `SELECT task_trend(id, 1) FROM tasks`.

pub mod connection;
pub mod cursor;
pub mod functions;
pub mod migrations;
pub mod queries;
pub mod quote;
pub mod runner;

pub use connection::Database;
pub use cursor::Cursor;
pub use functions::FunctionRegistry;
pub use runner::RetryPolicy;
