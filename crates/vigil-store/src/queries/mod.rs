//! Table query modules.
//!
//! SQL in these modules is the invocation surface for the scalar functions —
//! `make_uuid()`, `uniquify()`, `clean_hosts()`, `now()` and friends appear
//! in the statement text and run inside the engine.

pub mod credentials;
pub mod tasks;
