//! Capability traits consumed by the storage layer.

pub mod domain;
