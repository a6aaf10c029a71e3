//! Cross-crate end-to-end tests for the binlog codec workspace.

pub mod binlog;
pub mod gtid;
