//! Binlog event codec core: event framing, streaming payload
//! compression, and GTID set algebra.

pub mod compression;
pub mod events;
pub mod gtid;
