//! # procsim-engine::stats
//!
//! Statistics beyond a single `Variable`'s within-replication running
//! moments (which `variable::Variable` already covers, including batch
//! means): across-replication aggregation, interval (snapshot-delta)
//! responses, and level-crossing responses.

pub mod across_rep;
pub mod batching;
pub mod interval;
pub mod level;
