//! # procsim-types::trace
//!
//! The `TraceWriter` trait and the row/summary shapes it writes, per spec §6
//! (External Interfaces). Concrete CSV writers live in
//! `procsim_engine::telemetry`; this crate only fixes the schema so that
//! `procsim-cli` can refer to it without depending on the engine's writer
//! internals.

use crate::time::SimTime;
use serde::Serialize;

/// One observation of a `Variable`'s `set_value`, the unit of a trace file.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRow {
    pub model_id: u32,
    pub model_name: String,
    pub element_name: String,
    pub time: SimTime,
    pub previous_value: f64,
    pub new_value: f64,
    pub weight: f64,
    pub previous_time: SimTime,
    pub replication_number: u32,
}

/// One row of the end-of-replication statistics summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub model_name: String,
    pub stat_type: String,
    pub element_name: String,
    pub count: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub minimum: f64,
    pub maximum: f64,
}

/// A sink for simulation trace rows and end-of-run summaries.
pub trait TraceWriter {
    fn write_row(&mut self, row: &TraceRow) -> std::io::Result<()>;
    fn write_summary(&mut self, row: &SummaryRow) -> std::io::Result<()>;
    fn flush(&mut self) -> std::io::Result<()>;
}
