//! # procsim-engine::telemetry
//!
//! The observability subsystem: structured `tracing` events for the human
//! operator, and a `TraceWriter`-backed `Observer` that turns every
//! `Variable::set_value` into a `TraceRow` for the CSV trace file (spec's
//! External Interfaces). Grounded in the teacher's `TelemetryBus`, stripped
//! of the TUI snapshot channel and metrics-exporter wiring this model has no
//! use for (no GUI, no Prometheus consumer).

use crate::variable::Observer;
use procsim_types::time::SimTime;
use procsim_types::trace::{TraceRow, TraceWriter};

/// Bridges `Variable` change notifications into a `TraceWriter`, tagging
/// every row with the model/element names and replication number the
/// variable doesn't know about itself.
pub struct TraceObserver {
    model_id: u32,
    model_name: String,
    replication_number: u32,
    element_name: String,
    writer: Option<Box<dyn TraceWriter + Send>>,
}

impl TraceObserver {
    pub fn new(model_id: u32, model_name: impl Into<String>, writer: Option<Box<dyn TraceWriter + Send>>) -> Self {
        Self {
            model_id,
            model_name: model_name.into(),
            replication_number: 0,
            element_name: String::new(),
            writer,
        }
    }

    pub fn set_replication_number(&mut self, n: u32) {
        self.replication_number = n;
    }

    /// Sets the element name attributed to the next batch of observations.
    /// Called by the engine immediately before it touches a given
    /// `Variable`, since `Variable` itself doesn't know its owning element's
    /// display name.
    pub fn set_current_element(&mut self, name: &str) {
        self.element_name = name.to_string();
    }

    /// Writes one row of the end-of-replication statistics summary, a no-op
    /// if no writer was configured.
    pub fn write_summary(&mut self, row: &procsim_types::trace::SummaryRow) -> std::io::Result<()> {
        let Some(writer) = self.writer.as_mut() else { return Ok(()) };
        writer.write_summary(row)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        let Some(writer) = self.writer.as_mut() else { return Ok(()) };
        writer.flush()
    }
}

impl Observer for TraceObserver {
    fn on_observe(&mut self, time: SimTime, previous_value: f64, new_value: f64, weight: f64) {
        let Some(writer) = self.writer.as_mut() else { return };
        let row = TraceRow {
            model_id: self.model_id,
            model_name: self.model_name.clone(),
            element_name: self.element_name.clone(),
            time,
            previous_value,
            new_value,
            weight,
            previous_time: time - weight,
            replication_number: self.replication_number,
        };
        if let Err(err) = writer.write_row(&row) {
            tracing::warn!(error = %err, "failed to write trace row");
        }
    }
}

/// A CSV-backed `TraceWriter`, grounded in the teacher's preference for
/// structured, greppable output over ad hoc string formatting.
pub struct CsvTraceWriter<W: std::io::Write> {
    rows: csv::Writer<W>,
    summary: csv::Writer<W>,
}

mod csv {
    //! A minimal CSV writer. Kept in-crate rather than pulling in the `csv`
    //! crate, since the schema here is two fixed, small record shapes and
    //! doesn't need that crate's full dialect support.
    use std::io::{self, Write};

    pub struct Writer<W: Write> {
        inner: W,
        wrote_header: bool,
    }

    impl<W: Write> Writer<W> {
        pub fn new(inner: W) -> Self {
            Self { inner, wrote_header: false }
        }

        pub fn write_record(&mut self, header: &[&str], fields: &[String]) -> io::Result<()> {
            if !self.wrote_header {
                writeln!(self.inner, "{}", header.join(","))?;
                self.wrote_header = true;
            }
            writeln!(self.inner, "{}", fields.join(","))
        }

        pub fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }
}

impl<W: std::io::Write> CsvTraceWriter<W> {
    pub fn new(trace_sink: W, summary_sink: W) -> Self {
        Self {
            rows: csv::Writer::new(trace_sink),
            summary: csv::Writer::new(summary_sink),
        }
    }
}

const TRACE_HEADER: &[&str] = &[
    "modelId",
    "modelName",
    "elementName",
    "time",
    "previousValue",
    "newValue",
    "weight",
    "previousTime",
    "replicationNumber",
];

const SUMMARY_HEADER: &[&str] = &["Model", "StatType", "Element", "Count", "Mean", "StdDev", "Min", "Max"];

impl<W: std::io::Write + Send> TraceWriter for CsvTraceWriter<W> {
    fn write_row(&mut self, row: &TraceRow) -> std::io::Result<()> {
        self.rows.write_record(
            TRACE_HEADER,
            &[
                row.model_id.to_string(),
                row.model_name.clone(),
                row.element_name.clone(),
                row.time.to_string(),
                row.previous_value.to_string(),
                row.new_value.to_string(),
                row.weight.to_string(),
                row.previous_time.to_string(),
                row.replication_number.to_string(),
            ],
        )
    }

    fn write_summary(&mut self, row: &procsim_types::trace::SummaryRow) -> std::io::Result<()> {
        self.summary.write_record(
            SUMMARY_HEADER,
            &[
                row.model_name.clone(),
                row.stat_type.clone(),
                row.element_name.clone(),
                row.count.to_string(),
                row.mean.to_string(),
                row.std_dev.to_string(),
                row.minimum.to_string(),
                row.maximum.to_string(),
            ],
        )
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.rows.flush()?;
        self.summary.flush()
    }
}
