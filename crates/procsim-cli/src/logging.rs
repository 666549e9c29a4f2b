//! # procsim-cli::logging
//!
//! A `tracing_subscriber::FormatEvent` that tags every line with the elapsed
//! wall-clock time and, when present, the replication number the event fired
//! during -- the CLI's view into replication boundaries and dispatch
//! warnings without a GUI to render them in.

use std::fmt;
use tracing::field::Field;
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    fmt::{format::Writer, FormatEvent, FormatFields},
    registry::LookupSpan,
};

pub struct SimulationFormatter {
    timer: std::time::Instant,
}

impl SimulationFormatter {
    pub fn new() -> Self {
        Self { timer: std::time::Instant::now() }
    }

    fn extract_replication_number(event: &Event) -> Option<u32> {
        let mut visitor = ReplicationNumberExtractor::default();
        event.record(&mut visitor);
        visitor.replication_number
    }
}

impl Default for SimulationFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct ReplicationNumberExtractor {
    replication_number: Option<u32>,
}

impl tracing::field::Visit for ReplicationNumberExtractor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "replication_number" {
            self.replication_number = Some(value as u32);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if field.name() == "replication_number" && value >= 0 {
            self.replication_number = Some(value as u32);
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
    fn record_str(&mut self, _field: &Field, _value: &str) {}
    fn record_bool(&mut self, _field: &Field, _value: bool) {}
    fn record_error(&mut self, _field: &Field, _value: &(dyn std::error::Error + 'static)) {}
}

impl<S, N> FormatEvent<S, N> for SimulationFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let elapsed = self.timer.elapsed();
        let metadata = event.metadata();
        let replication_number = Self::extract_replication_number(event);

        write!(writer, "\x1b[90m[{:>8.3}s]\x1b[0m ", elapsed.as_secs_f64())?;

        let level = metadata.level();
        let level_color = match *level {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            tracing::Level::DEBUG => "\x1b[34m",
            tracing::Level::TRACE => "\x1b[90m",
        };
        write!(writer, "{}[{:>5}]\x1b[0m ", level_color, level)?;

        if let Some(rep) = replication_number {
            write!(writer, "\x1b[35m[rep {}]\x1b[0m ", rep)?;
        }

        let target = metadata.target();
        if !target.starts_with(env!("CARGO_PKG_NAME")) {
            write!(writer, "\x1b[90m[{}]\x1b[0m ", target)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
