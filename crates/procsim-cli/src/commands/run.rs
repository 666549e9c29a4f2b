//! # procsim-cli::commands::run
//!
//! Implements the `run` subcommand: loads a scenario, wires it into a
//! `Model`, runs every replication, and writes the per-observation trace and
//! end-of-replication summary CSVs the scenario opted into.

use crate::{args::RunOpts, logging::SimulationFormatter, wiring};
use anyhow::Result;
use procsim_engine::prelude::*;
use procsim_types::trace::SummaryRow;
use std::collections::HashMap;
use std::fs::File;
use tracing_subscriber::prelude::*;

pub fn exec(opts: RunOpts) -> Result<()> {
    let mut experiment = wiring::load_experiment(&opts.scenario)?;
    if let Some(seed) = opts.seed {
        experiment.seed = Some(seed);
    }
    if let Some(replications) = opts.replications {
        experiment.num_replications = replications;
    }
    let seed = wiring::resolve_seed(experiment.seed);
    experiment.seed = Some(seed);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(SimulationFormatter::new())
                .with_ansi(true),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Running experiment '{}' with seed {}", experiment.name, seed);

    let model = build_model(&experiment)?;
    let batch_plan = BatchPlan::default();
    let plan = ReplicationPlan {
        replication_length: experiment.replication_length,
        warm_up_length: experiment.warm_up_length,
        batch_interval: Some(batch_plan.batch_interval(experiment.replication_length, experiment.warm_up_length)),
    };

    let writer: Option<Box<dyn TraceWriter + Send>> = match (&opts.trace, &opts.summary) {
        (None, None) => None,
        (trace, summary) => {
            let trace_sink = File::create(trace.clone().unwrap_or_else(|| "trace.csv".into()))?;
            let summary_sink = File::create(summary.clone().unwrap_or_else(|| "summary.csv".into()))?;
            Some(Box::new(CsvTraceWriter::new(trace_sink, summary_sink)))
        }
    };
    let trace_observer = TraceObserver::new(0, experiment.name.clone(), writer);
    let mut sim = Simulation::new(model, plan, trace_observer);

    let mut across_rep: HashMap<String, AcrossReplicationStats> = HashMap::new();

    sim.run_experiment(experiment.num_replications as u32, |sim, replication_number| {
        for resource in &sim.model().resources {
            let summary = resource.utilization_summary();
            let row = SummaryRow {
                model_name: format!("{} (rep {})", experiment.name, replication_number),
                stat_type: "utilization".to_string(),
                element_name: resource.name().to_string(),
                count: summary.count,
                mean: summary.mean,
                std_dev: summary.std_dev,
                minimum: summary.min,
                maximum: summary.max,
            };
            if let Err(err) = sim.trace_writer().write_summary(&row) {
                tracing::warn!(%err, "failed to write summary row");
            }
            across_rep
                .entry(resource.name().to_string())
                .or_insert_with(|| AcrossReplicationStats::new(resource.name()))
                .record(summary.mean);
        }
    })?;
    sim.trace_writer().flush()?;

    println!("Completed {} replication(s):", experiment.num_replications);
    for resource in &sim.model().resources {
        let summary = resource.utilization_summary();
        println!(
            "  resource '{}': mean utilization {:.3} (n={}, min={:.3}, max={:.3})",
            resource.name(),
            summary.mean,
            summary.count,
            summary.min,
            summary.max
        );
        if let Some(stats) = across_rep.get(resource.name()) {
            match stats.half_width(0.95) {
                Some(hw) => println!(
                    "    across {} replication(s): mean {:.3} +/- {:.3} (95% CI)",
                    stats.count(),
                    stats.mean(),
                    hw
                ),
                None => println!(
                    "    across {} replication(s): mean {:.3} (need >= 2 replications for a CI)",
                    stats.count(),
                    stats.mean()
                ),
            }
        }
    }

    Ok(())
}
