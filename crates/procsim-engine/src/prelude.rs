//! # procsim-engine::prelude
//!
//! A convenience module re-exporting the most commonly used types, for other
//! crates in the workspace (chiefly `procsim-cli`) to pull in with one `use`.

pub use crate::{
    counter::Counter,
    entity::{Entity, EntityType},
    errors::WiringError,
    executive::{Event, EventDiscriminant, Executive},
    ids::IdGen,
    model::{ElementBase, Model, ModelCtx, ModelElement},
    nhpp::{CycleMode, PiecewiseRateFunction, RateSegment},
    queue::{Queue, QueueDiscipline},
    receiver::{Activity, Generator},
    resource::{Allocation, Resource, ResourceSet, SelectionRule},
    rng::Variate,
    simulation::{ReplicationPlan, ResponseSchedule, Simulation},
    stats::across_rep::AcrossReplicationStats,
    stats::batching::BatchPlan,
    telemetry::{CsvTraceWriter, TraceObserver},
    variable::{Observer, Summary, Variable, VariableKind},
    wiring::build_model,
};

pub use procsim_types::{
    self,
    errors::*,
    id::*,
    rate::RateFunction,
    scenario::*,
    time::*,
    trace::{TraceRow, TraceWriter},
    variate::RandomSource,
};
