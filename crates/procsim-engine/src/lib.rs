//! # procsim-engine
//!
//! The core of the procsim simulation kernel. This crate contains the event
//! executive, the process-view model-element tree (generators, activities,
//! resources, queues, entities), the statistics layer, and the telemetry
//! pipeline.

// NOTE: a small amount of unsafe code bridges `ModelCtx` to the owning
// `Simulation`, the same raw-pointer pattern the teacher this crate is
// descended from uses for its `EngineCtx`. Every unsafe block is documented
// with the invariant it relies on.

pub mod counter;
pub mod entity;
pub mod errors;
pub mod executive;
pub mod ids;
pub mod model;
pub mod nhpp;
pub mod prelude;
pub mod queue;
pub mod receiver;
pub mod resource;
pub mod rng;
pub mod simulation;
pub mod stats;
pub mod telemetry;
pub mod variable;
pub mod wiring;
