//! # procsim-types::id
//!
//! Defines the core identifier types used throughout the simulation.
//! Using distinct types for different kinds of IDs helps prevent bugs where,
//! for example, a `ResourceId` might be accidentally used as a `QueueId`.
//! All of them are generated by a per-`Model` `IdGen` (see
//! `procsim_engine::ids`), never by a process-wide global, so that two
//! independently-constructed models never collide and a replayed experiment
//! gets identical ids every run.

/// A unique identifier for a scheduled event in the executive's master queue.
pub type EventId = u64;

/// A unique identifier for a node in the model-element tree.
pub type ElementId = u32;

/// A unique identifier for an `Entity` flowing through the model.
pub type EntityId = u64;

/// A unique identifier for an `EntityType`.
pub type EntityTypeId = u32;

/// A unique identifier for a `Resource`.
pub type ResourceId = u32;

/// A unique identifier for a `Request` pending on a resource.
pub type RequestId = u64;

/// A unique identifier for an `Allocation` record.
pub type AllocationId = u64;

/// A unique identifier for a `Queue`.
pub type QueueId = u32;

/// A unique identifier for a named RNG stream (see `RandomSource::stream_id`).
pub type StreamId = u32;
