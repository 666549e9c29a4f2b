//! # procsim-types::errors
//!
//! Defines the common error types used throughout the procsim workspace.
//! Using `thiserror` provides clean, descriptive error handling. All error
//! variants must have a deterministic `Debug` implementation for reproducibility.

use crate::id::{ElementId, EntityId, QueueId, ResourceId};
use thiserror::Error;

/// The core error type produced by the simulation kernel. Every operation
/// that can fail per spec §7 returns `Result<_, SimError>`.
#[derive(Error, Debug, Clone)]
pub enum SimError {
    /// Numeric value out of its admissible range, a null where non-null is
    /// required, or an unknown attribute name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Modifying an event already scheduled; changing a queue's discipline
    /// mid-replication; releasing a resource the entity never seized;
    /// disposing an entity with live allocations.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A delay with `DelayOption::None`, a seize with no seize requirements,
    /// or a send with `SendOption::None` at a receiver holding an entity.
    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    /// Inter-event generation beyond a rate function's range with no repeat
    /// and no last rate configured; allocating more than a resource's capacity.
    #[error("range exceeded: {0}")]
    RangeExceeded(String),

    /// `set_value` was called again from inside an in-progress notification
    /// chain for the same variable.
    #[error("observer reentry on variable '{0}'")]
    ObserverReentry(String),

    #[error("element with id {0} not found")]
    ElementNotFound(ElementId),
    #[error("entity with id {0} not found")]
    EntityNotFound(EntityId),
    #[error("resource with id {0} not found")]
    ResourceNotFound(ResourceId),
    #[error("queue with id {0} not found")]
    QueueNotFound(QueueId),
}

/// An error related to parsing or validating a scenario/model configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("validation error in model '{name}': {message}")]
    Validation { name: String, message: String },
}
