//! # procsim-engine::errors
//!
//! Internal error types for the engine. Runtime operations on the model
//! return `procsim_types::errors::SimError`; this module adds the errors
//! specific to turning a declarative `Experiment` into a runnable `Model`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WiringError {
    #[error("network validation failed: {0}")]
    Invalid(String),
    #[error("duplicate element name '{0}'")]
    DuplicateName(String),
    #[error("unknown element name '{0}'")]
    UnknownName(String),
}
