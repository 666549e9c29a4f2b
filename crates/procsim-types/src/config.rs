//! # procsim-types::config
//!
//! Defines strongly-typed structs for configuration, mirroring the structure
//! of the model/scenario files. These types are used by `serde` to parse
//! TOML/YAML into safe, usable Rust objects, then turned into concrete
//! `RandomSource` instances by `procsim_engine::variate`.

use serde::{Deserialize, Serialize};

/// A wrapper for the RNG seed to make its purpose clear.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngSeed(pub u64);

/// A declarative specification of a probability distribution, as it appears
/// in a model configuration file. The engine turns each `DistSpec` into a
/// concrete `RandomSource` bound to its own RNG substream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistSpec {
    /// Always returns the same value. The distinguished constant-value
    /// variate required by spec §6.
    Constant(f64),
    Uniform { lo: f64, hi: f64 },
    Exponential { mean: f64 },
    Normal { mean: f64, std_dev: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    /// Bernoulli(p): probability `p` of returning `1.0`, else `0.0`.
    Bernoulli { p: f64 },
    /// A categorical distribution over `0..weights.len()`, returned as an
    /// index cast to `f64`.
    Discrete { weights: Vec<f64> },
}

/// A specification for a Bernoulli trial (a coin flip), used outside the
/// `DistSpec` enum by selection rules and probabilistic senders that need
/// just the probability, not a full variate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BernoulliSpec(pub f64);
