//! # procsim-cli::wiring
//!
//! Loads an `Experiment` from a scenario file on disk and hands it to
//! `procsim_engine::wiring::build_model` -- the CLI's only job here is
//! picking the right deserializer for the file extension and resolving the
//! effective seed/replication count (CLI flags override the scenario file).

use anyhow::{anyhow, Result};
use procsim_types::scenario::Experiment;
use rand::Rng;
use std::path::Path;

pub fn load_experiment(path: &Path) -> Result<Experiment> {
    let content = std::fs::read_to_string(path)?;
    let experiment: Experiment = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => return Err(anyhow!("unsupported scenario file extension: {}", path.display())),
    };
    experiment.validate().map_err(|e| anyhow!(e))?;
    Ok(experiment)
}

/// Generates a seed if the scenario file doesn't supply one.
pub fn resolve_seed(scenario_seed: Option<u64>) -> u64 {
    scenario_seed.unwrap_or_else(|| rand::thread_rng().gen())
}
