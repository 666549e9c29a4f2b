//! # procsim-cli::commands::validate
//!
//! Implements the `validate` subcommand.

use crate::wiring;
use anyhow::Result;
use std::path::PathBuf;

pub fn exec(path: PathBuf) -> Result<()> {
    println!("Validating scenario: {:?}", path);
    let experiment = wiring::load_experiment(&path)?;
    println!("Scenario '{}' is valid.", experiment.name);
    Ok(())
}
