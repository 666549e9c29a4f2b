//! # procsim-types::scenario
//!
//! Defines the Rust structs that map directly to the model/experiment DSL
//! (YAML/TOML). This is the authoritative schema for declaring a queueing
//! network and the replication plan to run it under, the direct analogue of
//! the teacher's `Scenario`/`Directive`/`Action` schema for fault scenarios.

use crate::config::DistSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The top-level structure for an experiment definition file.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Experiment {
    pub name: String,
    pub seed: Option<u64>,
    pub num_replications: usize,
    pub replication_length: f64,
    #[serde(default)]
    pub warm_up_length: f64,
    pub network: NetworkSpec,
}

impl Experiment {
    /// Validates the experiment for logical consistency: every route target
    /// must name a declared element, resource sets must be non-empty and
    /// reference declared resources, and the replication plan must make sense.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_replications == 0 {
            return Err("num_replications must be at least 1".to_string());
        }
        if !(self.replication_length > 0.0) {
            return Err("replication_length must be positive".to_string());
        }
        if self.warm_up_length < 0.0 || self.warm_up_length >= self.replication_length {
            return Err("warm_up_length must be in [0, replication_length)".to_string());
        }
        self.network.validate()
    }
}

/// A declarative queueing network: a set of named resources, optional
/// resource sets pooling them under a selection rule, entity generators, and
/// a chain of activities entities flow through. Names are resolved to
/// `ElementId`s when the network is built (`procsim_engine::wiring`).
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NetworkSpec {
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
    #[serde(default)]
    pub resource_sets: Vec<ResourceSetSpec>,
    pub generators: Vec<GeneratorSpec>,
    #[serde(default)]
    pub activities: Vec<ActivitySpec>,
}

impl NetworkSpec {
    pub fn validate(&self) -> Result<(), String> {
        let resource_names: HashSet<&str> =
            self.resources.iter().map(|r| r.name.as_str()).collect();
        let activity_names: HashSet<&str> =
            self.activities.iter().map(|a| a.name.as_str()).collect();

        for set in &self.resource_sets {
            if set.members.is_empty() {
                return Err(format!("resource set '{}' has no members", set.name));
            }
            for member in &set.members {
                if !resource_names.contains(member.as_str()) {
                    return Err(format!(
                        "resource set '{}' references unknown resource '{}'",
                        set.name, member
                    ));
                }
            }
        }

        let route_target_exists = |target: &str| -> bool {
            target == "exit" || activity_names.contains(target)
        };

        for g in &self.generators {
            if !route_target_exists(&g.route_to) {
                return Err(format!(
                    "generator '{}' routes to unknown activity '{}'",
                    g.name, g.route_to
                ));
            }
        }
        for a in &self.activities {
            if let Some(seize) = &a.seize {
                let known = resource_names.contains(seize.resource.as_str())
                    || self.resource_sets.iter().any(|s| s.name == seize.resource);
                if !known {
                    return Err(format!(
                        "activity '{}' seizes unknown resource or set '{}'",
                        a.name, seize.resource
                    ));
                }
            }
            if let Some(route) = &a.route_to {
                if !route_target_exists(route) {
                    return Err(format!(
                        "activity '{}' routes to unknown activity '{}'",
                        a.name, route
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A unit-capacity-or-more resource pool, seized/released by activities.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ResourceSpec {
    pub name: String,
    pub capacity: u32,
}

/// A named pool of resources sharing a selection rule.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ResourceSetSpec {
    pub name: String,
    pub members: Vec<String>,
    #[serde(default)]
    pub rule: SelectionRuleSpec,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRuleSpec {
    /// Round-robin by time-since-last-release (the default, per spec §4.6).
    #[default]
    Cyclical,
}

/// A time-driven entity source.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeneratorSpec {
    pub name: String,
    pub interarrival: DistSpec,
    #[serde(default)]
    pub initial_offset: f64,
    pub max_count: Option<u64>,
    pub end_time: Option<f64>,
    pub route_to: String,
}

/// A single station in the flow: an optional seize/delay/release
/// (`ResourcedActivity`), always followed by routing to the next element.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ActivitySpec {
    pub name: String,
    pub seize: Option<SeizeSpec>,
    pub service: DistSpec,
    /// Name of the next activity, or `"exit"` to leave the network.
    pub route_to: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SeizeSpec {
    pub resource: String,
    #[serde(default = "default_seize_amount")]
    pub amount: u32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub partial_fill: bool,
}

fn default_seize_amount() -> u32 {
    1
}
