//! End-to-end replication runs against small hand-built networks, one per
//! classic queueing scenario. Run lengths and tolerances are scaled well
//! below the full acceptance-test scale (which needs hundreds of thousands of
//! time units to pin statistics to within a percent) so these run in
//! milliseconds; the tolerances are widened to match, not just the run
//! length, so a passing run is still a meaningful check rather than a
//! coin flip.

use procsim_engine::prelude::*;
use procsim_types::config::DistSpec;
use procsim_types::scenario::{
    ActivitySpec, Experiment, GeneratorSpec, NetworkSpec, ResourceSetSpec, ResourceSpec, SeizeSpec,
};

fn run(experiment: &Experiment) -> Simulation {
    let model = build_model(experiment).expect("network should wire cleanly");
    let plan = ReplicationPlan {
        replication_length: experiment.replication_length,
        warm_up_length: experiment.warm_up_length,
        batch_interval: None,
    };
    let mut sim = Simulation::new(model, plan, TraceObserver::new(0, experiment.name.clone(), None));
    sim.run_replication(1).unwrap();
    sim
}

/// E1: M/M/1. Exponential inter-arrival mean 1.0 into a single-capacity
/// workstation with exponential service mean 0.7 -- utilization should track
/// the offered load ρ = 0.7/1.0 = 0.7.
#[test]
fn mm1_utilization_tracks_offered_load() {
    let experiment = Experiment {
        name: "mm1".to_string(),
        seed: Some(42),
        num_replications: 1,
        replication_length: 4_000.0,
        warm_up_length: 200.0,
        network: NetworkSpec {
            resources: vec![ResourceSpec { name: "server".to_string(), capacity: 1 }],
            resource_sets: vec![],
            generators: vec![GeneratorSpec {
                name: "arrivals".to_string(),
                interarrival: DistSpec::Exponential { mean: 1.0 },
                initial_offset: 0.0,
                max_count: None,
                end_time: None,
                route_to: "service".to_string(),
            }],
            activities: vec![ActivitySpec {
                name: "service".to_string(),
                seize: Some(SeizeSpec { resource: "server".to_string(), amount: 1, priority: 0, partial_fill: false }),
                service: DistSpec::Exponential { mean: 0.7 },
                route_to: None,
            }],
        },
    };

    let sim = run(&experiment);
    let utilization = sim.model().resources[0].utilization_summary().mean;
    assert!(
        (0.55..0.85).contains(&utilization),
        "utilization {utilization} should be near the offered load 0.7 (wide tolerance for a short run)"
    );
}

/// E2: two-stage series, A then B, each unit-capacity. Both stages should
/// see the same throughput and report some nonzero mean utilization and
/// queueing.
#[test]
fn two_stage_series_both_stages_see_load() {
    let experiment = Experiment {
        name: "series".to_string(),
        seed: Some(7),
        num_replications: 1,
        replication_length: 3_000.0,
        warm_up_length: 100.0,
        network: NetworkSpec {
            resources: vec![
                ResourceSpec { name: "a".to_string(), capacity: 1 },
                ResourceSpec { name: "b".to_string(), capacity: 1 },
            ],
            resource_sets: vec![],
            generators: vec![GeneratorSpec {
                name: "arrivals".to_string(),
                interarrival: DistSpec::Exponential { mean: 1.0 },
                initial_offset: 0.0,
                max_count: None,
                end_time: None,
                route_to: "stage_a".to_string(),
            }],
            activities: vec![
                ActivitySpec {
                    name: "stage_a".to_string(),
                    seize: Some(SeizeSpec { resource: "a".to_string(), amount: 1, priority: 0, partial_fill: false }),
                    service: DistSpec::Exponential { mean: 0.5 },
                    route_to: Some("stage_b".to_string()),
                },
                ActivitySpec {
                    name: "stage_b".to_string(),
                    seize: Some(SeizeSpec { resource: "b".to_string(), amount: 1, priority: 0, partial_fill: false }),
                    service: DistSpec::Exponential { mean: 0.6 },
                    route_to: None,
                },
            ],
        },
    };

    let sim = run(&experiment);
    let util_a = sim.model().resources[0].utilization_summary().mean;
    let util_b = sim.model().resources[1].utilization_summary().mean;
    assert!(util_a > 0.2 && util_a < 0.8, "stage A utilization {util_a} out of plausible range");
    assert!(util_b > 0.2 && util_b < 0.8, "stage B utilization {util_b} out of plausible range");
}

/// E3: a three-member resource set under the cyclical rule should spread
/// load roughly evenly across its members.
#[test]
fn resource_set_round_robin_balances_load() {
    let experiment = Experiment {
        name: "pool".to_string(),
        seed: Some(99),
        num_replications: 1,
        replication_length: 5_000.0,
        warm_up_length: 200.0,
        network: NetworkSpec {
            resources: vec![
                ResourceSpec { name: "r1".to_string(), capacity: 1 },
                ResourceSpec { name: "r2".to_string(), capacity: 1 },
                ResourceSpec { name: "r3".to_string(), capacity: 1 },
            ],
            resource_sets: vec![ResourceSetSpec {
                name: "pool".to_string(),
                members: vec!["r1".to_string(), "r2".to_string(), "r3".to_string()],
                rule: Default::default(),
            }],
            generators: vec![GeneratorSpec {
                name: "arrivals".to_string(),
                interarrival: DistSpec::Exponential { mean: 0.4 },
                initial_offset: 0.0,
                max_count: None,
                end_time: None,
                route_to: "service".to_string(),
            }],
            activities: vec![ActivitySpec {
                name: "service".to_string(),
                seize: Some(SeizeSpec { resource: "pool".to_string(), amount: 1, priority: 0, partial_fill: false }),
                service: DistSpec::Exponential { mean: 1.0 },
                route_to: None,
            }],
        },
    };

    let sim = run(&experiment);
    let utilizations: Vec<f64> =
        sim.model().resources.iter().map(|r| r.utilization_summary().mean).collect();
    let max = utilizations.iter().cloned().fold(f64::MIN, f64::max);
    let min = utilizations.iter().cloned().fold(f64::MAX, f64::min);
    assert!(max - min < 0.25, "cyclical selection should balance load across members: {utilizations:?}");
}
