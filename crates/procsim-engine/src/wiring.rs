//! # procsim-engine::wiring
//!
//! Turns a declarative `procsim_types::scenario::Experiment` into a runnable
//! `Model`: resolves every resource/resource-set/activity/generator name to
//! an `ElementId`, builds the concrete element instances, and binds each
//! distribution to its own RNG substream. Grounded in the teacher's world
//! construction from a `Scenario` (`world.rs`'s node-building pass), here
//! generalized from a fixed node table to a name-resolving two-pass builder
//! since the network's routing can refer to an activity declared later in
//! the file.

use crate::entity::EntityType;
use crate::errors::WiringError;
use crate::ids::IdGen;
use crate::model::Model;
use crate::receiver::{Activity, Generator, SeizeConfig, SeizeTarget};
use crate::resource::{Resource, ResourceSet, SelectionRule};
use crate::rng::Variate;
use procsim_types::id::{ElementId, ResourceId};
use procsim_types::scenario::{Experiment, SelectionRuleSpec};
use std::collections::HashMap;

/// Builds a `Model` from `experiment`, validating the network first.
pub fn build_model(experiment: &Experiment) -> Result<Model, WiringError> {
    experiment.network.validate().map_err(WiringError::Invalid)?;

    let seed = experiment.seed.unwrap_or(0);
    let mut ids = IdGen::new();
    let mut model = Model::new();

    let resource_ids = wire_resources(experiment, &mut ids, &mut model)?;
    let resource_set_ids = wire_resource_sets(experiment, &mut ids, &mut model, &resource_ids)?;
    let activity_ids = assign_activity_ids(experiment, &mut ids)?;
    wire_activities(experiment, &mut ids, &mut model, seed, &resource_ids, &resource_set_ids, &activity_ids)?;
    wire_generators(experiment, &mut ids, &mut model, seed, &activity_ids)?;

    Ok(model)
}

fn wire_resources(
    experiment: &Experiment,
    ids: &mut IdGen,
    model: &mut Model,
) -> Result<HashMap<String, ResourceId>, WiringError> {
    let mut name_to_id = HashMap::new();
    for spec in &experiment.network.resources {
        if name_to_id.contains_key(&spec.name) {
            return Err(WiringError::DuplicateName(spec.name.clone()));
        }
        let id = ids.next_resource_id();
        model.resources.push(Resource::new(id, spec.name.clone(), spec.capacity, 0.0));
        name_to_id.insert(spec.name.clone(), id);
    }
    Ok(name_to_id)
}

fn wire_resource_sets(
    experiment: &Experiment,
    ids: &mut IdGen,
    model: &mut Model,
    resource_ids: &HashMap<String, ResourceId>,
) -> Result<HashMap<String, ElementId>, WiringError> {
    let mut name_to_id = HashMap::new();
    for spec in &experiment.network.resource_sets {
        if name_to_id.contains_key(&spec.name) {
            return Err(WiringError::DuplicateName(spec.name.clone()));
        }
        let id = ids.next_element_id();
        let members = spec
            .members
            .iter()
            .map(|m| {
                resource_ids
                    .get(m)
                    .copied()
                    .ok_or_else(|| WiringError::UnknownName(m.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rule = match spec.rule {
            SelectionRuleSpec::Cyclical => SelectionRule::Cyclical,
        };
        model.resource_sets.push(ResourceSet::new(id, spec.name.clone(), members, rule));
        name_to_id.insert(spec.name.clone(), id);
    }
    Ok(name_to_id)
}

fn assign_activity_ids(experiment: &Experiment, ids: &mut IdGen) -> Result<HashMap<String, ElementId>, WiringError> {
    let mut name_to_id = HashMap::new();
    for spec in &experiment.network.activities {
        if name_to_id.contains_key(&spec.name) {
            return Err(WiringError::DuplicateName(spec.name.clone()));
        }
        name_to_id.insert(spec.name.clone(), ids.next_element_id());
    }
    Ok(name_to_id)
}

fn resolve_seize_target(
    resource: &str,
    resource_ids: &HashMap<String, ResourceId>,
    resource_set_ids: &HashMap<String, ElementId>,
) -> Result<SeizeTarget, WiringError> {
    if let Some(id) = resource_ids.get(resource) {
        Ok(SeizeTarget::Resource(*id))
    } else if let Some(id) = resource_set_ids.get(resource) {
        Ok(SeizeTarget::ResourceSet(*id))
    } else {
        Err(WiringError::UnknownName(resource.to_string()))
    }
}

fn resolve_route(
    route_to: Option<&str>,
    activity_ids: &HashMap<String, ElementId>,
) -> Result<Option<ElementId>, WiringError> {
    match route_to {
        None | Some("exit") => Ok(None),
        Some(name) => activity_ids.get(name).copied().map(Some).ok_or_else(|| WiringError::UnknownName(name.to_string())),
    }
}

fn wire_activities(
    experiment: &Experiment,
    ids: &mut IdGen,
    model: &mut Model,
    seed: u64,
    resource_ids: &HashMap<String, ResourceId>,
    resource_set_ids: &HashMap<String, ElementId>,
    activity_ids: &HashMap<String, ElementId>,
) -> Result<(), WiringError> {
    for spec in &experiment.network.activities {
        let id = activity_ids[&spec.name];
        let seize = spec
            .seize
            .as_ref()
            .map(|s| -> Result<SeizeConfig, WiringError> {
                Ok(SeizeConfig {
                    target: resolve_seize_target(&s.resource, resource_ids, resource_set_ids)?,
                    amount: s.amount,
                    priority: s.priority,
                    partial_fill: s.partial_fill,
                })
            })
            .transpose()?;
        let route_to = resolve_route(spec.route_to.as_deref(), activity_ids)?;
        let service = Variate::from_spec(&spec.service, ids.next_stream_id(), seed);
        let activity = Activity::new(id, spec.name.clone(), seize, Box::new(service), route_to, 0.0);
        model.add_element(Box::new(activity));
    }
    Ok(())
}

fn wire_generators(
    experiment: &Experiment,
    ids: &mut IdGen,
    model: &mut Model,
    seed: u64,
    activity_ids: &HashMap<String, ElementId>,
) -> Result<(), WiringError> {
    let mut seen_names = std::collections::HashSet::new();
    for spec in &experiment.network.generators {
        if !seen_names.insert(spec.name.clone()) {
            return Err(WiringError::DuplicateName(spec.name.clone()));
        }
        let id = ids.next_element_id();
        let entity_type_id = ids.next_entity_type_id();
        model.entity_types.push(EntityType { id: entity_type_id, name: format!("{}.entity", spec.name) });

        let route_to = resolve_route(Some(spec.route_to.as_str()), activity_ids)?;
        let interarrival = Variate::from_spec(&spec.interarrival, ids.next_stream_id(), seed);
        let generator = Generator::new(
            id,
            spec.name.clone(),
            Box::new(interarrival),
            entity_type_id,
            route_to,
            spec.initial_offset,
            spec.max_count,
            spec.end_time,
        );
        model.add_element(Box::new(generator));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use procsim_types::config::DistSpec;
    use procsim_types::scenario::{ActivitySpec, GeneratorSpec, NetworkSpec, ResourceSpec, SeizeSpec};

    fn sample_experiment() -> Experiment {
        Experiment {
            name: "single_queue".to_string(),
            seed: Some(42),
            num_replications: 1,
            replication_length: 100.0,
            warm_up_length: 0.0,
            network: NetworkSpec {
                resources: vec![ResourceSpec { name: "server".to_string(), capacity: 1 }],
                resource_sets: vec![],
                generators: vec![GeneratorSpec {
                    name: "arrivals".to_string(),
                    interarrival: DistSpec::Exponential { mean: 2.0 },
                    initial_offset: 0.0,
                    max_count: Some(10),
                    end_time: None,
                    route_to: "service".to_string(),
                }],
                activities: vec![ActivitySpec {
                    name: "service".to_string(),
                    seize: Some(SeizeSpec { resource: "server".to_string(), amount: 1, priority: 0, partial_fill: false }),
                    service: DistSpec::Exponential { mean: 1.0 },
                    route_to: Some("exit".to_string()),
                }],
            },
        }
    }

    #[test]
    fn builds_one_resource_one_generator_one_activity() {
        let model = build_model(&sample_experiment()).unwrap();
        assert_eq!(model.resources.len(), 1);
        assert_eq!(model.element_ids().len(), 2);
    }

    #[test]
    fn unknown_route_target_is_rejected() {
        let mut experiment = sample_experiment();
        experiment.network.activities[0].route_to = Some("nowhere".to_string());
        let err = build_model(&experiment).unwrap_err();
        assert!(matches!(err, WiringError::Invalid(_)));
    }
}
