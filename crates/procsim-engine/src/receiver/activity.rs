//! # procsim-engine::receiver::activity
//!
//! `Activity`: the seize-delay-release-route station every entity visits.
//! An activity with no seize configuration is a pure delay; one with a
//! seize waits (in its own stats `Queue`) for a resource or resource-set
//! member to become available, then holds it for a service-time draw before
//! releasing and routing onward.

use crate::executive::{Event, EventDiscriminant};
use crate::model::{ElementBase, ModelCtx, ModelElement};
use crate::queue::{Queue, QueueDiscipline};
use crate::resource::Allocation;
use procsim_types::id::{ElementId, EntityId, RequestId, ResourceId};
use procsim_types::variate::RandomSource;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub enum SeizeTarget {
    Resource(ResourceId),
    ResourceSet(ElementId),
}

pub struct SeizeConfig {
    pub target: SeizeTarget,
    pub amount: u32,
    pub priority: i32,
    pub partial_fill: bool,
}

struct PendingEntry {
    entity: EntityId,
    resource: ResourceId,
    requested_amount: u32,
    granted_so_far: u32,
}

pub struct Activity {
    base: ElementBase,
    seize: Option<SeizeConfig>,
    service: Box<dyn RandomSource>,
    /// `None` means this activity's exit routes the entity out of the model.
    route_to: Option<ElementId>,
    wait_queue: Option<Queue>,
    pending_requests: HashMap<RequestId, PendingEntry>,
    entity_allocations: HashMap<EntityId, Vec<Allocation>>,
}

impl Activity {
    pub fn new(
        id: ElementId,
        name: impl Into<String>,
        seize: Option<SeizeConfig>,
        service: Box<dyn RandomSource>,
        route_to: Option<ElementId>,
        start_time: procsim_types::time::SimTime,
    ) -> Self {
        let name = name.into();
        let wait_queue =
            seize.is_some().then(|| Queue::new(id, format!("{name}.wait"), QueueDiscipline::Ranked, start_time));
        Self {
            base: ElementBase::new(id, name),
            seize,
            service,
            route_to,
            wait_queue,
            pending_requests: HashMap::new(),
            entity_allocations: HashMap::new(),
        }
    }

    fn resolve_target_resource(&self, ctx: &mut ModelCtx) -> Option<ResourceId> {
        match self.seize.as_ref()?.target {
            SeizeTarget::Resource(id) => Some(id),
            SeizeTarget::ResourceSet(set_id) => {
                let time = ctx.now();
                let model = ctx.model();
                let set = model.resource_sets.iter().find(|s| s.id() == set_id)?;
                set.select(&model.resources, time).map(|r| r.id())
            }
        }
    }

    fn try_begin_service(&mut self, ctx: &mut ModelCtx, entity: EntityId) {
        let Some(seize) = &self.seize else {
            self.schedule_end(ctx, entity);
            return;
        };
        let amount = seize.amount;
        let priority = seize.priority;
        let partial_fill = seize.partial_fill;

        let Some(resource_id) = self.resolve_target_resource(ctx) else {
            tracing::warn!(activity = %self.base.name, "no resource available to seize, entity waits indefinitely");
            return;
        };

        let request_id = ctx.sim().next_request_id();
        let now = ctx.now();
        let result = ctx.model().resource_mut(resource_id).and_then(|resource| {
            let mut obs_none: Vec<&mut dyn crate::variable::Observer> = Vec::new();
            resource.seize(now, request_id, entity, amount, priority, partial_fill, &mut obs_none)
        });

        match result {
            Ok(allocations) => self.handle_seize_result(ctx, entity, resource_id, amount, request_id, allocations),
            Err(err) => tracing::warn!(activity = %self.base.name, %err, "seize failed"),
        }
    }

    fn handle_seize_result(
        &mut self,
        ctx: &mut ModelCtx,
        entity: EntityId,
        resource_id: ResourceId,
        requested_amount: u32,
        request_id: RequestId,
        allocations: Vec<Allocation>,
    ) {
        let granted: u32 = allocations.iter().map(|a| a.amount).sum();
        self.entity_allocations.entry(entity).or_default().extend(allocations);

        if granted >= requested_amount {
            self.schedule_end(ctx, entity);
        } else {
            let rank = -(self.seize.as_ref().map(|s| s.priority).unwrap_or(0) as i64);
            if let Some(q) = &mut self.wait_queue {
                let now = ctx.now();
                ctx.with_observers(|obs| q.enqueue(now, entity, rank, obs)).ok();
            }
            self.pending_requests.insert(
                request_id,
                PendingEntry { entity, resource: resource_id, requested_amount, granted_so_far: granted },
            );
        }
    }

    fn schedule_end(&mut self, ctx: &mut ModelCtx, entity: EntityId) {
        if let Some(q) = &mut self.wait_queue {
            let now = ctx.now();
            ctx.with_observers(|obs| q.dequeue(now, obs)).ok();
        }
        let duration = self.service.get_value();
        let when = ctx.now() + duration;
        let discriminant = EventDiscriminant::default_for(self.base.id);
        ctx.sim()
            .executive_mut()
            .schedule_at(when, discriminant, Event::ActivityEnd { entity, activity: self.base.id });
    }

    fn release_and_retry(&mut self, ctx: &mut ModelCtx, entity: EntityId) {
        let Some(allocations) = self.entity_allocations.remove(&entity) else { return };
        for allocation in allocations {
            let resource_id = allocation.resource;
            let now = ctx.now();
            let completed = ctx.model().resource_mut(resource_id).ok().and_then(|resource| {
                let mut obs_none: Vec<&mut dyn crate::variable::Observer> = Vec::new();
                resource.release(now, allocation, &mut obs_none).ok()
            });
            let Some(completed) = completed else { continue };
            for (request_id, new_alloc) in completed {
                self.apply_completion(ctx, request_id, new_alloc);
            }
        }
    }

    fn apply_completion(&mut self, ctx: &mut ModelCtx, request_id: RequestId, allocation: Allocation) {
        let Some(entry) = self.pending_requests.get_mut(&request_id) else { return };
        entry.granted_so_far += allocation.amount;
        let entity = entry.entity;
        let complete = entry.granted_so_far >= entry.requested_amount;
        self.entity_allocations.entry(entity).or_default().push(allocation);

        if complete {
            self.pending_requests.remove(&request_id);
            if let Some(q) = &mut self.wait_queue {
                let now = ctx.now();
                ctx.with_observers(|obs| q.dequeue(now, obs)).ok();
            }
            self.schedule_end(ctx, entity);
        }
    }
}

impl ModelElement for Activity {
    fn id(&self) -> ElementId {
        self.base.id
    }

    fn name(&self) -> &str {
        &self.base.name
    }

    fn on_entity_arrival(&mut self, ctx: &mut ModelCtx, entity: EntityId) {
        self.try_begin_service(ctx, entity);
    }

    fn on_activity_end(&mut self, ctx: &mut ModelCtx, entity: EntityId) {
        self.release_and_retry(ctx, entity);

        let next = {
            let model = ctx.model();
            let e = model.entity_mut(entity).ok();
            e.and_then(|e| e.has_receiver_sequence().then(|| e.next_sequence_stop())).or(self.route_to)
        };

        match next {
            Some(target) => ctx.dispatch_entity_arrival(target, entity),
            None => {
                ctx.model().entities.remove(&entity);
            }
        }
    }
}
