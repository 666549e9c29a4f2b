//! # procsim-engine::receiver::generator
//!
//! `Generator`: a time-driven entity source. Draws its next interarrival
//! time from a `RandomSource`, creates an entity, routes it to `route_to`,
//! and schedules its own next `EntityArrival` event, stopping once
//! `max_count` entities have been created or `end_time` is passed.

use crate::executive::{Event, EventDiscriminant};
use crate::model::{ElementBase, ModelCtx, ModelElement};
use procsim_types::id::{ElementId, EntityTypeId};
use procsim_types::time::SimTime;
use procsim_types::variate::RandomSource;

pub struct Generator {
    base: ElementBase,
    interarrival: Box<dyn RandomSource>,
    entity_type: EntityTypeId,
    /// `None` means this generator routes straight out of the model (a
    /// `route_to: "exit"` in the network spec).
    route_to: Option<ElementId>,
    initial_offset: SimTime,
    max_count: Option<u64>,
    end_time: Option<SimTime>,
    created_count: u64,
}

impl Generator {
    pub fn new(
        id: ElementId,
        name: impl Into<String>,
        interarrival: Box<dyn RandomSource>,
        entity_type: EntityTypeId,
        route_to: Option<ElementId>,
        initial_offset: SimTime,
        max_count: Option<u64>,
        end_time: Option<SimTime>,
    ) -> Self {
        Self {
            base: ElementBase::new(id, name),
            interarrival,
            entity_type,
            route_to,
            initial_offset,
            max_count,
            end_time,
            created_count: 0,
        }
    }

    fn should_stop(&self, now: SimTime) -> bool {
        self.max_count.is_some_and(|max| self.created_count >= max)
            || self.end_time.is_some_and(|end| now >= end)
    }

    fn schedule_self(&mut self, ctx: &mut ModelCtx, when: SimTime) {
        let discriminant = EventDiscriminant::default_for(self.base.id);
        ctx.sim()
            .executive_mut()
            .schedule_at(when, discriminant, Event::EntityArrival { generator: self.base.id });
    }
}

impl ModelElement for Generator {
    fn id(&self) -> ElementId {
        self.base.id
    }

    fn name(&self) -> &str {
        &self.base.name
    }

    fn initialize(&mut self, ctx: &mut ModelCtx) {
        self.created_count = 0;
        let now = ctx.now();
        let first = now + self.initial_offset;
        if !self.should_stop(first) {
            self.schedule_self(ctx, first);
        }
    }

    fn on_generate(&mut self, ctx: &mut ModelCtx) {
        let now = ctx.now();
        let entity = ctx.sim().next_entity_id();
        ctx.model()
            .entities
            .insert(entity, crate::entity::Entity::new(entity, self.entity_type, now));
        self.created_count += 1;

        match self.route_to {
            Some(route_to) => ctx.dispatch_entity_arrival(route_to, entity),
            None => {
                ctx.model().entities.remove(&entity);
            }
        }

        let next_time = now + self.interarrival.get_value();
        if !self.should_stop(next_time) {
            self.schedule_self(ctx, next_time);
        }
    }
}
