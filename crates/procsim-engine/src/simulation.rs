//! # procsim-engine::simulation
//!
//! `Simulation`: the top-level orchestrator, combining the `Executive`
//! (clock + event queue), the `Model` (element tree + resources/queues/
//! entities), an `IdGen`, and the trace telemetry. Grounded in the teacher's
//! `sim::Simulation`, which plays the same role for a network of protocol
//! nodes: it owns the same three things (clock, queue, world) plus an
//! `IdGen`, and its `step`/`run` methods are the direct model for
//! `dispatch`/`run_replication` here. Where the teacher's `step` matches on a
//! closed `Event` enum of network effects, `dispatch` matches on this
//! domain's closed enum of process-flow effects (`executive::Event`).

use crate::executive::{Event, EventDiscriminant, Executive};
use crate::ids::IdGen;
use crate::model::{Model, ModelCtx};
use crate::telemetry::TraceObserver;
use crate::variable::Observer;
use procsim_types::errors::SimError;
use procsim_types::id::{ElementId, EntityId, EntityTypeId, QueueId, RequestId, ResourceId, StreamId};
use procsim_types::time::SimTime;

/// A response-observation element registered to open/close an interval on a
/// schedule; see `crate::stats::interval`. `Simulation` doesn't know what
/// these elements measure, only when to fire their hooks.
#[derive(Debug, Clone, Copy)]
pub struct ResponseSchedule {
    pub element: ElementId,
    pub interval_length: SimTime,
}

/// The full replication plan: how long to run, how much of the front to
/// discard as warm-up, and how often (if at all) to roll batch-means.
#[derive(Debug, Clone, Copy)]
pub struct ReplicationPlan {
    pub replication_length: SimTime,
    pub warm_up_length: SimTime,
    pub batch_interval: Option<SimTime>,
}

/// The master simulation controller: one instance runs one `Model` through
/// one or more independent replications.
pub struct Simulation {
    executive: Executive,
    model: Model,
    id_gen: IdGen,
    trace_observer: TraceObserver,
    plan: ReplicationPlan,
    response_schedules: Vec<ResponseSchedule>,
    replication_number: u32,
}

impl Simulation {
    pub fn new(model: Model, plan: ReplicationPlan, trace_observer: TraceObserver) -> Self {
        Self {
            executive: Executive::new(),
            model,
            id_gen: IdGen::new(),
            trace_observer,
            plan,
            response_schedules: Vec::new(),
            replication_number: 0,
        }
    }

    /// Registers a response element to have its observation interval opened
    /// and closed every `interval_length` units of simulated time, starting
    /// at time zero of each replication.
    pub fn add_response_schedule(&mut self, schedule: ResponseSchedule) {
        self.response_schedules.push(schedule);
    }

    pub fn now(&self) -> SimTime {
        self.executive.now()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn executive_mut(&mut self) -> &mut Executive {
        &mut self.executive
    }

    pub fn trace_observer_mut(&mut self) -> &mut dyn Observer {
        &mut self.trace_observer
    }

    /// The concrete trace observer, for callers that need its non-`Observer`
    /// methods (`write_summary`, `flush`) -- `trace_observer_mut` stays
    /// trait-object-typed for `ModelCtx::with_observers`.
    pub fn trace_writer(&mut self) -> &mut TraceObserver {
        &mut self.trace_observer
    }

    pub fn replication_number(&self) -> u32 {
        self.replication_number
    }

    pub fn next_element_id(&mut self) -> ElementId {
        self.id_gen.next_element_id()
    }

    pub fn next_entity_id(&mut self) -> EntityId {
        self.id_gen.next_entity_id()
    }

    pub fn next_entity_type_id(&mut self) -> EntityTypeId {
        self.id_gen.next_entity_type_id()
    }

    pub fn next_resource_id(&mut self) -> ResourceId {
        self.id_gen.next_resource_id()
    }

    pub fn next_request_id(&mut self) -> RequestId {
        self.id_gen.next_request_id()
    }

    pub fn next_queue_id(&mut self) -> QueueId {
        self.id_gen.next_queue_id()
    }

    pub fn next_stream_id(&mut self) -> StreamId {
        self.id_gen.next_stream_id()
    }

    /// Runs `f` once for every element currently in the arena, each with its
    /// own fresh `ModelCtx`. Used for the lifecycle hooks that fire for the
    /// whole tree at once (`before_replication`, `warm_up`,
    /// `replication_ended`, ...) rather than being routed to one target
    /// element by an `Event`.
    fn broadcast(&mut self, mut f: impl for<'c> FnMut(&mut dyn crate::model::ModelElement, &mut ModelCtx<'c>)) {
        for id in self.model.element_ids() {
            let Some((idx, mut elem)) = self.model.take_element(id) else { continue };
            let mut ctx = unsafe { ModelCtx::new(self) };
            f(elem.as_mut(), &mut ctx);
            self.model.restore_element(idx, elem);
        }
    }

    /// Like `broadcast`, but skips elements for which `skip` returns `true`
    /// -- how `initialize` and `warm_up` honor an element's opt-out.
    fn broadcast_unless(
        &mut self,
        skip: impl Fn(&dyn crate::model::ModelElement) -> bool,
        mut f: impl for<'c> FnMut(&mut dyn crate::model::ModelElement, &mut ModelCtx<'c>),
    ) {
        for id in self.model.element_ids() {
            let Some((idx, mut elem)) = self.model.take_element(id) else { continue };
            if !skip(elem.as_ref()) {
                let mut ctx = unsafe { ModelCtx::new(self) };
                f(elem.as_mut(), &mut ctx);
            }
            self.model.restore_element(idx, elem);
        }
    }

    /// Reads every element's `timed_update_interval` and schedules its first
    /// tick, right after `initialize`. Each tick reschedules itself in
    /// `dispatch` until the replication ends.
    fn schedule_timed_updates(&mut self) {
        for id in self.model.element_ids() {
            let Some(interval) = self.model.element(id).and_then(|e| e.timed_update_interval()) else { continue };
            if interval > 0.0 {
                let discriminant = EventDiscriminant::default_for(id);
                self.executive.schedule_at(interval, discriminant, Event::TimedUpdate { element: id });
            }
        }
    }

    fn schedule_warm_up(&mut self) {
        if self.plan.warm_up_length > 0.0 {
            self.executive.schedule_at(self.plan.warm_up_length, EventDiscriminant::warmup(), Event::WarmupEnd);
        }
    }

    fn schedule_batch_boundary(&mut self) {
        if let Some(interval) = self.plan.batch_interval {
            let when = self.now() + interval;
            if when <= self.plan.replication_length {
                self.executive.schedule_at(when, EventDiscriminant::batch(), Event::BatchBoundary);
            }
        }
    }

    fn schedule_response_intervals(&mut self) {
        let schedules = self.response_schedules.clone();
        for schedule in schedules {
            self.executive.schedule_at(
                schedule.interval_length,
                EventDiscriminant::response_interval_end(schedule.element),
                Event::ResponseIntervalEnd { response: schedule.element },
            );
        }
    }

    /// Runs one replication to completion (the queue drains past
    /// `replication_length`, or empties first), resetting the clock and
    /// event queue but keeping the `Model`'s element tree and `IdGen` intact
    /// across replications, exactly as the teacher keeps `World` alive across
    /// the one continuous run its single-replication model performs.
    pub fn run_replication(&mut self, replication_number: u32) -> Result<(), SimError> {
        self.replication_number = replication_number;
        self.trace_observer.set_replication_number(replication_number);
        self.executive = Executive::new();
        self.model.clear_all_statistics(self.now());

        self.broadcast(|elem, ctx| elem.before_replication(ctx));
        self.broadcast_unless(|e| e.skip_initialize(), |elem, ctx| elem.initialize(ctx));
        self.schedule_timed_updates();
        self.schedule_warm_up();
        self.schedule_batch_boundary();
        self.schedule_response_intervals();

        tracing::info!(replication_number, "replication started");

        loop {
            let Some(peek_time) = self.executive.peek_time() else { break };
            if peek_time > self.plan.replication_length {
                break;
            }
            let queued = self.executive.pop().expect("peeked event vanished");
            self.dispatch(queued.payload)?;
        }

        self.executive.cancel_if(|e| matches!(e, Event::TimedUpdate { .. }));
        self.broadcast(|elem, ctx| elem.replication_ended(ctx));
        self.broadcast(|elem, ctx| elem.after_replication(ctx));
        tracing::info!(replication_number, end_time = self.now(), "replication finished");
        Ok(())
    }

    /// Runs every replication `plan.num_replications` calls for, calling
    /// `after_each` with the (1-based) replication number after it completes
    /// so the caller can snapshot summaries before the next replication's
    /// `clear_all_statistics` wipes them. Brackets the whole run with
    /// `before_experiment`/`after_experiment`, each firing exactly once.
    pub fn run_experiment(
        &mut self,
        num_replications: u32,
        mut after_each: impl FnMut(&mut Simulation, u32),
    ) -> Result<(), SimError> {
        self.broadcast(|elem, ctx| elem.before_experiment(ctx));
        for n in 1..=num_replications {
            self.run_replication(n)?;
            after_each(self, n);
        }
        self.broadcast(|elem, ctx| elem.after_experiment(ctx));
        Ok(())
    }

    /// Dispatches a single popped event to the model.
    fn dispatch(&mut self, event: Event) -> Result<(), SimError> {
        match event {
            Event::EntityArrival { generator } => {
                let mut ctx = unsafe { ModelCtx::new(self) };
                ctx.dispatch_generate(generator);
            }
            Event::ActivityEnd { entity, activity } => {
                let mut ctx = unsafe { ModelCtx::new(self) };
                ctx.dispatch_activity_end(activity, entity);
            }
            Event::WarmupEnd => {
                let now = self.now();
                self.model.clear_all_statistics(now);
                self.broadcast_unless(|e| e.skip_warm_up(), |elem, ctx| elem.warm_up(ctx));
                tracing::info!(time = now, "warm-up ended, statistics cleared");
            }
            Event::TimedUpdate { element } => {
                let now = self.now();
                {
                    let mut ctx = unsafe { ModelCtx::new(self) };
                    ctx.dispatch_timed_update(element);
                }
                if let Some(interval) = self.model.element(element).and_then(|e| e.timed_update_interval()) {
                    let next = now + interval;
                    if next <= self.plan.replication_length {
                        let discriminant = EventDiscriminant::default_for(element);
                        self.executive.schedule_at(next, discriminant, Event::TimedUpdate { element });
                    }
                }
            }
            Event::ResponseIntervalStart { response } => {
                let mut ctx = unsafe { ModelCtx::new(self) };
                ctx.dispatch_response_interval_start(response);
            }
            Event::ResponseIntervalEnd { response } => {
                {
                    let mut ctx = unsafe { ModelCtx::new(self) };
                    ctx.dispatch_response_interval_end(response);
                }
                if let Some(schedule) = self.response_schedules.iter().find(|s| s.element == response).copied() {
                    let now = self.now();
                    if now + schedule.interval_length <= self.plan.replication_length {
                        self.executive.schedule_at(
                            now,
                            EventDiscriminant::response_interval_start(response),
                            Event::ResponseIntervalStart { response },
                        );
                        self.executive.schedule_at(
                            now + schedule.interval_length,
                            EventDiscriminant::response_interval_end(response),
                            Event::ResponseIntervalEnd { response },
                        );
                    }
                }
            }
            Event::BatchBoundary => {
                let now = self.now();
                self.model.roll_all_batches(now);
                self.schedule_batch_boundary();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::receiver::Generator;
    use procsim_types::variate::ConstantVariate;

    fn model_with_single_generator(max_count: u64) -> (Model, ElementId) {
        let mut model = Model::new();
        let entity_type: EntityTypeId = 0;
        model.entity_types.push(EntityType { id: entity_type, name: "job".to_string() });
        let gen_id: ElementId = 0;
        let generator = Generator::new(
            gen_id,
            "gen",
            Box::new(ConstantVariate::new(1.0, 0)),
            entity_type,
            Some(999), // no element with this id exists; arrival dispatch is a no-op
            0.0,
            Some(max_count),
            None,
        );
        model.add_element(Box::new(generator));
        (model, gen_id)
    }

    #[test]
    fn replication_runs_until_generator_exhausts() {
        let (model, _gen_id) = model_with_single_generator(5);
        let plan = ReplicationPlan { replication_length: 100.0, warm_up_length: 0.0, batch_interval: None };
        let mut sim = Simulation::new(model, plan, TraceObserver::new(0, "test", None));
        sim.run_replication(1).unwrap();
        assert!(sim.now() <= 100.0);
    }

    #[test]
    fn warm_up_clears_statistics_at_boundary() {
        let (model, _gen_id) = model_with_single_generator(3);
        let plan = ReplicationPlan { replication_length: 50.0, warm_up_length: 2.0, batch_interval: None };
        let mut sim = Simulation::new(model, plan, TraceObserver::new(0, "test", None));
        sim.run_replication(1).unwrap();
        assert!(sim.now() >= 2.0);
    }
}
