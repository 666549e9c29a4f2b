//! # procsim-engine::model
//!
//! The model-element tree: the arena of `Generator`s and `Activity`s that
//! participate in event dispatch, plus the typed collections (resources,
//! queues) they reach into. Grounded in the teacher's `World`
//! (`world.rs`), generalized from a fixed node list to a named, looked-up-by-id
//! element arena the way `ftsim-engine`'s node-by-`NodeId` access works, but
//! opened up to heterogeneous element kinds via `ModelElement`.

use crate::entity::{Entity, EntityType};
use crate::queue::Queue;
use crate::resource::{Resource, ResourceSet};
use crate::variable::Observer;
use procsim_types::errors::SimError;
use procsim_types::id::{ElementId, EntityId};
use procsim_types::time::SimTime;
use std::collections::HashMap;

/// A node in the model-element tree that participates in event dispatch:
/// `Generator`s create entities, `Activity`s process them. Every element is
/// addressed by `ElementId` from scheduled events, so the tree is stored as
/// a `Vec<Box<dyn ModelElement>>` rather than named struct fields.
/// Lifecycle hooks fire exactly once per applicable phase, in tree order,
/// for the whole element arena at once (`Simulation::broadcast`):
///
/// ```text
/// before_experiment                             (once, before replication 1)
/// for each replication:
///   before_replication -> initialize -> (warm_up) -> timed_update* -> replication_ended -> after_replication
/// after_experiment                              (once, after the last replication)
/// ```
///
/// `initialize` and `warm_up` may be skipped per element via
/// `skip_initialize`/`skip_warm_up`. `removed_from_model` has no caller yet:
/// nothing in this model can remove an element from the arena mid-run, but
/// the hook is part of the lifecycle contract so a future element that can
/// (e.g. a dynamically-created and later-discarded entity proxy) has
/// somewhere to release what it owns.
pub trait ModelElement {
    fn id(&self) -> ElementId;
    fn name(&self) -> &str;

    /// Whether this element opts out of `initialize` every replication.
    fn skip_initialize(&self) -> bool {
        false
    }

    /// Whether this element opts out of `warm_up` every replication.
    fn skip_warm_up(&self) -> bool {
        false
    }

    /// The cadence, if any, at which this element wants a `timed_update`
    /// event. Consulted once per replication right after `initialize`;
    /// returning `Some` registers a recurring event at that interval for the
    /// rest of the replication.
    fn timed_update_interval(&self) -> Option<SimTime> {
        None
    }

    /// Called once before the first replication of the experiment.
    fn before_experiment(&mut self, _ctx: &mut ModelCtx) {}

    /// Called at the start of every replication, after statistics are
    /// cleared but before `initialize` and before any events are scheduled.
    fn before_replication(&mut self, _ctx: &mut ModelCtx) {}

    /// Called once per replication, after `before_replication`, unless
    /// `skip_initialize` returns `true`. Generators use this to schedule
    /// their first `EntityArrival`.
    fn initialize(&mut self, _ctx: &mut ModelCtx) {}

    /// The warm-up period has ended and statistics have just been cleared,
    /// unless `skip_warm_up` returns `true` for this element.
    fn warm_up(&mut self, _ctx: &mut ModelCtx) {}

    /// This element's registered `timed_update_interval` cadence has ticked.
    fn timed_update(&mut self, _ctx: &mut ModelCtx) {}

    /// This element's `EntityArrival` event has fired: a `Generator` should
    /// create its next entity and schedule the one after that.
    fn on_generate(&mut self, _ctx: &mut ModelCtx) {}

    /// An entity has arrived at this element, routed in from a generator or
    /// an upstream activity.
    fn on_entity_arrival(&mut self, _ctx: &mut ModelCtx, _entity: EntityId) {}

    /// This element's `ActivityEnd` event has fired for `entity`.
    fn on_activity_end(&mut self, _ctx: &mut ModelCtx, _entity: EntityId) {}

    /// This element's response observation interval has opened.
    fn on_response_interval_start(&mut self, _ctx: &mut ModelCtx) {}

    /// This element's response observation interval has closed.
    fn on_response_interval_end(&mut self, _ctx: &mut ModelCtx) {}

    /// Called at the end of every replication, before `after_replication`
    /// and before the next replication (if any) begins clearing statistics.
    fn replication_ended(&mut self, _ctx: &mut ModelCtx) {}

    /// Called at the end of every replication, after `replication_ended`.
    fn after_replication(&mut self, _ctx: &mut ModelCtx) {}

    /// Called once after the last replication of the experiment.
    fn after_experiment(&mut self, _ctx: &mut ModelCtx) {}

    /// Called if this element is ever removed from the model arena.
    fn removed_from_model(&mut self, _ctx: &mut ModelCtx) {}
}

/// Common state every `ModelElement` implementation embeds.
pub struct ElementBase {
    pub id: ElementId,
    pub name: String,
    /// Opts this element out of the `initialize` phase every replication.
    pub skip_initialize: bool,
    /// Opts this element out of the `warm_up` phase every replication.
    pub skip_warm_up: bool,
}

impl ElementBase {
    pub fn new(id: ElementId, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), skip_initialize: false, skip_warm_up: false }
    }
}

/// The full model: the dynamically-dispatched element arena plus the typed
/// resource/queue/entity collections every element reaches into through
/// `ModelCtx`.
pub struct Model {
    pub(crate) elements: Vec<Box<dyn ModelElement>>,
    pub(crate) name_index: HashMap<String, ElementId>,
    pub resources: Vec<Resource>,
    pub resource_sets: Vec<ResourceSet>,
    pub queues: Vec<Queue>,
    pub entity_types: Vec<EntityType>,
    pub entities: HashMap<EntityId, Entity>,
}

impl Model {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            name_index: HashMap::new(),
            resources: Vec::new(),
            resource_sets: Vec::new(),
            queues: Vec::new(),
            entity_types: Vec::new(),
            entities: HashMap::new(),
        }
    }

    pub fn add_element(&mut self, element: Box<dyn ModelElement>) {
        self.name_index.insert(element.name().to_string(), element.id());
        self.elements.push(element);
    }

    pub fn element_id_by_name(&self, name: &str) -> Option<ElementId> {
        self.name_index.get(name).copied()
    }

    /// Every element's id, in arena order -- used to broadcast a lifecycle
    /// hook (e.g. `before_replication`) to the whole tree.
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(|e| e.id()).collect()
    }

    pub fn element(&self, id: ElementId) -> Option<&dyn ModelElement> {
        self.elements.iter().find(|e| e.id() == id).map(|e| e.as_ref())
    }

    /// Removes `id`'s element from the arena, leaving a placeholder in its
    /// slot, so callers can invoke a hook on it with a `&mut ModelCtx` that
    /// itself can reach back into the arena (e.g. to route to another
    /// element) without a double mutable borrow of the same `Box`. Pair
    /// with `restore_element`.
    pub fn take_element(&mut self, id: ElementId) -> Option<(usize, Box<dyn ModelElement>)> {
        let idx = self.elements.iter().position(|e| e.id() == id)?;
        let elem = std::mem::replace(&mut self.elements[idx], Box::new(NullElement));
        Some((idx, elem))
    }

    pub fn restore_element(&mut self, idx: usize, element: Box<dyn ModelElement>) {
        self.elements[idx] = element;
    }

    pub fn resource(&self, id: ElementId) -> Result<&Resource, SimError> {
        self.resources.iter().find(|r| r.id() == id).ok_or(SimError::ResourceNotFound(id))
    }

    pub fn resource_mut(&mut self, id: ElementId) -> Result<&mut Resource, SimError> {
        self.resources
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(SimError::ResourceNotFound(id))
    }

    pub fn queue(&self, id: ElementId) -> Result<&Queue, SimError> {
        self.queues.iter().find(|q| q.id() == id).ok_or(SimError::QueueNotFound(id))
    }

    pub fn queue_mut(&mut self, id: ElementId) -> Result<&mut Queue, SimError> {
        self.queues.iter_mut().find(|q| q.id() == id).ok_or(SimError::QueueNotFound(id))
    }

    pub fn entity(&self, id: EntityId) -> Result<&Entity, SimError> {
        self.entities.get(&id).ok_or(SimError::EntityNotFound(id))
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, SimError> {
        self.entities.get_mut(&id).ok_or(SimError::EntityNotFound(id))
    }

    /// Clears every resource's and queue's statistics, the warm-up reset.
    pub fn clear_all_statistics(&mut self, time: SimTime) {
        for r in &mut self.resources {
            r.clear_statistics(time);
        }
        for q in &mut self.queues {
            q.clear_statistics(time);
        }
    }

    pub fn roll_all_batches(&mut self, time: SimTime) {
        for r in &mut self.resources {
            r.roll_batch(time);
        }
        for q in &mut self.queues {
            q.roll_batch(time);
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

/// The context passed to every `ModelElement` hook: routes calls back into
/// the owning `Simulation` (for scheduling) and the `Model` (for resources,
/// queues, entities) without handing out an aliasing `&mut Model` alongside
/// `&mut self`. Built the same way the teacher's `EngineCtx` bridges
/// `Simulation` state into `Node`/`ProtoCtx` calls, via a raw pointer to the
/// owning `Simulation` rather than threading two disjoint `&mut` borrows
/// through every hook signature.
pub struct ModelCtx<'a> {
    sim: *mut crate::simulation::Simulation,
    _marker: std::marker::PhantomData<&'a mut crate::simulation::Simulation>,
}

impl<'a> ModelCtx<'a> {
    /// # Safety
    /// `sim` must outlive the `ModelCtx` and must not be accessed elsewhere
    /// while the `ModelCtx` exists. Constructed exclusively by
    /// `Simulation::dispatch`, which upholds this by holding the only other
    /// reference for the duration of the raw-pointer dereference.
    pub(crate) unsafe fn new(sim: &'a mut crate::simulation::Simulation) -> Self {
        Self { sim: sim as *mut _, _marker: std::marker::PhantomData }
    }

    pub fn sim(&mut self) -> &mut crate::simulation::Simulation {
        unsafe { &mut *self.sim }
    }

    pub fn model(&mut self) -> &mut Model {
        self.sim().model_mut()
    }

    pub fn now(&mut self) -> SimTime {
        self.sim().now()
    }

    /// Runs `f` with the replication's trace observer as a one-element
    /// observer slice, the shape `Variable::set_value` and friends expect.
    /// A single observer is all this model needs (the trace writer); the
    /// slice-of-observers API on `Variable` stays general for callers that
    /// might compose more than one.
    pub fn with_observers<R>(&mut self, f: impl FnOnce(&mut [&mut dyn Observer]) -> R) -> R {
        let sim = self.sim();
        let mut obs: [&mut dyn Observer; 1] = [sim.trace_observer_mut()];
        f(&mut obs)
    }

    /// Routes `entity` to `target`'s `on_generate` hook.
    pub fn dispatch_generate(&mut self, target: ElementId) {
        let Some((idx, mut elem)) = self.model().take_element(target) else { return };
        elem.on_generate(self);
        self.model().restore_element(idx, elem);
    }

    /// Routes `entity` to `target`'s `on_entity_arrival` hook.
    pub fn dispatch_entity_arrival(&mut self, target: ElementId, entity: EntityId) {
        let Some((idx, mut elem)) = self.model().take_element(target) else { return };
        elem.on_entity_arrival(self, entity);
        self.model().restore_element(idx, elem);
    }

    /// Delivers `target`'s `ActivityEnd` event for `entity`.
    pub fn dispatch_activity_end(&mut self, target: ElementId, entity: EntityId) {
        let Some((idx, mut elem)) = self.model().take_element(target) else { return };
        elem.on_activity_end(self, entity);
        self.model().restore_element(idx, elem);
    }

    /// Opens `target`'s response observation interval.
    pub fn dispatch_response_interval_start(&mut self, target: ElementId) {
        let Some((idx, mut elem)) = self.model().take_element(target) else { return };
        elem.on_response_interval_start(self);
        self.model().restore_element(idx, elem);
    }

    /// Closes `target`'s response observation interval.
    pub fn dispatch_response_interval_end(&mut self, target: ElementId) {
        let Some((idx, mut elem)) = self.model().take_element(target) else { return };
        elem.on_response_interval_end(self);
        self.model().restore_element(idx, elem);
    }

    /// Delivers `target`'s `timed_update` cadence tick.
    pub fn dispatch_timed_update(&mut self, target: ElementId) {
        let Some((idx, mut elem)) = self.model().take_element(target) else { return };
        elem.timed_update(self);
        self.model().restore_element(idx, elem);
    }
}

/// A placeholder left in the element arena while an element is temporarily
/// taken out for dispatch; never observable from outside `Model`.
struct NullElement;

impl ModelElement for NullElement {
    fn id(&self) -> ElementId {
        ElementId::MAX
    }

    fn name(&self) -> &str {
        "<null>"
    }
}
