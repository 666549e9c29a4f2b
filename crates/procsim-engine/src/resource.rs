//! # procsim-engine::resource
//!
//! `Resource`: a pool of `capacity` interchangeable units, seized and
//! released by activities. Waiting requests are held in priority order
//! (lowest numeric priority first, then FIFO arrival) and retried greedily
//! on every release, including a partial fill for requests willing to take
//! less than their full amount and top up later.
//!
//! `ResourceSet` groups several resources under a selection rule so an
//! activity can seize "one of" a pool rather than a specific resource by
//! name; the only rule in this model is `Cyclical`, round-robin by
//! time-since-last-release (spec's resource-set selection rule).

use crate::counter::Counter;
use crate::variable::Observer;
use procsim_types::errors::SimError;
use procsim_types::id::{AllocationId, ElementId, EntityId, RequestId, ResourceId};
use procsim_types::time::SimTime;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
pub struct Allocation {
    pub id: AllocationId,
    pub resource: ResourceId,
    pub entity: EntityId,
    pub amount: u32,
}

struct PendingRequest {
    id: RequestId,
    entity: EntityId,
    amount: u32,
    priority: i32,
    partial_fill: bool,
    /// How much has already been allocated toward this request, for the
    /// partial-fill case where the rest arrives on a later release.
    filled: u32,
    insert_seq: u64,
}

/// A single interchangeable-unit resource pool.
pub struct Resource {
    id: ResourceId,
    name: String,
    capacity: u32,
    in_use: Counter,
    waiting: VecDeque<PendingRequest>,
    next_insert_seq: u64,
    /// Each resource mints its own allocation ids, packed as
    /// `(resource_id << 32) | sequence`, so no process-wide or cross-model
    /// counter is needed to keep them unique.
    next_alloc_seq: u32,
    last_release_time: SimTime,
}

impl Resource {
    pub fn new(id: ResourceId, name: impl Into<String>, capacity: u32, start_time: SimTime) -> Self {
        let name = name.into();
        Self {
            id,
            in_use: Counter::new(id as ElementId, format!("{name}.in_use"), start_time),
            name,
            capacity,
            waiting: VecDeque::new(),
            next_insert_seq: 0,
            next_alloc_seq: 0,
            last_release_time: start_time,
        }
    }

    fn next_allocation_id(&mut self) -> AllocationId {
        let seq = self.next_alloc_seq;
        self.next_alloc_seq += 1;
        ((self.id as AllocationId) << 32) | seq as AllocationId
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn available(&self) -> u32 {
        self.capacity - self.in_use.current() as u32
    }

    /// The instantaneous number of units currently allocated, for snapshot
    /// consumers like `stats::interval::ResponseInterval`.
    pub fn in_use(&self) -> f64 {
        self.in_use.current()
    }

    pub fn time_since_last_release(&self, now: SimTime) -> SimTime {
        now - self.last_release_time
    }

    /// Attempts to seize `amount` units for `entity`. If capacity allows a
    /// full (or, for `partial_fill`, partial) grant, returns the
    /// `Allocation`s made immediately; otherwise the request is enqueued in
    /// priority order and `None` is returned -- the caller must wait for a
    /// `release` to retry it.
    pub fn seize(
        &mut self,
        time: SimTime,
        request_id: RequestId,
        entity: EntityId,
        amount: u32,
        priority: i32,
        partial_fill: bool,
        observers: &mut [&mut dyn Observer],
    ) -> Result<Vec<Allocation>, SimError> {
        if amount == 0 {
            return Err(SimError::InvalidArgument(format!(
                "resource '{}' seize amount must be positive",
                self.name
            )));
        }
        if amount > self.capacity {
            return Err(SimError::RangeExceeded(format!(
                "resource '{}' capacity {} cannot satisfy a request for {}",
                self.name, self.capacity, amount
            )));
        }

        let grantable = self.available().min(amount);
        if grantable == amount || (partial_fill && grantable > 0) {
            self.in_use.increment(time, grantable as f64, observers)?;
            let allocation = Allocation { id: self.next_allocation_id(), resource: self.id, entity, amount: grantable };
            if grantable < amount {
                let insert_seq = self.next_insert_seq;
                self.next_insert_seq += 1;
                self.waiting.push_back(PendingRequest {
                    id: request_id,
                    entity,
                    amount,
                    priority,
                    partial_fill,
                    filled: grantable,
                    insert_seq,
                });
                self.reorder_waiting();
            }
            Ok(vec![allocation])
        } else {
            let insert_seq = self.next_insert_seq;
            self.next_insert_seq += 1;
            self.waiting.push_back(PendingRequest {
                id: request_id,
                entity,
                amount,
                priority,
                partial_fill,
                filled: 0,
                insert_seq,
            });
            self.reorder_waiting();
            Ok(Vec::new())
        }
    }

    /// Natural ordering: (priority asc, arrival order asc) -- the lower the
    /// numeric priority, the sooner a request is serviced.
    fn reorder_waiting(&mut self) {
        self.waiting.make_contiguous().sort_by(|a, b| {
            a.priority.cmp(&b.priority).then_with(|| a.insert_seq.cmp(&b.insert_seq))
        });
    }

    /// Releases a previously granted allocation and greedily retries waiting
    /// requests in priority order, returning any newly-completed
    /// allocations (a request completes when `filled` reaches `amount`).
    pub fn release(
        &mut self,
        time: SimTime,
        allocation: Allocation,
        observers: &mut [&mut dyn Observer],
    ) -> Result<Vec<(RequestId, Allocation)>, SimError> {
        if allocation.resource != self.id {
            return Err(SimError::InvalidState(format!(
                "allocation {} does not belong to resource '{}'",
                allocation.id, self.name
            )));
        }
        self.in_use.decrement(time, allocation.amount as f64, observers)?;
        self.last_release_time = time;

        let mut completed = Vec::new();
        while let Some(front) = self.waiting.front() {
            let remaining = front.amount - front.filled;
            let grantable = self.available().min(remaining);
            if grantable == 0 {
                break;
            }
            let mut request = self.waiting.pop_front().unwrap();
            self.in_use.increment(time, grantable as f64, observers)?;
            request.filled += grantable;
            let alloc =
                Allocation { id: self.next_allocation_id(), resource: self.id, entity: request.entity, amount: grantable };
            if request.filled >= request.amount {
                completed.push((request.id, alloc));
            } else {
                completed.push((request.id, alloc));
                self.waiting.push_front(request);
                break;
            }
        }
        Ok(completed)
    }

    pub fn clear_statistics(&mut self, time: SimTime) {
        self.in_use.clear_statistics(time);
    }

    pub fn roll_batch(&mut self, time: SimTime) {
        self.in_use.roll_batch(time);
    }

    pub fn utilization_summary(&self) -> crate::variable::Summary {
        self.in_use.summary()
    }

    pub fn batched_utilization_summary(&self, plan: crate::stats::batching::BatchPlan) -> crate::variable::Summary {
        self.in_use.batched_summary(plan)
    }

    pub fn utilization_integral(&self, time: SimTime) -> (f64, f64) {
        self.in_use.integral_through(time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    Cyclical,
}

/// A named pool of resources, selected from by `SelectionRule`.
pub struct ResourceSet {
    id: ElementId,
    name: String,
    members: Vec<ResourceId>,
    rule: SelectionRule,
}

impl ResourceSet {
    pub fn new(id: ElementId, name: impl Into<String>, members: Vec<ResourceId>, rule: SelectionRule) -> Self {
        Self { id, name: name.into(), members, rule }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Picks which member to try first. `Cyclical` always chooses the member
    /// that has gone longest since its last release, so load spreads evenly
    /// instead of draining the first-listed resource.
    pub fn select<'a>(&self, resources: &'a [Resource], now: SimTime) -> Option<&'a Resource> {
        match self.rule {
            SelectionRule::Cyclical => self
                .members
                .iter()
                .filter_map(|id| resources.iter().find(|r| r.id() == *id))
                .max_by(|a, b| {
                    a.time_since_last_release(now)
                        .partial_cmp(&b.time_since_last_release(now))
                        .unwrap()
                }),
        }
    }

    pub fn members(&self) -> &[ResourceId] {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_seize_then_release_frees_capacity() {
        let mut r = Resource::new(0, "server", 2, 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        let allocs = r.seize(0.0, 0, 1, 2, 0, false, &mut observers).unwrap();
        assert_eq!(allocs.len(), 1);
        assert_eq!(r.available(), 0);
        r.release(1.0, allocs[0], &mut observers).unwrap();
        assert_eq!(r.available(), 2);
    }

    #[test]
    fn over_capacity_seize_is_rejected() {
        let mut r = Resource::new(0, "server", 1, 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        let err = r.seize(0.0, 0, 1, 2, 0, false, &mut observers).unwrap_err();
        assert!(matches!(err, SimError::RangeExceeded(_)));
    }

    #[test]
    fn waiting_request_completes_on_release() {
        let mut r = Resource::new(0, "server", 1, 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        let first = r.seize(0.0, 0, 1, 1, 0, false, &mut observers).unwrap();
        let second = r.seize(0.0, 1, 2, 1, 0, false, &mut observers).unwrap();
        assert!(second.is_empty());
        let completed = r.release(1.0, first[0], &mut observers).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].0, 1);
    }

    #[test]
    fn priority_request_jumps_the_line() {
        let mut r = Resource::new(0, "server", 1, 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        let first = r.seize(0.0, 0, 1, 1, 0, false, &mut observers).unwrap();
        r.seize(0.0, 1, 2, 1, 10, false, &mut observers).unwrap(); // low priority (10), waits
        r.seize(0.0, 2, 3, 1, 0, false, &mut observers).unwrap(); // high priority (0), waits
        let completed = r.release(1.0, first[0], &mut observers).unwrap();
        assert_eq!(completed[0].0, 2); // lower priority value wins
    }
}
