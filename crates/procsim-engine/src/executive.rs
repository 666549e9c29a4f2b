//! # procsim-engine::executive
//!
//! The event executive: the master clock and priority-ordered pending-event
//! set. Grounded directly in the teacher's `events.rs`/`sim.rs` `BinaryHeap`
//! discipline, generalized from network message/timer/fault events to the
//! generic entity-flow events a process-view model schedules.
//!
//! Tie-breaking differs from the teacher in one respect: there, discriminant
//! was a tertiary key behind a unique `insert_seq`, so it never actually
//! affected ordering. Here, priority band is load-bearing (warm-up end and
//! response-interval boundaries must run before/after ordinary activity
//! events at the same instant), so it is promoted to the secondary key and
//! `insert_seq` becomes the final, purely-deterministic tiebreak.

use procsim_types::id::{ElementId, EntityId, EventId};
use procsim_types::time::SimTime;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// All events the executive can schedule. Each variant names the element(s)
/// it concerns; the element looks itself up in the `Model` arena when the
/// event fires.
#[derive(Debug, Clone)]
pub enum Event {
    /// A `Generator` element should create and route its next entity.
    EntityArrival { generator: ElementId },
    /// An entity finishes the delay portion of an activity and should
    /// proceed to release any seized resources and route onward.
    ActivityEnd { entity: EntityId, activity: ElementId },
    /// The warm-up period has ended; every statistic must be cleared.
    WarmupEnd,
    /// A response's observation interval opens.
    ResponseIntervalStart { response: ElementId },
    /// A response's observation interval closes and its value is recorded.
    ResponseIntervalEnd { response: ElementId },
    /// A batching boundary for across-replication batch-means statistics.
    BatchBoundary,
    /// An element's registered timed-update cadence tick.
    TimedUpdate { element: ElementId },
}

/// A discriminant combining a priority band with the originating element,
/// used only for stable tie-breaking within one instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventDiscriminant(u8, ElementId);

impl EventDiscriminant {
    /// Ascending dispatch order at a shared instant: ordinary model activity
    /// first, then warm-up, then a response interval's open/close, then a
    /// batch boundary -- so a batch or response boundary always sees every
    /// ordinary event scheduled for the same instant before it fires.
    pub const PRIORITY_DEFAULT: u8 = 0;
    pub const PRIORITY_WARMUP: u8 = 1;
    pub const PRIORITY_RESPONSE_INTERVAL_START: u8 = 2;
    pub const PRIORITY_RESPONSE_INTERVAL_END: u8 = 3;
    pub const PRIORITY_BATCH: u8 = 4;

    pub fn default_for(element: ElementId) -> Self {
        Self(Self::PRIORITY_DEFAULT, element)
    }

    pub fn warmup() -> Self {
        Self(Self::PRIORITY_WARMUP, ElementId::MAX)
    }

    pub fn response_interval_start(element: ElementId) -> Self {
        Self(Self::PRIORITY_RESPONSE_INTERVAL_START, element)
    }

    pub fn response_interval_end(element: ElementId) -> Self {
        Self(Self::PRIORITY_RESPONSE_INTERVAL_END, element)
    }

    pub fn batch() -> Self {
        Self(Self::PRIORITY_BATCH, ElementId::MAX)
    }
}

/// A wrapper for an `Event` carrying its scheduling metadata. This is the
/// type stored in the executive's `BinaryHeap`.
#[derive(Debug)]
pub struct Queued<T> {
    pub id: EventId,
    pub time: SimTime,
    pub insert_seq: u64,
    pub discriminant: EventDiscriminant,
    pub payload: T,
}

impl<T> Queued<T> {
    pub fn new(id: EventId, time: SimTime, insert_seq: u64, discriminant: EventDiscriminant, payload: T) -> Self {
        Self { id, time, insert_seq, discriminant, payload }
    }
}

impl<T> PartialEq for Queued<T> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.insert_seq == other.insert_seq && self.discriminant == other.discriminant
    }
}

impl<T> Eq for Queued<T> {}

impl<T> PartialOrd for Queued<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Queued<T> {
    /// `BinaryHeap` is a max-heap; reversing every key makes it behave as a
    /// min-heap over `(time, priority, insert_seq)`. Panics if either time is
    /// `NaN`, since that can't be resolved into a well-formed ordering and a
    /// `NaN` event time is always a scheduling bug, never valid input.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .partial_cmp(&self.time)
            .expect("event time must be comparable (NaN reached the event queue)")
            .then_with(|| other.discriminant.0.cmp(&self.discriminant.0))
            .then_with(|| other.insert_seq.cmp(&self.insert_seq))
    }
}

/// The priority-ordered pending-event set and logical clock.
///
/// `Executive` owns only scheduling; it knows nothing about what an `Event`
/// means. `Simulation` (in `crate::simulation`) pops events from it and
/// dispatches them to the model.
#[derive(Debug)]
pub struct Executive {
    clock: SimTime,
    queue: BinaryHeap<Queued<Event>>,
    next_event_id: EventId,
    next_insert_seq: u64,
}

impl Executive {
    pub fn new() -> Self {
        Self {
            clock: procsim_types::time::SIM_EPOCH,
            queue: BinaryHeap::new(),
            next_event_id: 0,
            next_insert_seq: 0,
        }
    }

    pub fn now(&self) -> SimTime {
        self.clock
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|q| q.time)
    }

    /// Schedules `event` to fire at `when`, which must be `>=` the current
    /// clock. Returns the new event's id so callers can cancel it later.
    pub fn schedule_at(&mut self, when: SimTime, discriminant: EventDiscriminant, event: Event) -> EventId {
        assert!(
            procsim_types::time::is_valid_event_time(when) && when >= self.clock,
            "cannot schedule an event in the past or at a non-finite time"
        );
        let id = self.next_event_id;
        self.next_event_id += 1;
        let seq = self.next_insert_seq;
        self.next_insert_seq += 1;
        self.queue.push(Queued::new(id, when, seq, discriminant, event));
        id
    }

    /// Pops the next event in priority order and advances the clock to its
    /// time. Returns `None` once the queue is empty.
    pub fn pop(&mut self) -> Option<Queued<Event>> {
        let queued = self.queue.pop()?;
        assert!(queued.time >= self.clock, "executive clock moved backwards");
        self.clock = queued.time;
        Some(queued)
    }

    /// Removes every queued event for which `predicate` returns `true`. Used
    /// to cancel an entity's pending `ActivityEnd` when an upstream change
    /// (e.g. a resource preemption) invalidates it.
    pub fn cancel_if(&mut self, predicate: impl Fn(&Event) -> bool) {
        let remaining: Vec<_> = self.queue.drain().filter(|q| !predicate(&q.payload)).collect();
        self.queue = BinaryHeap::from(remaining);
    }
}

impl Default for Executive {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut exec = Executive::new();
        exec.schedule_at(5.0, EventDiscriminant::default_for(0), Event::WarmupEnd);
        exec.schedule_at(1.0, EventDiscriminant::default_for(0), Event::WarmupEnd);
        exec.schedule_at(3.0, EventDiscriminant::default_for(0), Event::WarmupEnd);
        let mut times = Vec::new();
        while let Some(q) = exec.pop() {
            times.push(q.time);
        }
        assert_eq!(times, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn same_time_breaks_ties_by_priority_then_insertion() {
        let mut exec = Executive::new();
        exec.schedule_at(1.0, EventDiscriminant::warmup(), Event::WarmupEnd);
        exec.schedule_at(1.0, EventDiscriminant::response_interval_end(0), Event::ResponseIntervalEnd { response: 0 });
        exec.schedule_at(1.0, EventDiscriminant::default_for(0), Event::WarmupEnd);

        let first = exec.pop().unwrap();
        assert!(matches!(first.payload, Event::WarmupEnd) && first.discriminant.0 == EventDiscriminant::PRIORITY_DEFAULT);
        let second = exec.pop().unwrap();
        assert!(matches!(second.payload, Event::WarmupEnd) && second.discriminant.0 == EventDiscriminant::PRIORITY_WARMUP);
        let third = exec.pop().unwrap();
        assert!(matches!(third.payload, Event::ResponseIntervalEnd { .. }));
    }

    #[test]
    #[should_panic(expected = "cannot schedule an event in the past")]
    fn rejects_scheduling_before_clock() {
        let mut exec = Executive::new();
        exec.schedule_at(5.0, EventDiscriminant::default_for(0), Event::WarmupEnd);
        let _ = exec.pop();
        exec.schedule_at(1.0, EventDiscriminant::default_for(0), Event::WarmupEnd);
    }
}
