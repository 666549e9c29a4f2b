//! # procsim-engine::stats::interval
//!
//! `ResponseInterval`: a `ModelElement` that snapshots a source's cumulative
//! totals when its observation interval opens and again when it closes,
//! recording one observation of its own `Variable` from the difference --
//! a time-weighted within-interval average for utilization/queue-length
//! sources, a plain count delta for a counter source. Scheduled by
//! `Simulation` via `ResponseSchedule` the same way warm-up and batch
//! boundaries are scheduled.

use crate::model::{ElementBase, ModelCtx, ModelElement};
use crate::variable::{Variable, VariableKind};
use procsim_types::id::{ElementId, QueueId, ResourceId};
use procsim_types::time::SimTime;

/// What a `ResponseInterval` snapshots at the start and end of each interval.
#[derive(Debug, Clone, Copy)]
pub enum IntervalSource {
    ResourceUtilization(ResourceId),
    QueueLength(QueueId),
    /// A resource's current in-use count, read as a plain count rather than
    /// a time-weighted average: the interval observation is end-count minus
    /// start-count.
    Counter(ResourceId),
}

/// A source's cumulative state at the instant it was taken.
#[derive(Debug, Clone, Copy)]
enum Snapshot {
    /// Running `(sum, weight)` of a time-weighted source through the
    /// snapshot instant.
    Weighted { sum: f64, weight: f64 },
    Counter(f64),
}

/// Combines an opening and closing snapshot of the same source into one
/// interval observation: `(sum delta) / (weight delta)` for a time-weighted
/// pair, or a plain difference for a counter pair. Mismatched variants (which
/// can't happen in practice, since both come from the same `IntervalSource`)
/// fall back to `0.0`.
fn combine(open: Snapshot, close: Snapshot) -> f64 {
    match (open, close) {
        (Snapshot::Weighted { sum: s0, weight: w0 }, Snapshot::Weighted { sum: s1, weight: w1 }) => {
            let weight_delta = w1 - w0;
            if weight_delta > 0.0 {
                (s1 - s0) / weight_delta
            } else {
                0.0
            }
        }
        (Snapshot::Counter(c0), Snapshot::Counter(c1)) => c1 - c0,
        _ => 0.0,
    }
}

pub struct ResponseInterval {
    base: ElementBase,
    source: IntervalSource,
    value: Variable,
    open_snapshot: Snapshot,
}

impl ResponseInterval {
    pub fn new(id: ElementId, name: impl Into<String>, source: IntervalSource, start_time: SimTime) -> Self {
        let name = name.into();
        Self {
            base: ElementBase::new(id, name.clone()),
            source,
            value: Variable::new(name, VariableKind::Observational, 0.0, start_time),
            open_snapshot: Snapshot::Counter(0.0),
        }
    }

    pub fn summary(&self) -> crate::variable::Summary {
        self.value.summary()
    }

    fn snapshot(&self, model: &crate::model::Model, time: SimTime) -> Snapshot {
        match self.source {
            IntervalSource::ResourceUtilization(id) => {
                let (sum, weight) = model.resource(id).map(|r| r.utilization_integral(time)).unwrap_or((0.0, 0.0));
                Snapshot::Weighted { sum, weight }
            }
            IntervalSource::QueueLength(id) => {
                let (sum, weight) = model.queue(id).map(|q| q.length_integral(time)).unwrap_or((0.0, 0.0));
                Snapshot::Weighted { sum, weight }
            }
            IntervalSource::Counter(id) => {
                Snapshot::Counter(model.resource(id).map(|r| r.in_use()).unwrap_or(0.0))
            }
        }
    }
}

impl ModelElement for ResponseInterval {
    fn id(&self) -> ElementId {
        self.base.id
    }

    fn name(&self) -> &str {
        &self.base.name
    }

    fn on_response_interval_start(&mut self, ctx: &mut ModelCtx) {
        let now = ctx.now();
        self.open_snapshot = self.snapshot(ctx.model(), now);
    }

    fn on_response_interval_end(&mut self, ctx: &mut ModelCtx) {
        let now = ctx.now();
        let close_snapshot = self.snapshot(ctx.model(), now);
        let observation = combine(self.open_snapshot, close_snapshot);
        ctx.with_observers(|obs| self.value.set_value(now, observation, obs)).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{Queue, QueueDiscipline};
    use crate::variable::Observer;

    #[test]
    fn weighted_combine_divides_sum_delta_by_weight_delta() {
        let open = Snapshot::Weighted { sum: 10.0, weight: 5.0 };
        let close = Snapshot::Weighted { sum: 25.0, weight: 10.0 };
        // (25 - 10) / (10 - 5) = 3.0
        assert!((combine(open, close) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_combine_is_zero_when_interval_has_no_duration() {
        let open = Snapshot::Weighted { sum: 4.0, weight: 2.0 };
        let close = Snapshot::Weighted { sum: 4.0, weight: 2.0 };
        assert_eq!(combine(open, close), 0.0);
    }

    #[test]
    fn counter_combine_is_a_plain_delta() {
        let open = Snapshot::Counter(3.0);
        let close = Snapshot::Counter(8.0);
        assert_eq!(combine(open, close), 5.0);
    }

    #[test]
    fn snapshot_reads_live_queue_length_integral() {
        let mut model = crate::model::Model::new();
        let mut q = Queue::new(0, "q", QueueDiscipline::Fifo, 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        q.enqueue(0.0, 1, 0, &mut observers).unwrap();
        q.enqueue(1.0, 2, 0, &mut observers).unwrap();
        model.queues.push(q);

        let response = ResponseInterval::new(1, "q_len_delta", IntervalSource::QueueLength(0), 0.0);
        // length held at 1 for [0,1), then 2 for [1,3): sum = 1*1 + 2*2 = 5, weight = 3.
        match response.snapshot(&model, 3.0) {
            Snapshot::Weighted { sum, weight } => {
                assert!((sum - 5.0).abs() < 1e-9);
                assert!((weight - 3.0).abs() < 1e-9);
            }
            Snapshot::Counter(_) => panic!("expected a weighted snapshot"),
        }
    }
}
