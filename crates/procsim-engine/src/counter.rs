//! # procsim-engine::counter
//!
//! `Counter`: a non-negative integer count whose trajectory over time is
//! itself a time-weighted `Variable` (its value's time-average is a
//! meaningful statistic -- e.g. the average number of busy servers). A
//! `Counter` never goes negative; decrementing past zero is a logic error in
//! the model, not a recoverable runtime condition the caller should ignore.

use crate::variable::{Observer, Variable, VariableKind};
use procsim_types::errors::SimError;
use procsim_types::id::ElementId;
use procsim_types::time::SimTime;

pub struct Counter {
    id: ElementId,
    value: Variable,
    /// The value at which this counter's limit listener fires, if one is set.
    counter_limit: Option<f64>,
    /// Whether the limit has already fired this replication -- the listener
    /// fires exactly once per replication, the first time `value >=
    /// counter_limit`, not on every increment past it.
    limit_fired: bool,
}

impl Counter {
    pub fn new(id: ElementId, name: impl Into<String>, start_time: SimTime) -> Self {
        Self {
            id,
            value: Variable::new(name, VariableKind::TimeWeighted, 0.0, start_time),
            counter_limit: None,
            limit_fired: false,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn current(&self) -> f64 {
        self.value.current_value()
    }

    pub fn set_counter_limit(&mut self, limit: f64) {
        self.counter_limit = Some(limit);
    }

    /// Increments the counter, returning `true` exactly once -- the call
    /// that first carries the value across `counter_limit` -- so the caller
    /// can fire whatever one-shot action the limit guards (e.g. ending a
    /// generator early). Returns `false` on every other call, including
    /// calls after the limit has already fired.
    pub fn increment(&mut self, time: SimTime, by: f64, observers: &mut [&mut dyn Observer]) -> Result<bool, SimError> {
        let next = self.value.current_value() + by;
        self.value.set_value(time, next, observers)?;
        if !self.limit_fired {
            if let Some(limit) = self.counter_limit {
                if next >= limit {
                    self.limit_fired = true;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    pub fn decrement(&mut self, time: SimTime, by: f64, observers: &mut [&mut dyn Observer]) -> Result<(), SimError> {
        let next = self.value.current_value() - by;
        if next < 0.0 {
            return Err(SimError::InvalidState(format!(
                "counter '{}' would go negative ({})",
                self.value.name(),
                next
            )));
        }
        self.value.set_value(time, next, observers)
    }

    pub fn clear_statistics(&mut self, time: SimTime) {
        self.value.clear_statistics(time);
        self.limit_fired = false;
    }

    pub fn roll_batch(&mut self, time: SimTime) {
        self.value.roll_batch(time);
    }

    pub fn summary(&self) -> crate::variable::Summary {
        self.value.summary()
    }

    pub fn batched_summary(&self, plan: crate::stats::batching::BatchPlan) -> crate::variable::Summary {
        self.value.batched_summary(plan)
    }

    pub fn integral_through(&self, time: SimTime) -> (f64, f64) {
        self.value.integral_through(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_decrement_below_zero() {
        let mut c = Counter::new(0, "busy_servers", 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        let err = c.decrement(1.0, 1.0, &mut observers).unwrap_err();
        assert!(matches!(err, SimError::InvalidState(_)));
    }

    #[test]
    fn limit_fires_exactly_once() {
        let mut c = Counter::new(0, "arrivals", 0.0);
        c.set_counter_limit(3.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        assert!(!c.increment(1.0, 2.0, &mut observers).unwrap());
        assert!(c.increment(2.0, 1.0, &mut observers).unwrap());
        assert!(!c.increment(3.0, 1.0, &mut observers).unwrap());
    }

    #[test]
    fn increment_then_decrement_round_trips() {
        let mut c = Counter::new(0, "busy_servers", 0.0);
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        c.increment(1.0, 3.0, &mut observers).unwrap();
        assert_eq!(c.current(), 3.0);
        c.decrement(2.0, 3.0, &mut observers).unwrap();
        assert_eq!(c.current(), 0.0);
    }
}
