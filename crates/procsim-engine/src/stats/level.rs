//! # procsim-engine::stats::level
//!
//! `LevelResponse`: a level-crossing `Observer` attached to a `Variable`.
//! Partitions time into "at or above threshold" and "below threshold",
//! accumulating sojourn time and distance-from-threshold on each side, and
//! counting up/down transitions -- the same `Observer` seam the trace
//! pipeline (`telemetry::TraceObserver`) plugs into, reused here for a
//! different statistic rather than a new dispatch mechanism.

use crate::variable::Observer;
use procsim_types::time::SimTime;

pub struct LevelResponse {
    name: String,
    threshold: f64,
    time_above: SimTime,
    time_below: SimTime,
    distance_above_integral: f64,
    distance_below_integral: f64,
    max_distance_above: f64,
    max_distance_below: f64,
    sum_sq_distance: f64,
    current_run: SimTime,
    sojourn_above_total: SimTime,
    sojourn_above_count: u64,
    sojourn_above_max: SimTime,
    sojourn_below_total: SimTime,
    sojourn_below_count: u64,
    sojourn_below_max: SimTime,
    transitions_up: u64,
    transitions_down: u64,
    /// Confines collection to `[t0, t0 + d]` when set; observations outside
    /// the window are ignored entirely.
    window: Option<(SimTime, SimTime)>,
}

impl LevelResponse {
    /// `initial_value` fixes which side of the threshold the first
    /// observation's `previous_value` is taken to start on; it isn't stored,
    /// since every later transition is detected fresh from each
    /// observation's own `previous_value`/`new_value` pair.
    pub fn new(name: impl Into<String>, threshold: f64, initial_value: f64) -> Self {
        let _ = initial_value;
        Self {
            name: name.into(),
            threshold,
            time_above: 0.0,
            time_below: 0.0,
            distance_above_integral: 0.0,
            distance_below_integral: 0.0,
            max_distance_above: 0.0,
            max_distance_below: 0.0,
            sum_sq_distance: 0.0,
            current_run: 0.0,
            sojourn_above_total: 0.0,
            sojourn_above_count: 0,
            sojourn_above_max: 0.0,
            sojourn_below_total: 0.0,
            sojourn_below_count: 0,
            sojourn_below_max: 0.0,
            transitions_up: 0,
            transitions_down: 0,
            window: None,
        }
    }

    pub fn with_window(mut self, t0: SimTime, duration: SimTime) -> Self {
        self.window = Some((t0, t0 + duration));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time_above(&self) -> SimTime {
        self.time_above
    }

    pub fn time_below(&self) -> SimTime {
        self.time_below
    }

    /// Fraction of observed time spent at or above the threshold; `0.0` if
    /// nothing has been observed yet.
    pub fn proportion_above(&self) -> f64 {
        let total = self.time_above + self.time_below;
        if total > 0.0 {
            self.time_above / total
        } else {
            0.0
        }
    }

    pub fn distance_above_average(&self) -> f64 {
        if self.time_above > 0.0 {
            self.distance_above_integral / self.time_above
        } else {
            0.0
        }
    }

    pub fn distance_below_average(&self) -> f64 {
        if self.time_below > 0.0 {
            self.distance_below_integral / self.time_below
        } else {
            0.0
        }
    }

    pub fn max_distance_above(&self) -> f64 {
        self.max_distance_above
    }

    pub fn max_distance_below(&self) -> f64 {
        self.max_distance_below
    }

    /// The RMS distance of the source variable from the threshold, over the
    /// whole observed time (both sides combined).
    pub fn deviation(&self) -> f64 {
        let total = self.time_above + self.time_below;
        if total > 0.0 {
            (self.sum_sq_distance / total).sqrt()
        } else {
            0.0
        }
    }

    pub fn transitions_up(&self) -> u64 {
        self.transitions_up
    }

    pub fn transitions_down(&self) -> u64 {
        self.transitions_down
    }

    pub fn transition_count(&self) -> u64 {
        self.transitions_up + self.transitions_down
    }

    /// `P(next transition is up | a transition occurs)`. Not conditioned on
    /// dwell time, just the empirical split between the two transition kinds.
    pub fn transition_probability_up(&self) -> f64 {
        let total = self.transition_count();
        if total > 0 {
            self.transitions_up as f64 / total as f64
        } else {
            0.0
        }
    }

    pub fn transition_probability_down(&self) -> f64 {
        let total = self.transition_count();
        if total > 0 {
            self.transitions_down as f64 / total as f64
        } else {
            0.0
        }
    }

    pub fn average_sojourn_above(&self) -> SimTime {
        if self.sojourn_above_count > 0 {
            self.sojourn_above_total / self.sojourn_above_count as f64
        } else {
            0.0
        }
    }

    pub fn average_sojourn_below(&self) -> SimTime {
        if self.sojourn_below_count > 0 {
            self.sojourn_below_total / self.sojourn_below_count as f64
        } else {
            0.0
        }
    }

    pub fn max_sojourn_above(&self) -> SimTime {
        self.sojourn_above_max
    }

    pub fn max_sojourn_below(&self) -> SimTime {
        self.sojourn_below_max
    }

    fn in_window(&self, time: SimTime) -> bool {
        match self.window {
            Some((t0, t1)) => time >= t0 && time <= t1,
            None => true,
        }
    }
}

impl Observer for LevelResponse {
    /// `weight` is how long `previous_value` was held (the source variable
    /// must be time-weighted for this partition to mean anything); that
    /// duration, and the distance `previous_value` sat from the threshold,
    /// is attributed to whichever side `previous_value` was on, then the new
    /// value's side is checked for a transition.
    fn on_observe(&mut self, time: SimTime, previous_value: f64, new_value: f64, weight: f64) {
        if !self.in_window(time) {
            return;
        }
        let prev_above = previous_value >= self.threshold;
        let distance = if prev_above {
            previous_value - self.threshold
        } else {
            self.threshold - previous_value
        };
        if prev_above {
            self.time_above += weight;
            self.distance_above_integral += distance * weight;
            self.max_distance_above = self.max_distance_above.max(distance);
        } else {
            self.time_below += weight;
            self.distance_below_integral += distance * weight;
            self.max_distance_below = self.max_distance_below.max(distance);
        }
        self.sum_sq_distance += distance * distance * weight;
        self.current_run += weight;

        let now_above = new_value >= self.threshold;
        if now_above != prev_above {
            if prev_above {
                self.sojourn_above_total += self.current_run;
                self.sojourn_above_count += 1;
                self.sojourn_above_max = self.sojourn_above_max.max(self.current_run);
                self.transitions_down += 1;
            } else {
                self.sojourn_below_total += self.current_run;
                self.sojourn_below_count += 1;
                self.sojourn_below_max = self.sojourn_below_max.max(self.current_run);
                self.transitions_up += 1;
            }
            self.current_run = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_time_by_threshold_side() {
        let mut level = LevelResponse::new("busy_servers >= 2", 2.0, 0.0);
        // held 0 for 1 unit (below), then 3 for 2 units (above), then 1 for 1 unit (below)
        level.on_observe(1.0, 0.0, 3.0, 1.0);
        level.on_observe(3.0, 3.0, 1.0, 2.0);
        level.on_observe(4.0, 1.0, 1.0, 1.0);
        assert_eq!(level.time_above(), 2.0);
        assert_eq!(level.time_below(), 2.0);
        assert_eq!(level.transition_count(), 2);
        assert_eq!(level.transitions_up(), 1);
        assert_eq!(level.transitions_down(), 1);
    }

    #[test]
    fn no_transition_when_staying_on_same_side() {
        let mut level = LevelResponse::new("x", 5.0, 10.0);
        level.on_observe(1.0, 10.0, 12.0, 1.0);
        level.on_observe(2.0, 12.0, 8.0, 1.0);
        assert_eq!(level.transition_count(), 0);
    }

    #[test]
    fn triangular_oscillation_matches_known_distances() {
        // A variable oscillating 0 <-> 2 once a time unit, threshold 1: each
        // half-cycle is a straight ramp, so the level-crossing observer sees
        // it as held at the ramp's starting value for the half-cycle
        // (a discrete-event sampler can't see the continuous ramp, only the
        // value changes posted to it). Post one observation per half-cycle
        // for 20 cycles (40 half-cycles of length 0.5) to approximate the
        // continuous 10 triangular-wave test from this statistic's spec,
        // at a scale a unit test can run in microseconds.
        let mut level = LevelResponse::new("wave", 1.0, 0.0);
        let mut value = 0.0;
        let mut t = 0.0;
        for _ in 0..40 {
            let next = if value == 0.0 { 2.0 } else { 0.0 };
            level.on_observe(t + 0.5, value, next, 0.5);
            value = next;
            t += 0.5;
        }
        assert_eq!(level.transitions_up(), 20);
        assert_eq!(level.transitions_down(), 20);
        assert!((level.proportion_above() - 0.5).abs() < 1e-9);
    }
}
