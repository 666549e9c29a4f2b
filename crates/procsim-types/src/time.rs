//! # procsim-types::time
//!
//! Defines the representation of time within the simulation.
//! Simulated durations are drawn from continuous probability distributions
//! (exponential service times, Gamma arrival counts, piecewise-linear NHPP
//! rates), so simulation time is a finite `f64` rather than an integer count
//! of ticks.

/// The fundamental unit of time in the simulation.
/// Invariant: a `SimTime` value used as an event time is always finite and
/// non-negative; `NaN` must never reach the event queue (see
/// `procsim_engine::executive::Queued::cmp`, which panics if it does, since a
/// NaN comparison can't be resolved into a well-formed ordering).
pub type SimTime = f64;

/// The start of simulation time.
pub const SIM_EPOCH: SimTime = 0.0;

/// A "never happens" horizon, used as the effective duration of delays/faults
/// that are meant to be permanent until explicitly superseded.
pub const MAX_SIM_TIME: SimTime = f64::MAX;

/// Returns `true` if `t` is usable as an event time: finite and non-negative.
pub fn is_valid_event_time(t: SimTime) -> bool {
    t.is_finite() && t >= 0.0
}
