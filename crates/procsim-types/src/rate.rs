//! # procsim-types::rate
//!
//! The `RateFunction` trait used by the non-homogeneous Poisson process
//! generator (spec §4.9). A rate function is any time-varying arrival rate
//! with an invertible cumulative form; `procsim_engine::nhpp` supplies the
//! piecewise-linear implementation and the inter-event-time algorithm built
//! on top of this trait.

use crate::time::SimTime;

/// A non-negative, time-varying arrival rate with an invertible integral.
///
/// All cumulative-rate methods are defined relative to the rate function's
/// own time origin (`time_range_lower`), not the simulation clock; callers
/// are responsible for the translation.
pub trait RateFunction {
    /// The instantaneous rate at time `t`.
    fn rate(&self, t: SimTime) -> f64;

    /// The integral of `rate` from `time_range_lower()` to `t`.
    fn cumulative_rate(&self, t: SimTime) -> f64;

    /// The inverse of `cumulative_rate`: the time at which the cumulative
    /// rate reaches `y`. Defined for `y` in
    /// `[0, cumulative_rate(time_range_upper()))`.
    fn inverse_cumulative_rate(&self, y: f64) -> SimTime;

    /// The earliest time this rate function is defined for.
    fn time_range_lower(&self) -> SimTime;

    /// The latest time this rate function is defined for.
    fn time_range_upper(&self) -> SimTime;

    /// `cumulative_rate(time_range_lower())`, always `0.0` by construction.
    fn cumulative_rate_range_lower(&self) -> f64 {
        self.cumulative_rate(self.time_range_lower())
    }

    /// `cumulative_rate(time_range_upper())`: the total expected count of
    /// events over one full cycle of the rate function.
    fn cumulative_rate_range_upper(&self) -> f64 {
        self.cumulative_rate(self.time_range_upper())
    }

    /// The maximum instantaneous rate over the defined range, used to bound
    /// thinning-free inversion step sizes.
    fn maximum(&self) -> f64;

    /// The minimum instantaneous rate over the defined range.
    fn minimum(&self) -> f64;
}
