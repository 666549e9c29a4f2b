//! # procsim-engine::nhpp
//!
//! A non-homogeneous Poisson process generator driven by a piecewise-linear
//! rate function. The classic inversion algorithm: integrate the rate
//! function to get cumulative rate `R(t)`, draw an `Exponential(1)` step in
//! cumulative-rate space, and invert `R` to find the next event time. When
//! the requested time runs past the rate function's defined range, the
//! caller chooses what happens next via `CycleMode`.

use procsim_types::rate::RateFunction;
use procsim_types::time::SimTime;

/// One linear segment of a piecewise rate function: the rate at
/// `start_time` is `start_rate`, changing linearly to `end_rate` by
/// `end_time`.
#[derive(Debug, Clone, Copy)]
pub struct RateSegment {
    pub start_time: SimTime,
    pub end_time: SimTime,
    pub start_rate: f64,
    pub end_rate: f64,
}

impl RateSegment {
    fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    fn rate_at(&self, t: SimTime) -> f64 {
        let frac = (t - self.start_time) / self.duration();
        self.start_rate + frac * (self.end_rate - self.start_rate)
    }

    /// Integral of the rate over `[start_time, t]`, `t` within the segment.
    fn cumulative_at(&self, t: SimTime) -> f64 {
        let frac = (t - self.start_time) / self.duration();
        let avg_rate = self.start_rate + frac / 2.0 * (self.end_rate - self.start_rate);
        avg_rate * (t - self.start_time)
    }

    fn total_area(&self) -> f64 {
        (self.start_rate + self.end_rate) / 2.0 * self.duration()
    }
}

/// A rate function built from consecutive, contiguous `RateSegment`s.
pub struct PiecewiseRateFunction {
    segments: Vec<RateSegment>,
    /// Cumulative rate at the *start* of each segment.
    prefix: Vec<f64>,
}

impl PiecewiseRateFunction {
    /// `segments` must be sorted and contiguous (each segment's `start_time`
    /// equal to the previous one's `end_time`).
    pub fn new(segments: Vec<RateSegment>) -> Self {
        let mut prefix = Vec::with_capacity(segments.len() + 1);
        let mut acc = 0.0;
        prefix.push(0.0);
        for seg in &segments {
            acc += seg.total_area();
            prefix.push(acc);
        }
        Self { segments, prefix }
    }

    fn segment_index_for_time(&self, t: SimTime) -> usize {
        self.segments
            .iter()
            .position(|s| t < s.end_time)
            .unwrap_or(self.segments.len().saturating_sub(1))
    }

    fn segment_index_for_cumulative(&self, y: f64) -> usize {
        self.prefix
            .iter()
            .skip(1)
            .position(|&cum| y < cum)
            .unwrap_or(self.segments.len().saturating_sub(1))
    }
}

impl RateFunction for PiecewiseRateFunction {
    fn rate(&self, t: SimTime) -> f64 {
        let idx = self.segment_index_for_time(t);
        self.segments[idx].rate_at(t.clamp(self.segments[idx].start_time, self.segments[idx].end_time))
    }

    fn cumulative_rate(&self, t: SimTime) -> f64 {
        let idx = self.segment_index_for_time(t);
        let seg = &self.segments[idx];
        self.prefix[idx] + seg.cumulative_at(t.clamp(seg.start_time, seg.end_time))
    }

    fn inverse_cumulative_rate(&self, y: f64) -> SimTime {
        let idx = self.segment_index_for_cumulative(y);
        let seg = &self.segments[idx];
        let local_target = y - self.prefix[idx];

        // Solve avg_rate(t) * (t - start) == local_target for t, where
        // avg_rate is linear in t; this is a quadratic in (t - start).
        let a = seg.start_rate;
        let b = (seg.end_rate - seg.start_rate) / seg.duration();
        if b.abs() < 1e-12 {
            // constant-rate segment
            seg.start_time + local_target / a
        } else {
            // 0.5*b*x^2 + a*x - local_target = 0
            let disc = a * a + 2.0 * b * local_target;
            let x = (-a + disc.max(0.0).sqrt()) / b;
            seg.start_time + x
        }
    }

    fn time_range_lower(&self) -> SimTime {
        self.segments.first().map_or(0.0, |s| s.start_time)
    }

    fn time_range_upper(&self) -> SimTime {
        self.segments.last().map_or(0.0, |s| s.end_time)
    }

    fn maximum(&self) -> f64 {
        self.segments
            .iter()
            .flat_map(|s| [s.start_rate, s.end_rate])
            .fold(f64::MIN, f64::max)
    }

    fn minimum(&self) -> f64 {
        self.segments
            .iter()
            .flat_map(|s| [s.start_rate, s.end_rate])
            .fold(f64::MAX, f64::min)
    }
}

/// What happens when an inter-event draw would land past the rate
/// function's defined range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleMode {
    /// Wrap the excess cumulative rate back to the start of the range,
    /// using a floored-modulo residual so the wrap is exact regardless of
    /// how many full cycles were skipped.
    Repeat,
    /// Keep generating at the final segment's end rate indefinitely.
    HoldLastRate,
}

/// Draws the next event time for a non-homogeneous Poisson process with
/// rate function `rate_fn`, current time `from`, and cycling policy `mode`.
/// `unit_exponential` must be a draw from `Exponential(mean = 1.0)`.
pub fn next_event_time(
    rate_fn: &PiecewiseRateFunction,
    from: SimTime,
    unit_exponential: f64,
    mode: CycleMode,
) -> SimTime {
    let target_cumulative = rate_fn.cumulative_rate(from) + unit_exponential;
    let range_upper = rate_fn.cumulative_rate_range_upper();

    if target_cumulative <= range_upper {
        return rate_fn.inverse_cumulative_rate(target_cumulative);
    }

    match mode {
        CycleMode::Repeat => {
            let cycle_length = range_upper - rate_fn.cumulative_rate_range_lower();
            let residual = (target_cumulative - rate_fn.cumulative_rate_range_lower()).rem_euclid(cycle_length);
            let cycles_elapsed =
                ((target_cumulative - rate_fn.cumulative_rate_range_lower()) / cycle_length).floor();
            let period = rate_fn.time_range_upper() - rate_fn.time_range_lower();
            rate_fn.time_range_lower()
                + period * cycles_elapsed
                + (rate_fn.inverse_cumulative_rate(rate_fn.cumulative_rate_range_lower() + residual)
                    - rate_fn.time_range_lower())
        }
        CycleMode::HoldLastRate => {
            let last_rate = rate_fn.rate(rate_fn.time_range_upper());
            let overflow = target_cumulative - range_upper;
            rate_fn.time_range_upper() + overflow / last_rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_rate(rate: f64, upper: SimTime) -> PiecewiseRateFunction {
        PiecewiseRateFunction::new(vec![RateSegment {
            start_time: 0.0,
            end_time: upper,
            start_rate: rate,
            end_rate: rate,
        }])
    }

    #[test]
    fn constant_rate_cumulative_is_linear() {
        let rf = flat_rate(2.0, 10.0);
        assert!((rf.cumulative_rate(5.0) - 10.0).abs() < 1e-9);
        assert!((rf.inverse_cumulative_rate(10.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn next_event_time_matches_homogeneous_poisson() {
        let rf = flat_rate(1.0, 1000.0);
        let t = next_event_time(&rf, 0.0, 3.0, CycleMode::Repeat);
        assert!((t - 3.0).abs() < 1e-9);
    }

    #[test]
    fn repeat_mode_wraps_past_range_end() {
        let rf = flat_rate(1.0, 10.0);
        // current time near the end, draw pushes well past range_upper=10
        let t = next_event_time(&rf, 9.0, 5.0, CycleMode::Repeat);
        assert!(t >= 0.0 && t < 10.0 + 9.0);
    }

    #[test]
    fn hold_last_rate_extends_linearly() {
        let rf = flat_rate(2.0, 10.0);
        let t = next_event_time(&rf, 9.0, 10.0, CycleMode::HoldLastRate);
        // cumulative at t=9 is 18, target = 28, range_upper = 20, overflow = 8, rate=2 -> +4
        assert!((t - 14.0).abs() < 1e-6);
    }
}
