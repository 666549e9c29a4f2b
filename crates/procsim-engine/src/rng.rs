//! # procsim-engine::rng
//!
//! Defines the discipline for drawing simulation randomness. Every concrete
//! probability variate is bound to its own named substream of one seeded
//! master `ChaCha20Rng`, selected via `ChaCha20Rng::set_stream`, so that two
//! variates never share draws and a single stream can be independently reset
//! or advanced (spec's variate stream management, GLOSSARY "substream").
//!
//! All inversions are uniform-based: every `DistSpec` variant draws one (or,
//! for `Discrete`, one) uniform deviate and maps it through the
//! distribution's inverse CDF. This is what makes `set_antithetic` a single
//! well-defined operation (`u -> 1 - u`) across every distribution, the same
//! inversion discipline `crate::nhpp` uses for the rate function.

use procsim_types::config::DistSpec;
use procsim_types::id::StreamId;
use procsim_types::variate::RandomSource;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::BTreeMap;

/// A wrapper around the master RNG to enforce recording of its usage.
/// Only used for the handful of draws that don't go through a `Variate`
/// (e.g. resource selection-rule tie-breaking).
pub struct RngDiscipline<'a> {
    rng: &'a mut ChaCha20Rng,
    recorder: &'a mut Recorder,
    site_label: &'static str,
}

impl<'a> RngDiscipline<'a> {
    pub fn new(rng: &'a mut ChaCha20Rng, recorder: &'a mut Recorder, site_label: &'static str) -> Self {
        Self { rng, recorder, site_label }
    }
}

impl<'a> RngCore for RngDiscipline<'a> {
    fn next_u32(&mut self) -> u32 {
        self.recorder.record_draw(self.site_label);
        self.rng.next_u32()
    }
    fn next_u64(&mut self) -> u64 {
        self.recorder.record_draw(self.site_label);
        self.rng.next_u64()
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.recorder.record_draw(self.site_label);
        self.rng.fill_bytes(dest)
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.recorder.record_draw(self.site_label);
        self.rng.try_fill_bytes(dest)
    }
}

/// Records the number of draws made at each named site, for auditing a
/// replication's randomness consumption.
#[derive(Debug, Default)]
pub struct Recorder {
    seed: u64,
    rng_sites: BTreeMap<&'static str, u64>,
}

impl Recorder {
    pub fn new(seed: u64) -> Self {
        Self { seed, rng_sites: BTreeMap::new() }
    }

    pub fn record_draw(&mut self, site_label: &'static str) {
        *self.rng_sites.entry(site_label).or_insert(0) += 1;
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn sites(&self) -> &BTreeMap<&'static str, u64> {
        &self.rng_sites
    }
}

/// A concrete `RandomSource` over one of the distributions in `DistSpec`,
/// bound to its own named substream of the replication's master seed.
pub struct Variate {
    kind: VariateKind,
    rng: ChaCha20Rng,
    base_seed: u64,
    stream_id: StreamId,
    antithetic: bool,
}

#[derive(Debug, Clone)]
enum VariateKind {
    Constant(f64),
    Uniform { lo: f64, hi: f64 },
    Exponential { mean: f64 },
    Normal { mean: f64, std_dev: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Bernoulli { p: f64 },
    Discrete { weights: Vec<f64> },
}

impl Variate {
    /// Builds a variate for `spec`, bound to substream `stream_id` of the
    /// replication seeded by `base_seed`.
    pub fn from_spec(spec: &DistSpec, stream_id: StreamId, base_seed: u64) -> Self {
        let kind = match spec.clone() {
            DistSpec::Constant(v) => VariateKind::Constant(v),
            DistSpec::Uniform { lo, hi } => VariateKind::Uniform { lo, hi },
            DistSpec::Exponential { mean } => VariateKind::Exponential { mean },
            DistSpec::Normal { mean, std_dev } => VariateKind::Normal { mean, std_dev },
            DistSpec::Triangular { min, mode, max } => VariateKind::Triangular { min, mode, max },
            DistSpec::Bernoulli { p } => VariateKind::Bernoulli { p },
            DistSpec::Discrete { weights } => VariateKind::Discrete { weights },
        };
        let mut rng = ChaCha20Rng::seed_from_u64(base_seed);
        rng.set_stream(stream_id as u64);
        Self { kind, rng, base_seed, stream_id, antithetic: false }
    }

    fn uniform(&mut self) -> f64 {
        let u: f64 = self.rng.gen();
        if self.antithetic {
            1.0 - u
        } else {
            u
        }
    }
}

impl RandomSource for Variate {
    fn get_value(&mut self) -> f64 {
        match self.kind.clone() {
            VariateKind::Constant(v) => v,
            VariateKind::Uniform { lo, hi } => {
                let u = self.uniform();
                lo + u * (hi - lo)
            }
            VariateKind::Exponential { mean } => {
                let u = self.uniform();
                // ln(1 - u) is well-defined for u in [0, 1); u == 1.0 only if
                // the RNG produced exactly 1.0, which `rng.gen::<f64>()` never does.
                -mean * (1.0 - u).ln()
            }
            VariateKind::Normal { mean, std_dev } => {
                let u = self.uniform();
                mean + std_dev * inverse_standard_normal_cdf(u)
            }
            VariateKind::Triangular { min, mode, max } => {
                let u = self.uniform();
                let split = (mode - min) / (max - min);
                if u < split {
                    min + ((u * (max - min) * (mode - min)).sqrt())
                } else {
                    max - (((1.0 - u) * (max - min) * (max - mode)).sqrt())
                }
            }
            VariateKind::Bernoulli { p } => {
                let u = self.uniform();
                if u < p {
                    1.0
                } else {
                    0.0
                }
            }
            VariateKind::Discrete { weights } => {
                let total: f64 = weights.iter().sum();
                let u = self.uniform() * total;
                let mut acc = 0.0;
                for (i, w) in weights.iter().enumerate() {
                    acc += w;
                    if u < acc {
                        return i as f64;
                    }
                }
                (weights.len().saturating_sub(1)) as f64
            }
        }
    }

    fn reset_start_stream(&mut self) {
        self.rng = ChaCha20Rng::seed_from_u64(self.base_seed);
        self.rng.set_stream(self.stream_id as u64);
    }

    fn advance_substream(&mut self, n: u64) {
        self.rng = ChaCha20Rng::seed_from_u64(self.base_seed);
        self.rng.set_stream(self.stream_id as u64 + n);
    }

    fn set_antithetic(&mut self, enabled: bool) {
        self.antithetic = enabled;
    }

    fn stream_id(&self) -> StreamId {
        self.stream_id
    }
}

/// Acklam's rational approximation to the inverse standard normal CDF.
/// Accurate to about 1.15e-9 relative error, well within simulation
/// tolerance, and avoids a dependency on a dedicated statistics crate for a
/// single closed-form function.
pub(crate) fn inverse_standard_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let p = p.clamp(f64::EPSILON, 1.0 - f64::EPSILON);

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_variate_is_constant() {
        let mut v = Variate::from_spec(&DistSpec::Constant(42.0), 0, 1);
        for _ in 0..5 {
            assert_eq!(v.get_value(), 42.0);
        }
    }

    #[test]
    fn exponential_mean_matches_reasonably() {
        let mut v = Variate::from_spec(&DistSpec::Exponential { mean: 10.0 }, 1, 7);
        let n = 20_000;
        let sum: f64 = (0..n).map(|_| v.get_value()).sum();
        let mean = sum / n as f64;
        assert!((mean - 10.0).abs() < 0.5, "sample mean {mean} far from 10.0");
    }

    #[test]
    fn antithetic_mirrors_draws() {
        let mut a = Variate::from_spec(&DistSpec::Uniform { lo: 0.0, hi: 1.0 }, 2, 99);
        let mut b = Variate::from_spec(&DistSpec::Uniform { lo: 0.0, hi: 1.0 }, 2, 99);
        b.set_antithetic(true);
        let va = a.get_value();
        let vb = b.get_value();
        assert!((va + vb - 1.0).abs() < 1e-9);
    }

    #[test]
    fn reset_start_stream_replays_identically() {
        let mut v = Variate::from_spec(&DistSpec::Exponential { mean: 5.0 }, 3, 123);
        let first: Vec<f64> = (0..10).map(|_| v.get_value()).collect();
        v.reset_start_stream();
        let second: Vec<f64> = (0..10).map(|_| v.get_value()).collect();
        assert_eq!(first, second);
    }
}
