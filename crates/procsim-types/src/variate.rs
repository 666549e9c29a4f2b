//! # procsim-types::variate
//!
//! The `RandomSource` trait: the contract every probability variate and
//! selection rule draws from. Concrete distributions and the substream
//! bookkeeping that implements it live in `procsim_engine::rng`; this crate
//! only defines the shape so that `procsim-types::scenario` and
//! `procsim-engine` agree on it without a circular dependency.

use crate::id::StreamId;

/// A source of independent draws bound to one named substream.
///
/// Every method that advances state is `&mut self`: a `RandomSource` is never
/// shared between concurrent activities, so there is no need for interior
/// mutability here (contrast `procsim_engine::rng::Recorder`, which does need
/// it to log draws from borrowed contexts).
pub trait RandomSource {
    /// Draws the next value from the underlying distribution.
    fn get_value(&mut self) -> f64;

    /// Rewinds to the first value of the stream's current position, the same
    /// draw sequence a fresh replication would see. Used when a replication
    /// restarts without reseeding (common-random-numbers designs).
    fn reset_start_stream(&mut self);

    /// Jumps ahead to the start of substream `n`, skipping all draws in
    /// substreams `0..n`. Used to align independent streams across
    /// replications (spec §6, variate stream management).
    fn advance_substream(&mut self, n: u64);

    /// Enables or disables antithetic-variate generation: when enabled,
    /// `get_value` returns `1 - u` applied before inversion instead of `u`.
    fn set_antithetic(&mut self, enabled: bool);

    /// The stream identifier this source was bound to, for trace attribution.
    fn stream_id(&self) -> StreamId;
}

/// A degenerate `RandomSource` that always returns the same value and never
/// consumes randomness. Grounds `DistSpec::Constant` and is also useful in
/// tests that need a deterministic activity duration.
#[derive(Debug, Clone, Copy)]
pub struct ConstantVariate {
    value: f64,
    stream_id: StreamId,
}

impl ConstantVariate {
    pub fn new(value: f64, stream_id: StreamId) -> Self {
        Self { value, stream_id }
    }
}

impl RandomSource for ConstantVariate {
    fn get_value(&mut self) -> f64 {
        self.value
    }

    fn reset_start_stream(&mut self) {}

    fn advance_substream(&mut self, _n: u64) {}

    fn set_antithetic(&mut self, _enabled: bool) {}

    fn stream_id(&self) -> StreamId {
        self.stream_id
    }
}
