use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64;
use tracing::debug;

use crate::{Error, RandomSource, RawSeed, Result};

/// A [`RandomSource`] backed by any seedable generator.
///
/// The generator defaults to PCG-64. Sources built from the same seed and driven by the same
/// calls produce the same values.
#[derive(Clone, Debug)]
pub struct SeededSource<R = Pcg64> {
    rng: R,
    seed: i64,
    raw_seed: RawSeed,
}

impl SeededSource {
    /// Seeds from the system clock. The chosen seed is kept in `raw_seed`, so a run can still be
    /// replayed if the seed is recorded.
    pub fn new() -> Self {
        Self::with_raw_seed(RawSeed::Integer(time_seed()))
    }

    pub fn from_int(seed: i64) -> Self {
        Self::with_raw_seed(RawSeed::Integer(seed))
    }

    /// Seeds from the hash of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::with_raw_seed(RawSeed::Text(text.into()))
    }
}

impl<R: RngCore + SeedableRng> SeededSource<R> {
    pub fn with_raw_seed(raw_seed: RawSeed) -> Self {
        let seed = raw_seed.to_seed();
        debug!(%raw_seed, seed, "seeded random source");
        Self {
            rng: R::seed_from_u64(seed as u64),
            seed,
            raw_seed,
        }
    }
}

impl<R: RngCore + SeedableRng> Default for SeededSource<R> {
    fn default() -> Self {
        Self::with_raw_seed(RawSeed::Integer(time_seed()))
    }
}

impl<R: RngCore + SeedableRng> RandomSource for SeededSource<R> {
    fn seed(&self) -> i64 {
        self.seed
    }

    fn raw_seed(&self) -> &RawSeed {
        &self.raw_seed
    }

    fn next_int(&mut self, min: i32, max: i32) -> Result<i32> {
        if max <= min {
            return Err(Error::InvalidRange { min, max });
        }
        Ok(self.rng.gen_range(min..max))
    }

    fn next_f64(&mut self) -> f64 {
        self.rng.gen()
    }

    fn from_raw_seed(seed: RawSeed) -> Self {
        Self::with_raw_seed(seed)
    }
}

fn time_seed() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as i64)
        .unwrap_or_default()
}
