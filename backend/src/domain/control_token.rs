//! Lock-guarded pseudo-random control token source.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::domain::ports::ControlTokenSource;

/// Process-wide generator seeded once from the wall clock.
///
/// Every draw takes the internal lock, so workers may share one instance
/// behind an `Arc`.
#[derive(Debug)]
pub struct LockedRandomSource {
    rng: Mutex<SmallRng>,
}

impl LockedRandomSource {
    /// Seed from the current wall-clock time.
    pub fn from_wall_clock() -> Self {
        let now = Utc::now();
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000));
        Self::from_seed(nanos.unsigned_abs())
    }

    /// Seed explicitly; two sources with the same seed yield the same tokens.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }
}

impl ControlTokenSource for LockedRandomSource {
    fn next_control(&self) -> i64 {
        // A panic while holding the lock leaves the generator usable.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..=i64::MAX)
    }
}
