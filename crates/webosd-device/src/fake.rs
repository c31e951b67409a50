use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use webosd_eventsource::{PollError, Poller, SharedEvent};

use crate::sample::Sample;

const BASE_VOLTS: f64 = 11.75;
const BASE_AMPS: f64 = 1.75;
/// Noise is drawn uniformly from `[0, NOISE)`.
const NOISE: f64 = 1.0 / 3.0;

/// Noisy readings around a fixed operating point. Never fails.
pub struct Fake {
    rng: StdRng,
}

impl Fake {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible noise, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self) -> Sample {
        Sample::new(
            BASE_VOLTS + self.rng.gen_range(0.0..NOISE),
            BASE_AMPS + self.rng.gen_range(0.0..NOISE),
        )
    }
}

impl Default for Fake {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Poller for Fake {
    fn name(&self) -> &str {
        "fake"
    }

    async fn poll(&mut self, _at: DateTime<Utc>) -> Result<SharedEvent, PollError> {
        Ok(Arc::new(self.sample()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_stay_in_band() {
        let mut fake = Fake::with_seed(7);
        for _ in 0..1_000 {
            let s = fake.sample();
            assert!((BASE_VOLTS..BASE_VOLTS + NOISE).contains(&s.volts));
            assert!((BASE_AMPS..BASE_AMPS + NOISE).contains(&s.amps));
        }
    }

    #[test]
    fn same_seed_same_readings() {
        let mut a = Fake::with_seed(42);
        let mut b = Fake::with_seed(42);
        assert_eq!(a.sample(), b.sample());
    }

    #[tokio::test]
    async fn poll_never_fails() {
        let mut fake = Fake::with_seed(1);
        assert!(fake.poll(Utc::now()).await.is_ok());
    }
}
