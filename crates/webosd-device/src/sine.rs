use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use webosd_eventsource::{PollError, Poller, SharedEvent};

use crate::sample::Sample;

/// Phase advance per poll, in radians.
const STEP: f64 = 1.0 / 20.0;

/// Smoothly swinging readings: 11 ± 4 V and 2 ± 1 A, a quarter period
/// apart. Handy for eyeballing the display.
#[derive(Debug, Default)]
pub struct Sine {
    phase: f64,
}

impl Sine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self) -> Sample {
        self.phase += STEP;
        Sample::new(11.0 + self.phase.sin() * 4.0, 2.0 + self.phase.cos())
    }
}

#[async_trait]
impl Poller for Sine {
    fn name(&self) -> &str {
        "sin"
    }

    async fn poll(&mut self, _at: DateTime<Utc>) -> Result<SharedEvent, PollError> {
        Ok(Arc::new(self.sample()))
    }
}
