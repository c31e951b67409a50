use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::PollError;
use crate::event::SharedEvent;
use crate::source::EventSource;

/// A device that can be sampled. Implemented by the drivers in
/// `webosd-device`.
#[async_trait]
pub trait Poller: Send {
    /// Stable lowercase identifier used in logs (e.g. `"fake"`).
    fn name(&self) -> &str;

    /// Take one sample stamped with `at`.
    async fn poll(&mut self, at: DateTime<Utc>) -> Result<SharedEvent, PollError>;
}

#[async_trait]
impl<P: Poller + ?Sized> Poller for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn poll(&mut self, at: DateTime<Utc>) -> Result<SharedEvent, PollError> {
        (**self).poll(at).await
    }
}

/// Anything that accepts events without blocking.
pub trait Publisher: Send + Sync {
    /// Returns `false` when the event was dropped.
    fn publish_shared(&self, event: SharedEvent) -> bool;
}

impl Publisher for EventSource {
    fn publish_shared(&self, event: SharedEvent) -> bool {
        EventSource::publish_shared(self, event)
    }
}

/// Counters returned when a [`Ticker`] stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickerStats {
    pub ticks: u64,
    pub published: u64,
    /// Samples the publisher refused (queue full).
    pub dropped: u64,
    pub failed: u64,
}

/// Samples a [`Poller`] every `period` and publishes each result.
pub struct Ticker<P, B> {
    poller: P,
    publisher: B,
    period: Duration,
}

impl<P: Poller, B: Publisher> Ticker<P, B> {
    /// A zero `period` is raised to one millisecond.
    pub fn new(poller: P, publisher: B, period: Duration) -> Self {
        Self {
            poller,
            publisher,
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// Main loop. The first sample is taken one `period` after start; the
    /// loop exits when `cancel` fires.
    ///
    /// A failed poll is logged and skipped, the schedule is unchanged. If
    /// a poll overruns, missed ticks are skipped rather than bunched up.
    pub async fn run(mut self, cancel: CancellationToken) -> TickerStats {
        let driver = self.poller.name().to_string();
        info!(driver = %driver, period_ms = self.period.as_millis() as u64, "ticker started");

        let mut stats = TickerStats::default();
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    stats.ticks += 1;
                    self.tick(&driver, &mut stats).await;
                }
                _ = cancel.cancelled() => {
                    info!(driver = %driver, ticks = stats.ticks, failed = stats.failed, "ticker stopped");
                    break;
                }
            }
        }
        stats
    }

    async fn tick(&mut self, driver: &str, stats: &mut TickerStats) {
        match self.poller.poll(Utc::now()).await {
            Ok(event) => {
                if self.publisher.publish_shared(event) {
                    stats.published += 1;
                } else {
                    stats.dropped += 1;
                    debug!(driver, "sample dropped, publish queue full");
                }
            }
            Err(e) => {
                stats.failed += 1;
                warn!(driver, error = %e, "poll failed");
            }
        }
    }
}
