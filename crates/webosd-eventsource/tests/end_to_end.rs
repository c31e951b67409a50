// A fixed-rate producer feeding two subscribers; one leaves half way.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use webosd_core::config::EventsConfig;
use webosd_eventsource::{
    encode, format_event, EventSource, PollError, Poller, SharedEvent, Subscription, Ticker,
};

/// Emits `event: seq` records numbered from 1.
#[derive(Default)]
struct Sequence(u64);

#[async_trait]
impl Poller for Sequence {
    fn name(&self) -> &str {
        "sequence"
    }

    async fn poll(&mut self, _at: DateTime<Utc>) -> Result<SharedEvent, PollError> {
        self.0 += 1;
        Ok(Arc::new(format_event("seq", &self.0.to_string())))
    }
}

async fn next_seq(sub: &mut Subscription) -> u64 {
    let ev = sub.recv().await.expect("mailbox closed");
    let text = String::from_utf8(encode(ev.as_ref()).unwrap()).unwrap();
    text.strip_prefix("event: seq\ndata: ")
        .and_then(|rest| rest.strip_suffix("\n\n"))
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("unexpected record {text:?}"))
}

#[tokio::test(start_paused = true)]
async fn remaining_subscriber_keeps_receiving_after_other_disconnects() {
    let cancel = CancellationToken::new();
    let source = EventSource::new(EventsConfig::default(), cancel.clone());
    let mut stays = source.subscribe().await.unwrap();
    let mut leaves = source.subscribe().await.unwrap();

    // 10 events per second
    let ticker = Ticker::new(
        Sequence::default(),
        source.clone(),
        Duration::from_millis(100),
    );
    let ticker_task = tokio::spawn(ticker.run(cancel.clone()));

    for n in 1..=5 {
        assert_eq!(next_seq(&mut leaves).await, n);
        assert_eq!(next_seq(&mut stays).await, n);
    }
    drop(leaves);

    // unregistered before the next sample is fanned out
    let mut status = source.watch_status();
    tokio::time::timeout(
        Duration::from_millis(100),
        status.wait_for(|s| s.subscribers == 1),
    )
    .await
    .expect("disconnected subscriber still registered")
    .unwrap();

    for n in 6..=30 {
        assert_eq!(next_seq(&mut stays).await, n);
    }

    cancel.cancel();
    let stats = ticker_task.await.unwrap();
    assert!(stats.published >= 30);
    assert_eq!(stats.failed, 0);

    source.stopped().await;
    assert_eq!(source.status().subscribers, 0);
    // whatever was still buffered drains, then the stream ends
    while stays.recv().await.is_some() {}
}
