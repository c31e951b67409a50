use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot, watch,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use webosd_core::config::EventsConfig;

use crate::error::EventSourceError;
use crate::event::{Event, SharedEvent};

/// Identity of one subscription. Fresh per call to [`EventSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coordinator lifecycle — linear progression, no backwards transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSourceState {
    Running,
    ShuttingDown,
    Stopped,
}

/// Snapshot published by the coordinator after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventSourceStatus {
    pub state: EventSourceState,
    pub subscribers: usize,
}

struct Registration {
    id: SubscriberId,
    mailbox: mpsc::Sender<SharedEvent>,
    registered: oneshot::Sender<()>,
}

/// Handle to the event broadcaster. Cheap to clone; every clone talks to the
/// same coordinator task.
#[derive(Clone)]
pub struct EventSource {
    publish_tx: mpsc::Sender<SharedEvent>,
    subscribe_tx: mpsc::Sender<Registration>,
    unsubscribe_tx: mpsc::Sender<SubscriberId>,
    mailbox_capacity: usize,
    status: watch::Receiver<EventSourceStatus>,
}

impl EventSource {
    /// Spawn the coordinator on the current Tokio runtime.
    ///
    /// The coordinator runs until `cancel` fires or every handle is dropped.
    pub fn new(config: EventsConfig, cancel: CancellationToken) -> Self {
        let config = config.clamped();
        let (publish_tx, publish_rx) = mpsc::channel(config.publish_capacity);
        let (subscribe_tx, subscribe_rx) = mpsc::channel(config.request_capacity);
        let (unsubscribe_tx, unsubscribe_rx) = mpsc::channel(config.request_capacity);
        let (status_tx, status) = watch::channel(EventSourceStatus {
            state: EventSourceState::Running,
            subscribers: 0,
        });

        let coordinator = Coordinator {
            publish_rx,
            subscribe_rx,
            unsubscribe_rx,
            subscribers: HashMap::new(),
            status: status_tx,
        };
        tokio::spawn(coordinator.run(cancel));

        Self {
            publish_tx,
            subscribe_tx,
            unsubscribe_tx,
            mailbox_capacity: config.mailbox_capacity,
            status,
        }
    }

    /// Queue an event for fan-out without waiting.
    ///
    /// Returns `false` when the publish queue is full or the coordinator has
    /// stopped. The event is dropped in that case, never retried.
    pub fn publish<E: Event>(&self, event: E) -> bool {
        self.publish_shared(Arc::new(event))
    }

    pub fn publish_shared(&self, event: SharedEvent) -> bool {
        match self.publish_tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("publish queue full, event dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Register a new mailbox with the coordinator.
    ///
    /// Returns once the coordinator has added it to the subscriber set, so
    /// every event published after this call is delivered to it (until it
    /// is dropped for being slow). Fails with [`EventSourceError::Closed`]
    /// once the coordinator has stopped.
    pub async fn subscribe(&self) -> Result<Subscription, EventSourceError> {
        let (mailbox, rx) = mpsc::channel(self.mailbox_capacity);
        let (registered, ack) = oneshot::channel();
        let id = SubscriberId::new();

        self.subscribe_tx
            .send(Registration {
                id,
                mailbox,
                registered,
            })
            .await
            .map_err(|_| EventSourceError::Closed)?;
        ack.await.map_err(|_| EventSourceError::Closed)?;

        Ok(Subscription {
            id,
            mailbox: rx,
            unsubscribe_tx: Some(self.unsubscribe_tx.clone()),
        })
    }

    /// Ask the coordinator to forget `id`. Never waits.
    ///
    /// Returns `false` when the request could not be queued. That is
    /// harmless: a mailbox whose receiver is gone is reaped on the next
    /// fan-out anyway. Removing an unknown id is a no-op.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        request_unsubscribe(&self.unsubscribe_tx, id)
    }

    /// Latest status snapshot.
    pub fn status(&self) -> EventSourceStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<EventSourceStatus> {
        self.status.clone()
    }

    /// Resolves once the coordinator loop has exited.
    pub async fn stopped(&self) {
        let mut status = self.status.clone();
        // An Err means the coordinator is gone, which is just as stopped.
        let _ = status
            .wait_for(|s| s.state == EventSourceState::Stopped)
            .await;
    }
}

fn request_unsubscribe(tx: &mpsc::Sender<SubscriberId>, id: SubscriberId) -> bool {
    match tx.try_send(id) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            debug!(subscriber = %id, "unsubscribe queue full, leaving it to the coordinator");
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

/// A registered mailbox. Unsubscribes itself when dropped, so every exit
/// path of a stream handler releases its slot.
pub struct Subscription {
    id: SubscriberId,
    mailbox: mpsc::Receiver<SharedEvent>,
    unsubscribe_tx: Option<mpsc::Sender<SubscriberId>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event in publish order.
    ///
    /// `None` means the mailbox was closed: the coordinator dropped this
    /// subscriber for being slow, or shut down. Events already buffered are
    /// still returned before `None`.
    pub async fn recv(&mut self) -> Option<SharedEvent> {
        self.mailbox.recv().await
    }

    /// Release the subscription. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(tx) = self.unsubscribe_tx.take() {
            request_unsubscribe(&tx, self.id);
        }
        self.mailbox.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("released", &self.unsubscribe_tx.is_none())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Owns the subscriber set. Only ever touched from inside `run`.
struct Coordinator {
    publish_rx: mpsc::Receiver<SharedEvent>,
    subscribe_rx: mpsc::Receiver<Registration>,
    unsubscribe_rx: mpsc::Receiver<SubscriberId>,
    subscribers: HashMap<SubscriberId, mpsc::Sender<SharedEvent>>,
    status: watch::Sender<EventSourceStatus>,
}

impl Coordinator {
    async fn run(mut self, cancel: CancellationToken) {
        info!("event source started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("event source shutting down");
                    break;
                }
                event = self.publish_rx.recv() => match event {
                    Some(event) => self.fan_out(event),
                    None => break,
                },
                registration = self.subscribe_rx.recv() => match registration {
                    Some(registration) => self.add(registration),
                    None => break,
                },
                id = self.unsubscribe_rx.recv() => match id {
                    Some(id) => self.remove(id),
                    None => break,
                },
            }
        }
        self.shutdown();
    }

    fn fan_out(&mut self, event: SharedEvent) {
        let before = self.subscribers.len();
        self.subscribers
            .retain(|id, mailbox| match mailbox.try_send(Arc::clone(&event)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = %id, "subscriber too slow, dropping it");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(subscriber = %id, "subscriber went away, reaping mailbox");
                    false
                }
            });
        if self.subscribers.len() != before {
            self.publish_status(EventSourceState::Running);
        }
    }

    fn add(&mut self, registration: Registration) {
        let Registration {
            id,
            mailbox,
            registered,
        } = registration;
        // The caller gave up waiting; don't keep a mailbox nobody reads.
        if registered.is_closed() {
            return;
        }
        self.subscribers.insert(id, mailbox);
        debug!(subscriber = %id, total = self.subscribers.len(), "subscriber added");
        self.publish_status(EventSourceState::Running);
        // If the caller vanished just now its receiver is gone and the
        // mailbox is reaped on the next fan-out.
        let _ = registered.send(());
    }

    fn remove(&mut self, id: SubscriberId) {
        // Already gone when it was dropped for being slow.
        if self.subscribers.remove(&id).is_some() {
            debug!(subscriber = %id, total = self.subscribers.len(), "subscriber removed");
            self.publish_status(EventSourceState::Running);
        }
    }

    fn shutdown(mut self) {
        self.publish_status(EventSourceState::ShuttingDown);

        self.publish_rx.close();
        self.subscribe_rx.close();
        self.unsubscribe_rx.close();
        // Requests that were already queued are answered by dropping them;
        // a pending subscribe sees its ack channel close.
        while self.publish_rx.try_recv().is_ok() {}
        while self.subscribe_rx.try_recv().is_ok() {}
        while self.unsubscribe_rx.try_recv().is_ok() {}

        // Dropping the senders closes every mailbox, which ends the streams.
        let dropped = self.subscribers.len();
        self.subscribers.clear();

        self.publish_status(EventSourceState::Stopped);
        info!(subscribers = dropped, "event source stopped");
    }

    fn publish_status(&self, state: EventSourceState) {
        let subscribers = self.subscribers.len();
        self.status.send_replace(EventSourceStatus { state, subscribers });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::format_event;

    #[tokio::test]
    async fn subscriber_ids_are_unique() {
        let source = EventSource::new(EventsConfig::default(), CancellationToken::new());
        let a = source.subscribe().await.unwrap();
        let b = source.subscribe().await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(source.status().subscribers, 2);
    }

    #[tokio::test]
    async fn dropping_subscription_unregisters_it() {
        let source = EventSource::new(EventsConfig::default(), CancellationToken::new());
        let sub = source.subscribe().await.unwrap();
        assert_eq!(source.status().subscribers, 1);
        drop(sub);

        let mut status = source.watch_status();
        status.wait_for(|s| s.subscribers == 0).await.unwrap();
    }

    #[tokio::test]
    async fn closed_mailbox_is_reaped_on_next_fan_out() {
        let source = EventSource::new(EventsConfig::default(), CancellationToken::new());
        let mut sub = source.subscribe().await.unwrap();
        // Simulate a skipped unsubscribe: close the receiver without telling
        // the coordinator.
        sub.unsubscribe_tx.take();
        sub.mailbox.close();
        assert_eq!(source.status().subscribers, 1);

        assert!(source.publish(format_event("x", "1")));
        let mut status = source.watch_status();
        status.wait_for(|s| s.subscribers == 0).await.unwrap();
    }

    #[tokio::test]
    async fn unsubscribe_on_full_queue_is_skipped_and_reaped_later() {
        let source = EventSource::new(EventsConfig::default(), CancellationToken::new());
        let mut sub = source.subscribe().await.unwrap();
        let id = sub.id();

        // Current-thread runtime: the coordinator cannot drain the request
        // queue (capacity 2) until this task yields.
        let stranger = SubscriberId::new();
        let started = std::time::Instant::now();
        assert!(source.unsubscribe(stranger));
        assert!(source.unsubscribe(stranger));
        assert!(!source.unsubscribe(id));
        assert!(started.elapsed() < std::time::Duration::from_millis(50));

        // the skipped request left `sub` registered; its closed mailbox is
        // reaped on the next fan-out instead
        sub.unsubscribe_tx.take();
        sub.mailbox.close();
        assert_eq!(source.status().subscribers, 1);
        assert!(source.publish(format_event("x", "1")));

        let mut status = source.watch_status();
        status.wait_for(|s| s.subscribers == 0).await.unwrap();
    }

    #[tokio::test]
    async fn debug_output_reports_release() {
        let source = EventSource::new(EventsConfig::default(), CancellationToken::new());
        let mut sub = source.subscribe().await.unwrap();
        assert!(format!("{sub:?}").contains("released: false"));
        sub.unsubscribe();
        assert!(format!("{sub:?}").contains("released: true"));
    }
}
