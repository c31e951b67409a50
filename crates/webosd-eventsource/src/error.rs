use thiserror::Error;

/// Errors returned by [`EventSource`](crate::EventSource) operations.
#[derive(Debug, Error)]
pub enum EventSourceError {
    /// The coordinator has stopped; no new subscriptions are accepted.
    #[error("event source is closed")]
    Closed,

    /// An event failed to render itself to the wire format.
    #[error("Event encoding failed: {0}")]
    Encode(#[from] std::io::Error),
}

/// Failure reported by a [`Poller`](crate::Poller) for a single tick.
#[derive(Debug, Error)]
pub enum PollError {
    /// The device answered with an error or could not be reached.
    #[error("Device error: {0}")]
    Device(String),
}
