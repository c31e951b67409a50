//! `webosd-eventsource` — server-sent event broadcasting.
//!
//! # Overview
//!
//! ```text
//! Poller ──► Ticker ──► EventSource::publish ──► coordinator ──► Subscription mailboxes
//!                                    ▲                               │
//!            other publishers ───────┘                               ▼
//!                                                            stream handlers
//! ```
//!
//! A single coordinator task owns the subscriber set. Everything else talks
//! to it through bounded channels:
//!
//! | channel        | default size | when full                          |
//! |----------------|--------------|------------------------------------|
//! | publish queue  | 8            | `publish` returns `false`          |
//! | subscribe      | 2            | `subscribe` waits briefly          |
//! | unsubscribe    | 2            | request skipped (coordinator reaps) |
//! | mailbox        | 3            | subscriber dropped as too slow     |

pub mod error;
pub mod event;
pub mod source;
pub mod ticker;

pub use error::{EventSourceError, PollError};
pub use event::{encode, format_event, write_record, ErrorEvent, Event, RawEvent, SharedEvent};
pub use source::{EventSource, EventSourceState, EventSourceStatus, SubscriberId, Subscription};
pub use ticker::{Poller, Publisher, Ticker, TickerStats};
