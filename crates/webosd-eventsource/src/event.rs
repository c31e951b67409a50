use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use serde::Serialize;

/// A unit of data pushed to stream subscribers.
///
/// The broadcaster never looks inside an event; its only capability is
/// rendering itself in the event-stream wire format:
///
/// ```text
/// event: <name>
/// data: <line 1>
/// data: <line 2>
///
/// ```
///
/// One event may render several records (a PSU sample writes `volts` and
/// `amps` back to back).
pub trait Event: Send + Sync + 'static {
    fn write_to(&self, w: &mut dyn Write) -> io::Result<()>;
}

/// Events are immutable and handed to every subscriber, so they travel as
/// shared references.
pub type SharedEvent = Arc<dyn Event>;

/// Write one `event:`/`data:` record.
///
/// Every line of `data` gets its own `data: ` prefix and the record ends
/// with a blank line. `name` must not contain a newline.
pub fn write_record(w: &mut dyn Write, name: &str, data: &str) -> io::Result<()> {
    w.write_all(&record(name, data))
}

fn record(name: &str, data: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(name.len() + data.len() + 16);
    buf.extend_from_slice(b"event: ");
    buf.extend_from_slice(name.as_bytes());
    for line in data.split('\n') {
        buf.extend_from_slice(b"\ndata: ");
        buf.extend_from_slice(line.as_bytes());
    }
    buf.extend_from_slice(b"\n\n");
    buf
}

/// Render an event into a fresh buffer, ready to hand to the transport.
pub fn encode(event: &dyn Event) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(64);
    event.write_to(&mut buf)?;
    Ok(buf)
}

/// Build a pre-framed event from a name and a (possibly multi-line) payload.
pub fn format_event(name: &str, data: &str) -> RawEvent {
    RawEvent(record(name, data).into())
}

/// Event whose wire bytes were rendered up front.
#[derive(Clone, PartialEq, Eq)]
pub struct RawEvent(Arc<[u8]>);

impl RawEvent {
    /// Frame a serializable payload as single-line JSON under `name`.
    pub fn json(name: &str, payload: &impl Serialize) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_string(payload)?;
        Ok(format_event(name, &data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawEvent")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}

impl Event for RawEvent {
    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_all(&self.0)
    }
}

/// `event: error` record carrying a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    message: String,
}

impl ErrorEvent {
    pub fn new(err: &impl fmt::Display) -> Self {
        Self {
            message: err.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Event for ErrorEvent {
    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        write_record(w, "error", &self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(event: &dyn Event) -> String {
        String::from_utf8(encode(event).unwrap()).unwrap()
    }

    #[test]
    fn trailing_newline_yields_empty_data_line() {
        assert_eq!(
            text(&format_event("x", "a\n")),
            "event: x\ndata: a\ndata: \n\n"
        );
    }

    #[test]
    fn empty_payload_still_has_a_data_line() {
        assert_eq!(text(&format_event("ping", "")), "event: ping\ndata: \n\n");
    }

    #[test]
    fn error_event_frames_multiline_messages() {
        let ev = ErrorEvent::new(&"device offline\nretrying");
        assert_eq!(ev.message(), "device offline\nretrying");
        assert_eq!(
            text(&ev),
            "event: error\ndata: device offline\ndata: retrying\n\n"
        );
    }

    #[test]
    fn raw_event_debug_shows_text() {
        let ev = format_event("volts", "1.000");
        assert!(format!("{ev:?}").contains("event: volts"));
    }
}
