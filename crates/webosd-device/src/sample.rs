use std::io::{self, Write};

use webosd_eventsource::{write_record, Event};

/// One PSU reading. Renders as a `volts` record followed by an `amps`
/// record, both with three decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub volts: f64,
    pub amps: f64,
}

impl Sample {
    pub fn new(volts: f64, amps: f64) -> Self {
        Self { volts, amps }
    }
}

impl Event for Sample {
    fn write_to(&self, w: &mut dyn Write) -> io::Result<()> {
        write_record(w, "volts", &format!("{:.3}", self.volts))?;
        write_record(w, "amps", &format!("{:.3}", self.amps))
    }
}
