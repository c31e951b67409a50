//! `webosd-core` — configuration, error type and shared constants for the
//! webosd telemetry dashboard.

pub mod config;
pub mod error;

pub use config::OsdConfig;
pub use error::{OsdError, Result};
