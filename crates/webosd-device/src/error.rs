use thiserror::Error;

/// Errors raised while selecting or opening a device driver.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No driver is registered under this name.
    #[error("unknown device driver {name:?} (available: {available})")]
    UnknownDriver { name: String, available: String },
}
