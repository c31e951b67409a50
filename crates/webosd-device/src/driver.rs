use tracing::info;
use webosd_eventsource::Poller;

use crate::{error::DeviceError, fake::Fake, sine::Sine};

/// Names accepted by [`open`].
pub const DRIVERS: &[&str] = &["fake", "sin"];

/// Open the driver registered under `name`.
pub fn open(name: &str) -> Result<Box<dyn Poller>, DeviceError> {
    let poller: Box<dyn Poller> = match name {
        "fake" => Box::new(Fake::new()),
        "sin" => Box::new(Sine::new()),
        _ => {
            return Err(DeviceError::UnknownDriver {
                name: name.to_string(),
                available: DRIVERS.join(", "),
            })
        }
    };
    info!(driver = %name, "device opened");
    Ok(poller)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_driver_opens() {
        for name in DRIVERS {
            let poller = open(name).unwrap();
            assert_eq!(poller.name(), *name);
        }
    }

    #[test]
    fn unknown_driver_is_rejected() {
        let err = open("scpi").err().unwrap();
        assert!(matches!(err, DeviceError::UnknownDriver { ref name, .. } if name == "scpi"));
        assert!(err.to_string().contains("fake, sin"));
    }
}
