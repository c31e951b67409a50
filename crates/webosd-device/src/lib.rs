//! `webosd-device` — power-supply drivers that feed the ticker.
//!
//! | driver | readings                                        |
//! |--------|-------------------------------------------------|
//! | `fake` | 11.75 V / 1.75 A plus up to 1/3 of random noise |
//! | `sin`  | 11 ± 4 V / 2 ± 1 A, advancing 1/20 rad per poll |

pub mod driver;
pub mod error;
pub mod fake;
pub mod sample;
pub mod sine;

pub use driver::{open, DRIVERS};
pub use error::DeviceError;
pub use fake::Fake;
pub use sample::Sample;
pub use sine::Sine;
