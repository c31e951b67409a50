//! On-screen display styling: colors and the settings block pushed to
//! clients as CSS.

pub mod color;
pub mod settings;

pub use color::{ColorError, Rgb, Rgba};
pub use settings::{BorderStyle, Settings};
