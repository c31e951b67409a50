use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid hex color length: {0:?}")]
    Length(String),

    #[error("hex color must start with '#': {0:?}")]
    MissingHash(String),

    #[error("invalid hex digits in color {0:?}")]
    Digits(String),
}

/// `#rrggbb` color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// `#rrggbbaa` color. Also accepts `#rrggbb`, meaning fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(rgb: Rgb) -> Self {
        Self { rgb, a: 0xff }
    }
}

/// Parse the hex digits after `#`, `digits` long.
fn parse_hex(s: &str, digits: usize) -> Result<u32, ColorError> {
    let hex = s
        .strip_prefix('#')
        .ok_or_else(|| ColorError::MissingHash(s.to_string()))?;
    if hex.len() != digits {
        return Err(ColorError::Length(s.to_string()));
    }
    // from_str_radix would also take a leading '+'
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::Digits(s.to_string()));
    }
    u32::from_str_radix(hex, 16).map_err(|_| ColorError::Digits(s.to_string()))
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 7 {
            return Err(ColorError::Length(s.to_string()));
        }
        let [_, r, g, b] = parse_hex(s, 6)?.to_be_bytes();
        Ok(Self { r, g, b })
    }
}

impl FromStr for Rgba {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 9 {
            return s.parse::<Rgb>().map(Rgba::opaque);
        }
        let [r, g, b, a] = parse_hex(s, 8)?.to_be_bytes();
        Ok(Self {
            rgb: Rgb { r, g, b },
            a,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02x}", self.rgb, self.a)
    }
}
