use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use webosd_core::config::DisplayConfig;

use super::color::{ColorError, Rgb, Rgba};

pub const MIN_FONT_WEIGHT: u64 = 100;
pub const MAX_FONT_WEIGHT: u64 = 900;

const BOX_SHADOW: &str = "5px 5px 10px #000000A0";

/// CSS `border-style` keywords accepted from the settings form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorderStyle {
    #[default]
    None,
    Hidden,
    Dotted,
    Dashed,
    Solid,
    Double,
    Groove,
    Ridge,
    Inset,
    Outset,
    Initial,
    Inherit,
}

impl BorderStyle {
    pub const ALL: [BorderStyle; 12] = [
        Self::None,
        Self::Hidden,
        Self::Dotted,
        Self::Dashed,
        Self::Solid,
        Self::Double,
        Self::Groove,
        Self::Ridge,
        Self::Inset,
        Self::Outset,
        Self::Initial,
        Self::Inherit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Hidden => "hidden",
            Self::Dotted => "dotted",
            Self::Dashed => "dashed",
            Self::Solid => "solid",
            Self::Double => "double",
            Self::Groove => "groove",
            Self::Ridge => "ridge",
            Self::Inset => "inset",
            Self::Outset => "outset",
            Self::Initial => "initial",
            Self::Inherit => "inherit",
        }
    }
}

impl FromStr for BorderStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|b| b.as_str() == s).ok_or(())
    }
}

impl fmt::Display for BorderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the OSD page styles itself with. Published to clients as a
/// `:root { ... }` block of CSS custom properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub background_color: Rgba,
    pub padding: u64,
    pub border_width: u64,
    pub border_style: BorderStyle,
    pub border_color: Rgb,
    pub border_radius: u64,
    pub volt_color: Rgb,
    pub amp_color: Rgb,
    pub font_family: String,
    pub font_size: u64,
    pub font_weight: u64,
    pub line_height: u64,
    pub text_stroke_width: u64,
    pub text_stroke_color: Rgb,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background_color: Rgba::opaque(Rgb::default()),
            padding: 0,
            border_width: 0,
            border_style: BorderStyle::None,
            border_color: Rgb::default(),
            border_radius: 0,
            volt_color: Rgb::new(0x00, 0x80, 0x00),
            amp_color: Rgb::new(0xff, 0xff, 0x00),
            font_family: "monospace".to_string(),
            font_size: 70,
            font_weight: 400,
            line_height: 110,
            text_stroke_width: 0,
            text_stroke_color: Rgb::default(),
        }
    }
}

impl Settings {
    /// Build the startup settings. Font weight is clamped to 100..=900;
    /// a malformed color is an error.
    pub fn from_config(cfg: &DisplayConfig) -> Result<Self, ColorError> {
        Ok(Self {
            background_color: cfg.background_color.parse()?,
            volt_color: cfg.volt_color.parse()?,
            amp_color: cfg.amp_color.parse()?,
            font_family: cfg.font.clone(),
            font_size: cfg.font_size,
            font_weight: cfg.font_weight.clamp(MIN_FONT_WEIGHT, MAX_FONT_WEIGHT),
            line_height: cfg.line_height,
            ..Self::default()
        })
    }

    /// Update from a submitted settings form. Only fields that are present,
    /// non-empty and valid change; everything else is left alone.
    ///
    /// Returns the names of submitted fields that failed to parse.
    pub fn apply(&mut self, values: &HashMap<String, String>) -> Vec<&'static str> {
        let mut form = Form {
            values,
            rejected: Vec::new(),
        };

        form.set("backgroundColor", &mut self.background_color);
        if let Some(alpha) = form.get("backgroundAlpha") {
            match alpha.parse::<u32>() {
                // 0 means "unset" on the form, so it maps to opaque too
                Ok(a @ 1..=254) => self.background_color.a = a as u8,
                Ok(_) => self.background_color.a = 0xff,
                Err(_) => form.rejected.push("backgroundAlpha"),
            }
        }
        form.set("padding", &mut self.padding);
        form.set("borderWidth", &mut self.border_width);
        form.set("borderStyle", &mut self.border_style);
        form.set("borderColor", &mut self.border_color);
        form.set("borderRadius", &mut self.border_radius);
        form.set("voltColor", &mut self.volt_color);
        form.set("ampColor", &mut self.amp_color);
        if let Some(family) = form.get("fontFamily") {
            self.font_family = family.to_string();
        }
        form.set("fontSize", &mut self.font_size);
        form.set("fontWeight", &mut self.font_weight);
        form.set("lineHeight", &mut self.line_height);
        form.set("textStrokeWidth", &mut self.text_stroke_width);
        form.set("textStrokeColor", &mut self.text_stroke_color);
        form.rejected
    }

    /// Render as CSS custom properties.
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

/// The `:root { ... }` block.
impl fmt::Display for Settings {
    fn fmt(&self, w: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(w, ":root {{")?;
        writeln!(w, "--background-color: {};", self.background_color)?;
        writeln!(w, "--font-family: {};", self.font_family)?;
        writeln!(w, "--font-size: {}px;", self.font_size)?;
        writeln!(w, "--font-weight: {};", self.font_weight)?;
        writeln!(w, "--line-height: {}%;", self.line_height)?;
        writeln!(w, "--volt-color: {};", self.volt_color)?;
        writeln!(w, "--amp-color: {};", self.amp_color)?;
        writeln!(w, "--padding: {}px;", self.padding)?;
        writeln!(w, "--border-width: {}px;", self.border_width)?;
        writeln!(w, "--border-style: {};", self.border_style)?;
        writeln!(w, "--border-color: {};", self.border_color)?;
        writeln!(w, "--border-radius: {}px;", self.border_radius)?;
        writeln!(w, "--box-shadow: {BOX_SHADOW};")?;
        writeln!(w, "--text-stroke-width: {}px;", self.text_stroke_width)?;
        writeln!(w, "--text-stroke-color: {};", self.text_stroke_color)?;
        writeln!(w, "}}")
    }
}

struct Form<'a> {
    values: &'a HashMap<String, String>,
    rejected: Vec<&'static str>,
}

impl<'a> Form<'a> {
    fn get(&self, key: &str) -> Option<&'a str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn set<T: FromStr>(&mut self, key: &'static str, slot: &mut T) {
        if let Some(v) = self.get(key) {
            match v.parse() {
                Ok(parsed) => *slot = parsed,
                Err(_) => self.rejected.push(key),
            }
        }
    }
}
