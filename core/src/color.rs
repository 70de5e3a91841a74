//! CSS color strings as accepted in contest configuration.
//!
//! Anything CSS Color Level 4 accepts works here: hex forms, `rgb()`/`rgba()`
//! with commas or spaces, `hsl()`, `hwb()` and the named colors.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ColorError;

/// 8-bit straight-alpha color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorError::Empty);
        }

        let color = csscolorparser::parse(s).map_err(|err| ColorError::Invalid {
            input: s.to_string(),
            reason: err.to_string(),
        })?;
        let [r, g, b, a] = color.to_rgba8();
        Ok(Self { r, g, b, a })
    }
}
