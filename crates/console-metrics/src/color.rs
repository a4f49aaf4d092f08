use std::fmt;

use serde::{Serialize, Serializer};

const SATURATION: u8 = 70;
const LIGHTNESS: u8 = 50;

/// An HSL color with alpha, rendered as `hsla(h, 70%, 50%, a)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HslaColor {
    pub hue: u32,
    pub saturation: u8,
    pub lightness: u8,
    pub alpha: f64,
}

impl fmt::Display for HslaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({}, {}%, {}%, {})",
            self.hue, self.saturation, self.lightness, self.alpha
        )
    }
}

impl Serialize for HslaColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Rolling `acc * 31 + code` hash over UTF-16 code units, wrapping at 32 bits.
pub fn processor_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |acc, unit| {
        i32::from(unit).wrapping_add(acc.wrapping_shl(5).wrapping_sub(acc))
    })
}

/// Stable color for a processor name. Different names may share a hue.
pub fn color_for_processor(name: &str, alpha: f64) -> HslaColor {
    let hue = processor_hash(name).unsigned_abs() % 360;
    HslaColor {
        hue,
        saturation: SATURATION,
        lightness: LIGHTNESS,
        alpha,
    }
}
