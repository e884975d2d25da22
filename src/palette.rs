//! Population color palettes.
//!
//! Palettes are configured as `#rrggbb` hex strings and resolved once into
//! linear RGB before generation. Hex values are treated as sRGB, so a color
//! written in the config looks the same once the sRGB surface re-encodes it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// A pair of hues a population picks between with a random draw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TwoTone {
    /// Chosen when the draw is above the population's threshold.
    pub primary: String,
    /// Chosen otherwise.
    pub secondary: String,
}

impl TwoTone {
    pub fn new(primary: &str, secondary: &str) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        }
    }

    fn resolve(&self, name: &str) -> ConfigResult<ResolvedTwoTone> {
        Ok(ResolvedTwoTone {
            primary: parse_hex(&self.primary)
                .map_err(|e| ConfigError::invalid(format!("palette '{name}.primary': {e}")))?,
            secondary: parse_hex(&self.secondary)
                .map_err(|e| ConfigError::invalid(format!("palette '{name}.secondary': {e}")))?,
        })
    }
}

/// Body tints: the common foliage pair and the rarer ornament pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyPalette {
    pub foliage: TwoTone,
    pub ornament: TwoTone,
}

/// Palette table for all four populations, as written in configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub body: BodyPalette,
    pub ambient: String,
    pub spiral: TwoTone,
    pub crown: TwoTone,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            body: BodyPalette {
                foliage: TwoTone::new("#ffff00", "#00ff88"),
                ornament: TwoTone::new("#ff0055", "#00ccff"),
            },
            ambient: "#ff4090".to_string(),
            spiral: TwoTone::new("#ffaa00", "#ffcc66"),
            crown: TwoTone::new("#ffffff", "#ffaa00"),
        }
    }
}

impl PaletteConfig {
    /// Parse every entry into linear RGB.
    ///
    /// Fails with [`ConfigError::InvalidConfiguration`] naming the first
    /// malformed entry.
    pub fn resolve(&self) -> ConfigResult<Palette> {
        Ok(Palette {
            foliage: self.body.foliage.resolve("body.foliage")?,
            ornament: self.body.ornament.resolve("body.ornament")?,
            ambient: parse_hex(&self.ambient)
                .map_err(|e| ConfigError::invalid(format!("palette 'ambient': {e}")))?,
            spiral: self.spiral.resolve("spiral")?,
            crown: self.crown.resolve("crown")?,
        })
    }
}

/// A two-tone pair in linear RGB.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedTwoTone {
    pub primary: Vec3,
    pub secondary: Vec3,
}

impl ResolvedTwoTone {
    /// `primary` when `draw > threshold`, else `secondary`.
    #[inline]
    pub fn pick(&self, draw: f32, threshold: f32) -> Vec3 {
        if draw > threshold {
            self.primary
        } else {
            self.secondary
        }
    }
}

/// Resolved palette used by the generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub foliage: ResolvedTwoTone,
    pub ornament: ResolvedTwoTone,
    pub ambient: Vec3,
    pub spiral: ResolvedTwoTone,
    pub crown: ResolvedTwoTone,
}

/// Parse `#rrggbb` (or `rrggbb`) into linear RGB.
pub fn parse_hex(hex: &str) -> Result<Vec3, String> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("expected #rrggbb, got '{hex}'"));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map(|v| srgb_to_linear(v as f32 / 255.0))
            .map_err(|_| format!("'{hex}' is not a hex color"))
    };
    Ok(Vec3::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// sRGB transfer function, inverse.
fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primaries() {
        assert!(parse_hex("#ffffff").unwrap().abs_diff_eq(Vec3::ONE, 1e-5));
        assert_eq!(parse_hex("000000").unwrap(), Vec3::ZERO);

        let red = parse_hex("#ff0000").unwrap();
        assert!((red.x - 1.0).abs() < 1e-5);
        assert_eq!(red.y, 0.0);
    }

    #[test]
    fn test_parse_is_linear() {
        // sRGB mid-gray is ~0.214 in linear light
        let gray = parse_hex("#808080").unwrap();
        assert!((gray.x - 0.2158).abs() < 0.002);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_hex("#fff").is_err());
        assert!(parse_hex("#gg0000").is_err());
        assert!(parse_hex("").is_err());
        assert!(parse_hex("#ff00ééé").is_err());
        // from_str_radix alone would take a sign.
        assert!(parse_hex("#+f+f+f").is_err());
        assert!(parse_hex("-1ff00").is_err());
    }

    #[test]
    fn test_default_palette_resolves() {
        let palette = PaletteConfig::default().resolve().unwrap();
        assert!(palette.crown.primary.abs_diff_eq(Vec3::ONE, 1e-5));
        assert_eq!(palette.spiral.primary, palette.crown.secondary);
    }

    #[test]
    fn test_bad_entry_is_named() {
        let mut config = PaletteConfig::default();
        config.spiral.secondary = "gold".into();
        let err = config.resolve().unwrap_err();
        assert!(err.to_string().contains("spiral.secondary"));
    }

    #[test]
    fn test_two_tone_pick() {
        let tone = ResolvedTwoTone {
            primary: Vec3::X,
            secondary: Vec3::Y,
        };
        assert_eq!(tone.pick(0.9, 0.4), Vec3::X);
        assert_eq!(tone.pick(0.4, 0.4), Vec3::Y);
    }
}
