//! Geometry of the compact formation.
//!
//! Each population has its own layout block. The dispersed formation lives in
//! [`DispersedVolume`] and is deliberately kept apart from these.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::morph::DispersedVolume;

/// Size and brightness of one body tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub size: f32,
    pub brightness: f32,
}

/// Conical tree body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyLayout {
    /// Height of the cone base.
    pub base_y: f32,
    pub height: f32,
    /// Cross-section radius at the base; shrinks linearly to zero at the top.
    pub max_radius: f32,
    /// Height easing exponent; 3 packs most particles near the base.
    pub height_exponent: f32,
    /// Draws above this become foliage, the rest ornaments.
    pub ornament_fraction: f32,
    /// Foliage hue split on a second draw.
    pub foliage_split: f32,
    /// Ornament hue split on the first draw (must be below `ornament_fraction`).
    pub ornament_split: f32,
    pub foliage: Tier,
    pub ornament: Tier,
}

impl Default for BodyLayout {
    fn default() -> Self {
        Self {
            base_y: -3.0,
            height: 8.0,
            max_radius: 3.5,
            height_exponent: 3.0,
            ornament_fraction: 0.30,
            foliage_split: 0.5,
            ornament_split: 0.15,
            foliage: Tier {
                size: 0.25,
                brightness: 4.0,
            },
            ornament: Tier {
                size: 0.45,
                brightness: 6.0,
            },
        }
    }
}

/// Wide flat cloud around the tree. Never moves on morph.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLayout {
    pub min_y: f32,
    pub height: f32,
    pub radius: f32,
    pub size_min: f32,
    pub size_max: f32,
    pub brightness: f32,
}

impl Default for AmbientLayout {
    fn default() -> Self {
        Self {
            min_y: -4.0,
            height: 12.0,
            radius: 12.0,
            size_min: 0.2,
            size_max: 0.5,
            brightness: 3.0,
        }
    }
}

/// Garland wound around the cone from the top down.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralLayout {
    pub top_y: f32,
    /// Vertical distance covered from the first to the last particle.
    pub drop: f32,
    /// Curve radius at the bottom; grows linearly from zero at the top.
    pub max_radius: f32,
    pub turns: f32,
    /// Offset sphere radius is drawn per particle from this range.
    pub spread_min: f32,
    pub spread_max: f32,
    pub primary_threshold: f32,
    pub size_min: f32,
    pub size_max: f32,
    pub brightness: f32,
}

impl Default for SpiralLayout {
    fn default() -> Self {
        Self {
            top_y: 5.0,
            drop: 8.0,
            max_radius: 3.5,
            turns: 6.5,
            spread_min: 0.5,
            spread_max: 0.7,
            primary_threshold: 0.4,
            size_min: 0.2,
            size_max: 0.35,
            brightness: 6.5,
        }
    }
}

/// Star cluster at the apex.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrownLayout {
    pub apex: Vec3,
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Probability that a particle uses `outer_radius`.
    pub outer_chance: f32,
    pub radius_exponent: f32,
    pub primary_threshold: f32,
    pub size_min: f32,
    pub size_max: f32,
    pub brightness_min: f32,
    pub brightness_max: f32,
}

impl Default for CrownLayout {
    fn default() -> Self {
        Self {
            apex: Vec3::new(0.0, 5.2, 0.0),
            inner_radius: 0.2,
            outer_radius: 0.6,
            outer_chance: 0.2,
            radius_exponent: 3.0,
            primary_threshold: 0.3,
            size_min: 0.3,
            size_max: 0.7,
            brightness_min: 8.0,
            brightness_max: 12.0,
        }
    }
}

/// Every geometric constant the generator uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationLayout {
    pub body: BodyLayout,
    pub ambient: AmbientLayout,
    pub spiral: SpiralLayout,
    pub crown: CrownLayout,
    pub dispersed: DispersedVolume,
}

impl FormationLayout {
    /// Reject values that would produce non-finite or inverted geometry.
    pub fn validate(&self) -> ConfigResult<()> {
        let b = &self.body;
        check_non_negative("body.height", b.height)?;
        check_non_negative("body.max_radius", b.max_radius)?;
        check_positive("body.height_exponent", b.height_exponent)?;
        check_finite("body.base_y", b.base_y)?;
        check_unit("body.ornament_fraction", b.ornament_fraction)?;
        check_unit("body.foliage_split", b.foliage_split)?;
        check_unit("body.ornament_split", b.ornament_split)?;
        if b.ornament_split > b.ornament_fraction {
            return Err(ConfigError::invalid(
                "body.ornament_split must not exceed body.ornament_fraction",
            ));
        }
        for (name, tier) in [("body.foliage", b.foliage), ("body.ornament", b.ornament)] {
            check_non_negative(&format!("{name}.size"), tier.size)?;
            check_non_negative(&format!("{name}.brightness"), tier.brightness)?;
        }

        let a = &self.ambient;
        check_finite("ambient.min_y", a.min_y)?;
        check_non_negative("ambient.height", a.height)?;
        check_non_negative("ambient.radius", a.radius)?;
        check_range("ambient.size", a.size_min, a.size_max)?;
        check_non_negative("ambient.brightness", a.brightness)?;

        let s = &self.spiral;
        check_finite("spiral.top_y", s.top_y)?;
        check_finite("spiral.drop", s.drop)?;
        check_non_negative("spiral.max_radius", s.max_radius)?;
        check_finite("spiral.turns", s.turns)?;
        check_range("spiral.spread", s.spread_min, s.spread_max)?;
        check_unit("spiral.primary_threshold", s.primary_threshold)?;
        check_range("spiral.size", s.size_min, s.size_max)?;
        check_non_negative("spiral.brightness", s.brightness)?;

        let c = &self.crown;
        if !c.apex.is_finite() {
            return Err(ConfigError::invalid("crown.apex must be finite"));
        }
        check_non_negative("crown.inner_radius", c.inner_radius)?;
        check_non_negative("crown.outer_radius", c.outer_radius)?;
        check_unit("crown.outer_chance", c.outer_chance)?;
        check_positive("crown.radius_exponent", c.radius_exponent)?;
        check_unit("crown.primary_threshold", c.primary_threshold)?;
        check_range("crown.size", c.size_min, c.size_max)?;
        check_range("crown.brightness", c.brightness_min, c.brightness_max)?;

        self.dispersed.validate()
    }
}

pub(crate) fn check_finite(name: &str, v: f32) -> ConfigResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(format!("{name} must be finite, got {v}")))
    }
}

pub(crate) fn check_non_negative(name: &str, v: f32) -> ConfigResult<()> {
    check_finite(name, v)?;
    if v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(format!("{name} must not be negative, got {v}")))
    }
}

pub(crate) fn check_positive(name: &str, v: f32) -> ConfigResult<()> {
    check_finite(name, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(format!("{name} must be positive, got {v}")))
    }
}

pub(crate) fn check_unit(name: &str, v: f32) -> ConfigResult<()> {
    check_finite(name, v)?;
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(ConfigError::invalid(format!("{name} must be within [0, 1], got {v}")))
    }
}

pub(crate) fn check_range(name: &str, min: f32, max: f32) -> ConfigResult<()> {
    check_non_negative(&format!("{name}_min"), min)?;
    check_non_negative(&format!("{name}_max"), max)?;
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::invalid(format!(
            "{name}_min ({min}) is greater than {name}_max ({max})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        FormationLayout::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_nan() {
        let mut layout = FormationLayout::default();
        layout.body.max_radius = f32::NAN;
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("body.max_radius"));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut layout = FormationLayout::default();
        layout.crown.brightness_min = 20.0;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_rejects_split_above_fraction() {
        let mut layout = FormationLayout::default();
        layout.body.ornament_split = 0.5;
        assert!(layout.validate().is_err());
    }
}
