//! Pointer-driven repulsion field.
//!
//! Each frame the pointer is projected onto a plane that faces the camera and
//! its distance from the viewport center is turned into an intensity that
//! fades to zero near the edges.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::CameraTransform;
use crate::error::{ConfigError, ConfigResult};
use crate::layout::{check_finite, check_non_negative};

/// Hermite smoothstep. Works with `edge0 > edge1` for a falling curve.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Tuning for the interaction field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pointer length (NDC units) where the fade starts.
    pub fade_start: f32,
    /// Pointer length where intensity reaches zero.
    pub fade_end: f32,
    /// Repulsion radius in the compact formation.
    pub repel_radius: f32,
    /// Extra radius gained at full dispersal.
    pub repel_radius_growth: f32,
    /// Maximum displacement applied at the repulsion center.
    pub repel_strength: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            fade_start: 0.6,
            fade_end: 0.95,
            repel_radius: 2.0,
            repel_radius_growth: 5.0,
            repel_strength: 0.1,
        }
    }
}

impl InteractionConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_non_negative("interaction.fade_start", self.fade_start)?;
        check_non_negative("interaction.fade_end", self.fade_end)?;
        if self.fade_start > self.fade_end {
            return Err(ConfigError::invalid(
                "interaction.fade_start must not exceed interaction.fade_end",
            ));
        }
        check_non_negative("interaction.repel_radius", self.repel_radius)?;
        check_finite("interaction.repel_radius_growth", self.repel_radius_growth)?;
        check_finite("interaction.repel_strength", self.repel_strength)
    }

    /// Repulsion radius for the given morph progress.
    #[inline]
    pub fn repulsion_radius(&self, morph_progress: f32) -> f32 {
        (self.repel_radius + morph_progress * self.repel_radius_growth).max(0.0)
    }
}

/// One frame's repulsion source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionSample {
    pub point: Vec3,
    pub intensity: f32,
}

/// Maps pointer input to a world-space repulsion source.
///
/// Remembers the last good point so a degenerate camera or pointer degrades
/// to a frozen source instead of a NaN.
#[derive(Clone, Debug)]
pub struct InteractionField {
    config: InteractionConfig,
    last_point: Vec3,
}

impl InteractionField {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            last_point: Vec3::ZERO,
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Intensity for a pointer: 1 near the center, 0 at and beyond `fade_end`.
    pub fn intensity(&self, pointer_ndc: Vec2) -> f32 {
        if !pointer_ndc.is_finite() {
            return 0.0;
        }
        1.0 - smoothstep(self.config.fade_start, self.config.fade_end, pointer_ndc.length())
    }

    /// Where the pointer ray meets the camera-facing reference plane.
    ///
    /// The plane is perpendicular to the view axis at the depth of the world
    /// origin, so it follows the camera as it orbits. Returns `None` when the
    /// ray is parallel to the plane or the math goes non-finite.
    pub fn project(pointer_ndc: Vec2, camera: &CameraTransform) -> Option<Vec3> {
        if !pointer_ndc.is_finite() || !camera.is_finite() {
            return None;
        }
        let eye = camera.eye();
        let forward = camera.forward();
        let through = camera.unproject(pointer_ndc.extend(0.5));
        let dir = (through - eye).normalize_or_zero();

        let facing = dir.dot(forward);
        if facing.abs() < 1e-6 {
            return None;
        }
        let depth = (Vec3::ZERO - eye).dot(forward);
        let point = eye + dir * (depth / facing);
        point.is_finite().then_some(point)
    }

    /// Sample the field for this frame.
    pub fn sample(&mut self, pointer_ndc: Vec2, camera: &CameraTransform) -> InteractionSample {
        match Self::project(pointer_ndc, camera) {
            Some(point) => self.last_point = point,
            None => {
                tracing::trace!(target: "interaction", "degenerate pointer ray, keeping last point");
            }
        }
        InteractionSample {
            point: self.last_point,
            intensity: self.intensity(pointer_ndc),
        }
    }
}

impl Default for InteractionField {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}
