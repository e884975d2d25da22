//! Morph targets: what the dispersed formation looks like.
//!
//! This is the only place that shapes the large formation. Which populations
//! take part is decided per population through [`MorphRule`]; there is no
//! implicit default.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::layout::{check_finite, check_non_negative};
use crate::spawn::Sampler;

/// How a population's expanded position is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MorphRule {
    /// Expanded position is the rest position; the particle never moves.
    Static,
    /// Anywhere in the body of the dispersed cone.
    Dispersed,
    /// A small cluster at the dispersed cone's apex.
    DispersedApex,
}

impl MorphRule {
    /// Resolve the expanded position for a particle resting at `rest`.
    pub fn resolve<R: Rng>(
        self,
        rest: Vec3,
        volume: &DispersedVolume,
        sampler: &mut Sampler<'_, R>,
    ) -> Vec3 {
        match self {
            MorphRule::Static => rest,
            MorphRule::Dispersed => volume.sample_body(sampler),
            MorphRule::DispersedApex => volume.sample_apex(sampler),
        }
    }
}

/// The tall, wide cone particles scatter into when the tree disperses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispersedVolume {
    pub base_y: f32,
    pub height: f32,
    pub radius: f32,
    /// Radius of the apex cluster.
    pub apex_radius: f32,
}

impl Default for DispersedVolume {
    fn default() -> Self {
        Self {
            base_y: -25.0,
            height: 60.0,
            radius: 30.0,
            apex_radius: 2.0,
        }
    }
}

impl DispersedVolume {
    /// Height of the cone tip.
    #[inline]
    pub fn apex_y(&self) -> f32 {
        self.base_y + self.height
    }

    /// Cone radius at relative height `y_rel` in `[0, 1]`.
    #[inline]
    pub fn radius_at(&self, y_rel: f32) -> f32 {
        self.radius * (1.0 - y_rel)
    }

    /// Random point in the cone body.
    ///
    /// Height is uniform; within a height band the point is uniform in area.
    pub fn sample_body<R: Rng>(&self, sampler: &mut Sampler<'_, R>) -> Vec3 {
        let y_rel = sampler.random();
        let y = self.base_y + y_rel * self.height;
        let disk = sampler.random_in_disk(self.radius_at(y_rel));
        Vec3::new(disk.x, y, disk.z)
    }

    /// Random point in the apex cluster, denser toward its center.
    pub fn sample_apex<R: Rng>(&self, sampler: &mut Sampler<'_, R>) -> Vec3 {
        let offset = sampler.biased_in_sphere(self.apex_radius, 3.0);
        // Polar axis is Z in the sampler; the cluster uses Y as its axis.
        Vec3::new(offset.x, self.apex_y() + offset.z, offset.y)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_finite("dispersed.base_y", self.base_y)?;
        check_non_negative("dispersed.height", self.height)?;
        check_non_negative("dispersed.radius", self.radius)?;
        check_non_negative("dispersed.apex_radius", self.apex_radius)
    }
}
