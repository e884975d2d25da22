//! Sampling helpers for particle placement.
//!
//! Wraps a caller-supplied RNG so every population draws from the same stream.
//! All volume helpers use the corrected radial transforms: square root for
//! uniform area in a disk, cube root for uniform volume in a sphere, and
//! `acos(2v - 1)` for the polar angle so points don't bunch at the poles.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

/// Normalized progress of `index` through `count` items, in `[0, 1)`.
///
/// Returns 0 for an empty run so callers never divide by zero.
#[inline]
pub fn progress(index: usize, count: usize) -> f32 {
    if count == 0 {
        0.0
    } else {
        index as f32 / count as f32
    }
}

/// Random draws for one generation pass.
///
/// ```ignore
/// let mut rng = SmallRng::seed_from_u64(7);
/// let mut sampler = Sampler::new(&mut rng);
/// let offset = sampler.random_in_sphere(0.5);
/// ```
pub struct Sampler<'a, R: Rng> {
    rng: &'a mut R,
}

impl<'a, R: Rng> Sampler<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Self { rng }
    }

    // ========== Random primitives ==========

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Random angle in `[0, 2π)`.
    #[inline]
    pub fn random_angle(&mut self) -> f32 {
        self.random() * TAU
    }

    /// Random polar angle in `[0, π]` with uniform density on the sphere.
    #[inline]
    pub fn random_polar(&mut self) -> f32 {
        (2.0 * self.random() - 1.0).clamp(-1.0, 1.0).acos()
    }

    // ========== Position helpers ==========

    /// Random point inside a sphere of given radius, centered at origin.
    ///
    /// Distribution is uniform throughout the volume.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        let theta = self.random_angle();
        let phi = self.random_polar();
        let r = radius * self.random().cbrt();
        spherical(r, theta, phi)
    }

    /// Random point inside a sphere with density concentrated at the center.
    ///
    /// The radius is `u^exponent * radius`; `exponent = 3` is the crown's
    /// tight cluster.
    pub fn biased_in_sphere(&mut self, radius: f32, exponent: f32) -> Vec3 {
        let theta = self.random_angle();
        let phi = self.random_polar();
        let r = self.random().powf(exponent) * radius;
        spherical(r, theta, phi)
    }

    /// Random point inside a disk in the XZ plane at y=0.
    ///
    /// Uniform in area, not in radius.
    pub fn random_in_disk(&mut self, radius: f32) -> Vec3 {
        let theta = self.random_angle();
        let r = radius * self.random().sqrt();
        Vec3::new(r * theta.cos(), 0.0, r * theta.sin())
    }

    /// Random point inside an axis-aligned box of the given full extents,
    /// centered at origin.
    pub fn random_in_box(&mut self, extents: Vec3) -> Vec3 {
        Vec3::new(
            (self.random() - 0.5) * extents.x,
            (self.random() - 0.5) * extents.y,
            (self.random() - 0.5) * extents.z,
        )
    }
}

/// Spherical to cartesian with the polar axis along Z.
#[inline]
fn spherical(r: f32, theta: f32, phi: f32) -> Vec3 {
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}
