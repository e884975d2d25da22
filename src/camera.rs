//! Cameras: the transform the core consumes and the orbit camera the viewer drives.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// View and projection matrices for one frame.
///
/// This is all the interaction field needs from a camera; whoever owns
/// camera framing builds one per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTransform {
    pub view: Mat4,
    pub projection: Mat4,
}

impl CameraTransform {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    /// Camera at the origin looking down -Z with no projection.
    pub fn identity() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }

    #[inline]
    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Camera position in world space.
    pub fn eye(&self) -> Vec3 {
        self.view.inverse().transform_point3(Vec3::ZERO)
    }

    /// Unit view direction in world space.
    pub fn forward(&self) -> Vec3 {
        self.view
            .inverse()
            .transform_vector3(Vec3::NEG_Z)
            .normalize_or_zero()
    }

    /// World-space point for an NDC coordinate (`z` in the projection's depth range).
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        self.view_proj().inverse().project_point3(ndc)
    }

    /// True when both matrices hold only finite values.
    pub fn is_finite(&self) -> bool {
        self.view.is_finite() && self.projection.is_finite()
    }
}

/// Orbit bounds: zoom range and polar angle range measured from +Y.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitLimits {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            min_distance: 8.0,
            max_distance: 35.0,
            min_polar: PI / 3.0,
            max_polar: PI / 1.7,
        }
    }
}

/// Orbit camera for viewing the tree.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub limits: OrbitLimits,
}

impl OrbitCamera {
    /// Create a new camera with default positioning.
    pub fn new() -> Self {
        Self::looking_from(Vec3::new(0.0, 2.0, 15.0), Vec3::ZERO)
    }

    /// Camera at `eye` orbiting `target`.
    pub fn looking_from(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length();
        let pitch = if distance > 0.0 {
            (offset.y / distance).clamp(-1.0, 1.0).asin()
        } else {
            0.0
        };
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch,
            distance,
            target,
            fov_y: 45.0_f32.to_radians(),
            limits: OrbitLimits::default(),
        }
    }

    /// Initial framing: pull back further for portrait windows.
    pub fn framed_for_aspect(aspect: f32) -> Self {
        let z = if aspect < 1.0 { 20.0 } else { 15.0 };
        Self::looking_from(Vec3::new(0.0, 2.0, z), Vec3::ZERO)
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh(self.fov_y, aspect, 0.1, 1000.0)
    }

    pub fn transform(&self, aspect: f32) -> CameraTransform {
        CameraTransform::new(self.view_matrix(), self.projection_matrix(aspect))
    }

    /// Rotate by a drag delta in radians, respecting the polar limits.
    pub fn orbit(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw = (self.yaw + d_yaw).rem_euclid(TAU);
        self.pitch += d_pitch;
        self.clamp();
    }

    /// Move toward or away from the target.
    pub fn zoom(&mut self, amount: f32) {
        self.distance -= amount;
        self.clamp();
    }

    /// Spin around the target at `speed`, where 1.0 is one turn per minute.
    pub fn auto_rotate(&mut self, delta_time: f32, speed: f32) {
        self.orbit(-TAU / 60.0 * speed * delta_time, 0.0);
    }

    fn clamp(&mut self) {
        let l = &self.limits;
        self.distance = self.distance.clamp(l.min_distance, l.max_distance);
        // Pitch is the elevation, polar is measured from +Y.
        self.pitch = self.pitch.clamp(FRAC_PI_2 - l.max_polar, FRAC_PI_2 - l.min_polar);
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}
