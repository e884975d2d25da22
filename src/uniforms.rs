//! Per-frame values handed to the shading stage.
//!
//! [`FrameUniforms`] is the immutable snapshot the scene publishes every tick.
//! [`GpuUniforms`] is its uniform-buffer layout, combined with the camera and
//! the static shading parameters.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::camera::CameraTransform;
use crate::shading::ShadingParams;

/// Everything that changes per frame, as one value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameUniforms {
    /// Seconds since the session started. Never decreases.
    pub elapsed_time: f32,
    /// World-space repulsion source.
    pub interaction_point: Vec3,
    /// Repulsion strength multiplier in `[0, 1]`.
    pub interaction_intensity: f32,
    /// Morph progress in `[0, 1]`, 0 is compact.
    pub morph_progress: f32,
    /// Repulsion radius for this frame's morph progress.
    pub repulsion_radius: f32,
}

impl FrameUniforms {
    /// Values before any tick: compact, no interaction.
    pub fn initial(repulsion_radius: f32) -> Self {
        Self {
            elapsed_time: 0.0,
            interaction_point: Vec3::ZERO,
            interaction_intensity: 0.0,
            morph_progress: 0.0,
            repulsion_radius,
        }
    }

    /// Morph progress after the smoothstep easing the shader applies.
    #[inline]
    pub fn eased_progress(&self) -> f32 {
        crate::interaction::smoothstep(0.0, 1.0, self.morph_progress)
    }
}

/// Uniform buffer layout shared by the particle and decor shaders.
///
/// Every scalar group is packed into a `vec4` so the Rust and WGSL layouts
/// agree without manual padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// xyz interaction point, w intensity.
    pub interaction: [f32; 4],
    /// time, morph progress, repulsion radius, repulsion strength.
    pub frame: [f32; 4],
    /// viewport width, viewport height, point scale, glow exponent.
    pub viewport: [f32; 4],
    /// rotation speed, rotation twist, rotation lock, unused.
    pub rotation: [f32; 4],
    /// sway threshold, bright amplitude, dim amplitude, unused.
    pub sway: [f32; 4],
    /// twinkle threshold, fast speed, slow speed, phase scale.
    pub twinkle: [f32; 4],
    /// alpha base, alpha amplitude, unused, unused.
    pub alpha: [f32; 4],
}

// A macro so shader sources can `concat!` it into their own constants.
macro_rules! uniforms_wgsl {
    () => {
        r#"struct Uniforms {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    interaction: vec4<f32>,
    frame: vec4<f32>,
    viewport: vec4<f32>,
    rotation: vec4<f32>,
    sway: vec4<f32>,
    twinkle: vec4<f32>,
    alpha: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

fn quad_corner(index: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    return corners[index];
}

// Expand a particle center into a screen-aligned quad `size_px` pixels wide.
fn billboard(center: vec4<f32>, corner: vec2<f32>, size_px: f32) -> vec4<f32> {
    var clip = center;
    clip.x += corner.x * size_px / uniforms.viewport.x * clip.w;
    clip.y += corner.y * size_px / uniforms.viewport.y * clip.w;
    return clip;
}

// Soft disc falloff; negative outside the point.
fn point_glow(uv: vec2<f32>, exponent: f32) -> f32 {
    let r = length(uv) * 0.5;
    if r > 0.5 {
        return -1.0;
    }
    return pow(max(1.0 - r * 2.0, 0.0), exponent);
}
"#
    };
}
pub(crate) use uniforms_wgsl;

/// WGSL declaration matching [`GpuUniforms`], plus the quad helpers every
/// point shader shares.
pub const UNIFORMS_WGSL: &str = uniforms_wgsl!();

impl GpuUniforms {
    pub fn new(
        frame: &FrameUniforms,
        camera: &CameraTransform,
        shading: &ShadingParams,
        repel_strength: f32,
        viewport: [f32; 2],
    ) -> Self {
        let view_proj: Mat4 = camera.view_proj();
        let p = frame.interaction_point;
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            view: camera.view.to_cols_array_2d(),
            interaction: [p.x, p.y, p.z, frame.interaction_intensity],
            frame: [
                frame.elapsed_time,
                frame.morph_progress,
                frame.repulsion_radius,
                repel_strength,
            ],
            viewport: [
                viewport[0],
                viewport[1],
                shading.point_scale,
                shading.glow_exponent,
            ],
            rotation: [
                shading.rotation_speed,
                shading.rotation_twist,
                shading.rotation_lock,
                0.0,
            ],
            sway: [
                shading.sway_threshold,
                shading.sway_bright,
                shading.sway_dim,
                0.0,
            ],
            twinkle: [
                shading.twinkle_threshold,
                shading.twinkle_fast,
                shading.twinkle_slow,
                shading.phase_scale,
            ],
            alpha: [shading.alpha_base, shading.alpha_amplitude, 0.0, 0.0],
        }
    }
}
