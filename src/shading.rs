//! Particle shading: the vertex/fragment math for the tree.
//!
//! [`PARTICLE_WGSL`] is what the GPU runs. [`shade_particle`] and
//! [`point_glow`] compute the same thing on the CPU so the math can be tested
//! and benchmarked without a device.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::generator::Particle;
use crate::interaction::smoothstep;
use crate::layout::{check_finite, check_non_negative};
use crate::uniforms::{uniforms_wgsl, FrameUniforms};

/// Static shading constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingParams {
    /// Swirl angle gained per second.
    pub rotation_speed: f32,
    /// Swirl angle gained per unit of height.
    pub rotation_twist: f32,
    /// Morph progress above which the swirl stops entirely.
    pub rotation_lock: f32,
    /// Brightness above which particles sway with `sway_bright`.
    pub sway_threshold: f32,
    pub sway_bright: f32,
    pub sway_dim: f32,
    /// Point size numerator before dividing by view depth.
    pub point_scale: f32,
    /// Brightness above which particles twinkle at `twinkle_fast`.
    pub twinkle_threshold: f32,
    pub twinkle_fast: f32,
    pub twinkle_slow: f32,
    /// Multiplier on the random phase inside the twinkle sine.
    pub phase_scale: f32,
    pub alpha_base: f32,
    pub alpha_amplitude: f32,
    /// Exponent of the soft point falloff.
    pub glow_exponent: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            rotation_speed: 0.1,
            rotation_twist: 0.1,
            rotation_lock: 0.8,
            sway_threshold: 8.0,
            sway_bright: 0.005,
            sway_dim: 0.02,
            point_scale: 300.0,
            twinkle_threshold: 5.0,
            twinkle_fast: 5.0,
            twinkle_slow: 3.0,
            phase_scale: 10.0,
            alpha_base: 0.6,
            alpha_amplitude: 0.4,
            glow_exponent: 1.5,
        }
    }
}

impl ShadingParams {
    pub fn validate(&self) -> ConfigResult<()> {
        check_finite("shading.rotation_speed", self.rotation_speed)?;
        check_finite("shading.rotation_twist", self.rotation_twist)?;
        check_finite("shading.rotation_lock", self.rotation_lock)?;
        check_finite("shading.sway_threshold", self.sway_threshold)?;
        check_non_negative("shading.sway_bright", self.sway_bright)?;
        check_non_negative("shading.sway_dim", self.sway_dim)?;
        check_non_negative("shading.point_scale", self.point_scale)?;
        check_finite("shading.twinkle_threshold", self.twinkle_threshold)?;
        check_finite("shading.twinkle_fast", self.twinkle_fast)?;
        check_finite("shading.twinkle_slow", self.twinkle_slow)?;
        check_finite("shading.phase_scale", self.phase_scale)?;
        check_finite("shading.alpha_base", self.alpha_base)?;
        check_finite("shading.alpha_amplitude", self.alpha_amplitude)?;
        check_finite("shading.glow_exponent", self.glow_exponent)?;
        if self.glow_exponent <= 0.0 {
            return Err(ConfigError::invalid("shading.glow_exponent must be positive"));
        }
        Ok(())
    }
}

/// A particle after the vertex stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadedParticle {
    /// Final world-space position.
    pub position: Vec3,
    /// Distance in front of the camera; non-positive means behind it.
    pub view_depth: f32,
    /// Point diameter in pixels. Zero behind the camera.
    pub point_size: f32,
    /// Color already multiplied by brightness.
    pub color: Vec3,
    pub alpha: f32,
    /// Repulsion force in `[0, 1]` acting on the particle.
    pub force: f32,
}

/// Falloff of the repulsion field at `distance` from its center.
#[inline]
pub fn repulsion_force(radius: f32, distance: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    smoothstep(radius, 0.0, distance)
}

/// Run the vertex stage for one particle.
pub fn shade_particle(
    particle: &Particle,
    frame: &FrameUniforms,
    view: &Mat4,
    params: &ShadingParams,
    repel_strength: f32,
) -> ShadedParticle {
    let t = frame.elapsed_time;
    let eased = frame.eased_progress();
    let mut pos = particle
        .rest_position
        .lerp(particle.expanded_position, eased);

    // Swirl about Y, fading out with the morph and locked once mostly dispersed.
    let angle = if frame.morph_progress > params.rotation_lock {
        0.0
    } else {
        (t * params.rotation_speed + pos.y * params.rotation_twist) * (1.0 - eased)
    };
    let (s, c) = angle.sin_cos();
    pos = Vec3::new(pos.x * c - pos.z * s, pos.y, pos.x * s + pos.z * c);

    let sway = if particle.brightness > params.sway_threshold {
        params.sway_bright
    } else {
        params.sway_dim
    };
    pos.x += (t + pos.y).sin() * sway;
    pos.z += (t + particle.rest_position.y).cos() * sway;

    let offset = pos - frame.interaction_point;
    let force = repulsion_force(frame.repulsion_radius, offset.length());
    pos += offset.normalize_or_zero() * force * repel_strength * frame.interaction_intensity;

    let view_depth = -view.transform_point3(pos).z;
    let point_size = if view_depth > 0.0 {
        particle.size * (1.0 + force) * params.point_scale / view_depth
    } else {
        0.0
    };

    let speed = if particle.brightness > params.twinkle_threshold {
        params.twinkle_fast
    } else {
        params.twinkle_slow
    };
    let alpha = params.alpha_base
        + params.alpha_amplitude * (t * speed + particle.random_phase * params.phase_scale).sin();

    ShadedParticle {
        position: pos,
        view_depth,
        point_size,
        color: particle.color * particle.brightness,
        alpha,
        force,
    }
}

/// Soft disc falloff at distance `r` from the point center, where the point
/// spans `r` in `[0, 0.5]`. `None` means the fragment is discarded.
#[inline]
pub fn point_glow(r: f32, exponent: f32) -> Option<f32> {
    if !(0.0..=0.5).contains(&r) {
        return None;
    }
    Some((1.0 - r * 2.0).max(0.0).powf(exponent))
}

/// Tree particle shader. Instance attributes come from one vertex buffer per
/// attribute, in the order rest, expanded, color, brightness, size, phase.
pub const PARTICLE_WGSL: &str = concat!(
    uniforms_wgsl!(),
    r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) alpha: f32,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) rest: vec3<f32>,
    @location(1) expanded: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) brightness: f32,
    @location(4) size: f32,
    @location(5) phase: f32,
) -> VertexOutput {
    let t = uniforms.frame.x;
    let progress = uniforms.frame.y;
    let eased = smoothstep(0.0, 1.0, progress);
    var pos = mix(rest, expanded, eased);

    var angle = 0.0;
    if progress <= uniforms.rotation.z {
        angle = (t * uniforms.rotation.x + pos.y * uniforms.rotation.y) * (1.0 - eased);
    }
    let c = cos(angle);
    let s = sin(angle);
    pos = vec3<f32>(pos.x * c - pos.z * s, pos.y, pos.x * s + pos.z * c);

    var sway = uniforms.sway.z;
    if brightness > uniforms.sway.x {
        sway = uniforms.sway.y;
    }
    pos.x += sin(t + pos.y) * sway;
    pos.z += cos(t + rest.y) * sway;

    let offset = pos - uniforms.interaction.xyz;
    let dist = length(offset);
    let radius = uniforms.frame.z;
    var force = 0.0;
    if radius > 0.0 {
        force = 1.0 - smoothstep(0.0, radius, dist);
    }
    if dist > 0.0 {
        pos += offset / dist * force * uniforms.frame.w * uniforms.interaction.w;
    }

    let view_pos = uniforms.view * vec4<f32>(pos, 1.0);
    let depth = max(-view_pos.z, 0.001);
    let size_px = size * (1.0 + force) * uniforms.viewport.z / depth;

    var speed = uniforms.twinkle.z;
    if brightness > uniforms.twinkle.x {
        speed = uniforms.twinkle.y;
    }

    let corner = quad_corner(vertex_index);
    var out: VertexOutput;
    out.clip_position = billboard(uniforms.view_proj * vec4<f32>(pos, 1.0), corner, size_px);
    out.color = color * brightness;
    out.alpha = uniforms.alpha.x + uniforms.alpha.y * sin(t * speed + phase * uniforms.twinkle.w);
    out.uv = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let glow = point_glow(in.uv, uniforms.viewport.w);
    if glow < 0.0 {
        discard;
    }
    return vec4<f32>(in.color, in.alpha * glow);
}
"#
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;

    fn particle(rest: Vec3, expanded: Vec3, brightness: f32) -> Particle {
        Particle {
            rest_position: rest,
            expanded_position: expanded,
            color: Vec3::new(1.0, 0.5, 0.25),
            brightness,
            size: 0.25,
            random_phase: 0.3,
        }
    }

    fn still() -> ShadingParams {
        ShadingParams {
            rotation_speed: 0.0,
            rotation_twist: 0.0,
            sway_bright: 0.0,
            sway_dim: 0.0,
            ..Default::default()
        }
    }

    fn frame(progress: f32) -> FrameUniforms {
        FrameUniforms {
            morph_progress: progress,
            interaction_point: Vec3::new(100.0, 100.0, 100.0),
            ..FrameUniforms::initial(2.0)
        }
    }

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_particle_wgsl_validates() {
        validate_wgsl(PARTICLE_WGSL).unwrap();
    }

    #[test]
    fn test_compact_and_dispersed_endpoints() {
        let p = particle(Vec3::new(1.0, 2.0, 0.5), Vec3::new(-9.0, 20.0, 4.0), 4.0);
        let view = Mat4::IDENTITY;
        let compact = shade_particle(&p, &frame(0.0), &view, &still(), 0.1);
        assert!(compact.position.abs_diff_eq(p.rest_position, 1e-6));
        let dispersed = shade_particle(&p, &frame(1.0), &view, &still(), 0.1);
        assert!(dispersed.position.abs_diff_eq(p.expanded_position, 1e-5));
    }

    #[test]
    fn test_swirl_keeps_height_and_radius() {
        let p = particle(Vec3::new(2.0, 3.0, 1.0), Vec3::ZERO, 4.0);
        let params = ShadingParams {
            sway_bright: 0.0,
            sway_dim: 0.0,
            ..Default::default()
        };
        let mut f = frame(0.0);
        f.elapsed_time = 7.0;
        let out = shade_particle(&p, &f, &Mat4::IDENTITY, &params, 0.1);
        assert!((out.position.y - 3.0).abs() < 1e-6);
        let planar = |v: Vec3| (v.x * v.x + v.z * v.z).sqrt();
        assert!((planar(out.position) - planar(p.rest_position)).abs() < 1e-5);
        assert!(!out.position.abs_diff_eq(p.rest_position, 1e-3));
    }

    #[test]
    fn test_swirl_locked_when_mostly_dispersed() {
        let p = particle(Vec3::new(2.0, 3.0, 1.0), Vec3::new(2.0, 3.0, 1.0), 4.0);
        let params = ShadingParams {
            sway_bright: 0.0,
            sway_dim: 0.0,
            ..Default::default()
        };
        let mut f = frame(0.85);
        f.elapsed_time = 7.0;
        let out = shade_particle(&p, &f, &Mat4::IDENTITY, &params, 0.1);
        assert!(out.position.abs_diff_eq(p.rest_position, 1e-5));
    }

    #[test]
    fn test_bright_particles_sway_less() {
        let params = ShadingParams {
            rotation_speed: 0.0,
            rotation_twist: 0.0,
            ..Default::default()
        };
        let mut f = frame(0.0);
        f.elapsed_time = 1.3;
        let rest = Vec3::new(0.0, 0.2, 0.0);
        let dim = shade_particle(&particle(rest, rest, 4.0), &f, &Mat4::IDENTITY, &params, 0.1);
        let bright = shade_particle(&particle(rest, rest, 10.0), &f, &Mat4::IDENTITY, &params, 0.1);
        assert!(bright.position.distance(rest) < dim.position.distance(rest));
    }

    #[test]
    fn test_repulsion_pushes_away() {
        let p = particle(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, 4.0);
        let f = FrameUniforms {
            interaction_intensity: 1.0,
            ..FrameUniforms::initial(2.0)
        };
        let out = shade_particle(&p, &f, &Mat4::IDENTITY, &still(), 0.1);
        assert!(out.force > 0.0);
        assert!(out.position.x > 1.0);
        assert!(out.position.x <= 1.1);
    }

    #[test]
    fn test_no_repulsion_without_intensity() {
        let p = particle(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, 4.0);
        let f = FrameUniforms::initial(2.0);
        let out = shade_particle(&p, &f, &Mat4::IDENTITY, &still(), 0.1);
        assert_eq!(out.position, p.rest_position);
    }

    #[test]
    fn test_particle_on_interaction_point_is_finite() {
        let p = particle(Vec3::ZERO, Vec3::ZERO, 4.0);
        let f = FrameUniforms {
            interaction_intensity: 1.0,
            ..FrameUniforms::initial(2.0)
        };
        let out = shade_particle(&p, &f, &Mat4::IDENTITY, &still(), 0.1);
        assert!(out.position.is_finite());
        assert_eq!(out.force, 1.0);
    }

    #[test]
    fn test_point_size_attenuates_with_depth() {
        let view = OrbitCamera::looking_from(Vec3::new(0.0, 0.0, 15.0), Vec3::ZERO).view_matrix();
        let near = particle(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 4.0);
        let far = particle(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, 4.0);
        let a = shade_particle(&near, &frame(0.0), &view, &still(), 0.1);
        let b = shade_particle(&far, &frame(0.0), &view, &still(), 0.1);
        assert!((a.view_depth - 10.0).abs() < 1e-4);
        assert!((a.point_size - 0.25 * 300.0 / 10.0).abs() < 1e-3);
        assert!(a.point_size > b.point_size);
    }

    #[test]
    fn test_behind_camera_has_no_size() {
        let p = particle(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 4.0);
        let out = shade_particle(&p, &frame(0.0), &Mat4::IDENTITY, &still(), 0.1);
        assert!(out.view_depth < 0.0);
        assert_eq!(out.point_size, 0.0);
    }

    #[test]
    fn test_alpha_stays_in_twinkle_band() {
        let p = particle(Vec3::ZERO, Vec3::ZERO, 6.0);
        for i in 0..100 {
            let mut f = frame(0.0);
            f.elapsed_time = i as f32 * 0.173;
            let out = shade_particle(&p, &f, &Mat4::IDENTITY, &still(), 0.1);
            assert!(out.alpha >= 0.2 - 1e-5 && out.alpha <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn test_color_scaled_by_brightness() {
        let p = particle(Vec3::ZERO, Vec3::ZERO, 6.0);
        let out = shade_particle(&p, &frame(0.0), &Mat4::IDENTITY, &still(), 0.1);
        assert_eq!(out.color, Vec3::new(6.0, 3.0, 1.5));
    }

    #[test]
    fn test_point_glow() {
        assert_eq!(point_glow(0.0, 1.5), Some(1.0));
        assert_eq!(point_glow(0.5, 1.5), Some(0.0));
        assert_eq!(point_glow(0.51, 1.5), None);
        let mid = point_glow(0.25, 1.5).unwrap();
        assert!((mid - 0.5f32.powf(1.5)).abs() < 1e-6);
    }

    #[test]
    fn test_repulsion_force_edges() {
        assert_eq!(repulsion_force(2.0, 0.0), 1.0);
        assert_eq!(repulsion_force(2.0, 2.0), 0.0);
        assert_eq!(repulsion_force(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_params_validation() {
        ShadingParams::default().validate().unwrap();
        let bad = ShadingParams {
            glow_exponent: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
