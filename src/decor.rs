//! Ambient decor around the tree: falling snow, drifting fireflies and a
//! glittering ground disc.
//!
//! Decor particles only depend on time. They ignore the pointer and the morph,
//! so they are generated once and animated entirely in [`DECOR_WGSL`], with
//! [`decor_position`] and [`decor_alpha`] as the CPU reference.

use std::ops::Range;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::interaction::smoothstep;
use crate::layout::{check_finite, check_non_negative, check_range};
use crate::shading::point_glow;
use crate::spawn::Sampler;
use crate::uniforms::uniforms_wgsl;

/// The three decor layers, in buffer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DecorLayer {
    Snow = 0,
    Fireflies = 1,
    Ground = 2,
}

impl DecorLayer {
    pub const ALL: [DecorLayer; 3] = [DecorLayer::Snow, DecorLayer::Fireflies, DecorLayer::Ground];

    pub fn name(self) -> &'static str {
        match self {
            DecorLayer::Snow => "snow",
            DecorLayer::Fireflies => "fireflies",
            DecorLayer::Ground => "ground",
        }
    }

    /// Flat color of the layer.
    pub fn color(self) -> Vec3 {
        match self {
            DecorLayer::Snow => Vec3::ONE,
            DecorLayer::Fireflies => Vec3::new(1.0, 0.9, 0.4),
            DecorLayer::Ground => Vec3::new(0.8, 0.9, 1.0),
        }
    }

    /// Exponent of the soft point falloff.
    pub fn glow_exponent(self) -> f32 {
        match self {
            DecorLayer::Snow | DecorLayer::Fireflies => 2.0,
            DecorLayer::Ground => 3.0,
        }
    }

    fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(DecorLayer::Snow),
            1 => Some(DecorLayer::Fireflies),
            2 => Some(DecorLayer::Ground),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowConfig {
    pub count: usize,
    /// Full size of the box snow falls through, centered at the origin.
    pub extents: Vec3,
    pub speed_min: f32,
    pub speed_max: f32,
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            count: 8_000,
            extents: Vec3::new(40.0, 30.0, 30.0),
            speed_min: 1.0,
            speed_max: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireflyConfig {
    pub count: usize,
    pub extents: Vec3,
}

impl Default for FireflyConfig {
    fn default() -> Self {
        Self {
            count: 150,
            extents: Vec3::new(25.0, 15.0, 25.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub count: usize,
    pub radius: f32,
    pub height: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            count: 3_000,
            radius: 20.0,
            height: -3.5,
        }
    }
}

/// Decor layer settings. Any layer may be empty.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorConfig {
    pub enabled: bool,
    pub snow: SnowConfig,
    pub fireflies: FireflyConfig,
    pub ground: GroundConfig,
}

impl Default for DecorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            snow: SnowConfig::default(),
            fireflies: FireflyConfig::default(),
            ground: GroundConfig::default(),
        }
    }
}

impl DecorConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_extents("decor.snow.extents", self.snow.extents)?;
        check_range("decor.snow.speed", self.snow.speed_min, self.snow.speed_max)?;
        check_extents("decor.fireflies.extents", self.fireflies.extents)?;
        check_non_negative("decor.ground.radius", self.ground.radius)?;
        check_finite("decor.ground.height", self.ground.height)
    }

    pub fn count(&self, layer: DecorLayer) -> usize {
        if !self.enabled {
            return 0;
        }
        match layer {
            DecorLayer::Snow => self.snow.count,
            DecorLayer::Fireflies => self.fireflies.count,
            DecorLayer::Ground => self.ground.count,
        }
    }
}

fn check_extents(name: &str, extents: Vec3) -> ConfigResult<()> {
    check_non_negative(&format!("{name}.x"), extents.x)?;
    check_non_negative(&format!("{name}.y"), extents.y)?;
    check_non_negative(&format!("{name}.z"), extents.z)
}

/// Static decor attributes, one array per attribute.
#[derive(Clone, Debug, Default)]
pub struct DecorBuffers {
    origins: Vec<Vec3>,
    randoms: Vec<f32>,
    /// Fall speed for snow, size scale for fireflies, unused for ground.
    speeds: Vec<f32>,
    layers: Vec<u32>,
    ranges: [Range<usize>; 3],
}

impl DecorBuffers {
    #[inline]
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn range(&self, layer: DecorLayer) -> Range<usize> {
        self.ranges[layer as usize].clone()
    }

    pub fn origins(&self) -> &[Vec3] {
        &self.origins
    }

    pub fn randoms(&self) -> &[f32] {
        &self.randoms
    }

    pub fn speeds(&self) -> &[f32] {
        &self.speeds
    }

    pub fn layers(&self) -> &[u32] {
        &self.layers
    }

    /// Layer of decor particle `index`.
    pub fn layer(&self, index: usize) -> Option<DecorLayer> {
        self.layers.get(index).copied().and_then(DecorLayer::from_index)
    }
}

/// Generate all decor layers.
pub fn generate_decor<R: Rng>(config: &DecorConfig, rng: &mut R) -> ConfigResult<DecorBuffers> {
    config.validate()?;

    let total: usize = DecorLayer::ALL.iter().map(|&l| config.count(l)).sum();
    let mut buffers = DecorBuffers {
        origins: Vec::with_capacity(total),
        randoms: Vec::with_capacity(total),
        speeds: Vec::with_capacity(total),
        layers: Vec::with_capacity(total),
        ranges: Default::default(),
    };
    let mut sampler = Sampler::new(rng);

    for layer in DecorLayer::ALL {
        let start = buffers.len();
        for _ in 0..config.count(layer) {
            let (origin, speed) = match layer {
                DecorLayer::Snow => {
                    let snow = &config.snow;
                    let origin = sampler.random_in_box(snow.extents);
                    (origin, sampler.random_range(snow.speed_min, snow.speed_max))
                }
                DecorLayer::Fireflies => {
                    let origin = sampler.random_in_box(config.fireflies.extents);
                    (origin, sampler.random())
                }
                DecorLayer::Ground => {
                    let disk = sampler.random_in_disk(config.ground.radius);
                    (Vec3::new(disk.x, config.ground.height, disk.z), 0.0)
                }
            };
            buffers.origins.push(origin);
            buffers.speeds.push(speed);
            buffers.randoms.push(sampler.random());
            buffers.layers.push(layer as u32);
        }
        buffers.ranges[layer as usize] = start..buffers.len();
    }

    tracing::info!(
        target: "decor",
        snow = config.count(DecorLayer::Snow),
        fireflies = config.count(DecorLayer::Fireflies),
        ground = config.count(DecorLayer::Ground),
        "decor generated"
    );

    Ok(buffers)
}

/// World position of a decor particle at time `t`.
pub fn decor_position(layer: DecorLayer, origin: Vec3, random: f32, speed: f32, t: f32) -> Vec3 {
    match layer {
        DecorLayer::Snow => {
            let y = (origin.y - t * speed + 15.0).rem_euclid(30.0) - 15.0;
            Vec3::new(
                origin.x + (t * 2.0 + random * 10.0).sin() * 0.1,
                y,
                origin.z + (t * 1.5 + random * 20.0).cos() * 0.1,
            )
        }
        DecorLayer::Fireflies => {
            let x = origin.x + (t * 0.5 + origin.y).sin() * 1.5;
            let y = origin.y + (t * 0.3 + origin.x).cos() + t * 0.2;
            let z = origin.z + (t * 0.4 + origin.z).sin() * 1.5;
            Vec3::new(x, (y + 10.0).rem_euclid(20.0) - 10.0, z)
        }
        DecorLayer::Ground => {
            let wave = (origin.x * 0.5 + t * 0.2).sin() * 0.1 + (origin.z * 0.5 + t * 0.1).cos() * 0.1;
            origin + Vec3::Y * wave
        }
    }
}

/// Per-particle alpha before the point falloff.
pub fn decor_alpha(layer: DecorLayer, position: Vec3, random: f32, t: f32) -> f32 {
    match layer {
        DecorLayer::Snow | DecorLayer::Fireflies => 1.0,
        DecorLayer::Ground => {
            let planar = (position.x * position.x + position.z * position.z).sqrt();
            let edge = 1.0 - smoothstep(5.0, 18.0, planar);
            let twinkle = 0.5 + 0.5 * (t * 2.0 + random * 20.0).sin();
            edge * twinkle * 0.6
        }
    }
}

/// Point diameter in pixels at `depth` in front of the camera.
pub fn decor_size(layer: DecorLayer, random: f32, speed: f32, depth: f32) -> f32 {
    if depth <= 0.0 {
        return 0.0;
    }
    match layer {
        DecorLayer::Fireflies => 40.0 * speed / depth,
        DecorLayer::Snow | DecorLayer::Ground => 50.0 * (0.5 + random * 0.5) / depth,
    }
}

/// Final fragment alpha at distance `r` from the point center.
pub fn decor_fragment_alpha(layer: DecorLayer, vertex_alpha: f32, r: f32) -> Option<f32> {
    point_glow(r, layer.glow_exponent()).map(|glow| glow * vertex_alpha)
}

/// Decor shader. Instance attributes: origin, random, speed, layer.
pub const DECOR_WGSL: &str = concat!(
    uniforms_wgsl!(),
    r#"
struct DecorOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) alpha: f32,
    @location(2) uv: vec2<f32>,
    @location(3) @interpolate(flat) layer: u32,
};

fn wrap(x: f32, range: f32) -> f32 {
    return x - range * floor(x / range);
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) origin: vec3<f32>,
    @location(1) random: f32,
    @location(2) speed: f32,
    @location(3) layer: u32,
) -> DecorOutput {
    let t = uniforms.frame.x;
    var pos = origin;
    var alpha = 1.0;
    var color = vec3<f32>(1.0, 1.0, 1.0);
    var base_size = 50.0 * (0.5 + random * 0.5);

    if layer == 0u {
        pos.y = wrap(origin.y - t * speed + 15.0, 30.0) - 15.0;
        pos.x += sin(t * 2.0 + random * 10.0) * 0.1;
        pos.z += cos(t * 1.5 + random * 20.0) * 0.1;
    } else if layer == 1u {
        pos.x += sin(t * 0.5 + origin.y) * 1.5;
        pos.y += cos(t * 0.3 + origin.x) + t * 0.2;
        pos.z += sin(t * 0.4 + origin.z) * 1.5;
        pos.y = wrap(pos.y + 10.0, 20.0) - 10.0;
        color = vec3<f32>(1.0, 0.9, 0.4);
        base_size = 40.0 * speed;
    } else {
        pos.y += sin(origin.x * 0.5 + t * 0.2) * 0.1 + cos(origin.z * 0.5 + t * 0.1) * 0.1;
        let edge = 1.0 - smoothstep(5.0, 18.0, length(pos.xz));
        alpha = edge * (0.5 + 0.5 * sin(t * 2.0 + random * 20.0)) * 0.6;
        color = vec3<f32>(0.8, 0.9, 1.0);
    }

    let view_pos = uniforms.view * vec4<f32>(pos, 1.0);
    let depth = max(-view_pos.z, 0.001);

    let corner = quad_corner(vertex_index);
    var out: DecorOutput;
    out.clip_position = billboard(uniforms.view_proj * vec4<f32>(pos, 1.0), corner, base_size / depth);
    out.color = color;
    out.alpha = alpha;
    out.uv = corner;
    out.layer = layer;
    return out;
}

@fragment
fn fs_main(in: DecorOutput) -> @location(0) vec4<f32> {
    var exponent = 2.0;
    if in.layer == 2u {
        exponent = 3.0;
    }
    let glow = point_glow(in.uv, exponent);
    if glow < 0.0 {
        discard;
    }
    return vec4<f32>(in.color, in.alpha * glow);
}
"#
);
