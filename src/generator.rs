//! Particle field generation.
//!
//! Produces the static per-particle attribute buffers once at startup. The
//! four populations are generated in a fixed order and concatenated into one
//! structure-of-arrays buffer set, so index `i` names the same particle in
//! every array.

use std::ops::Range;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::layout::FormationLayout;
use crate::morph::MorphRule;
use crate::palette::{Palette, PaletteConfig};
use crate::spawn::{progress, Sampler};

/// The four populations, in generation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Population {
    /// Conical tree body.
    Body,
    /// Wide static cloud around the tree.
    Ambient,
    /// Garland spiral wound around the cone.
    Spiral,
    /// Star cluster at the apex.
    Crown,
}

impl Population {
    pub const ALL: [Population; 4] = [
        Population::Body,
        Population::Ambient,
        Population::Spiral,
        Population::Crown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Population::Body => "body",
            Population::Ambient => "ambient",
            Population::Spiral => "spiral",
            Population::Crown => "crown",
        }
    }

    /// Which morph rule this population follows.
    pub fn morph_rule(self) -> MorphRule {
        match self {
            Population::Body | Population::Spiral => MorphRule::Dispersed,
            Population::Ambient => MorphRule::Static,
            Population::Crown => MorphRule::DispersedApex,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Particle count per population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationSizes {
    pub body: usize,
    pub ambient: usize,
    pub spiral: usize,
    pub crown: usize,
}

impl Default for PopulationSizes {
    fn default() -> Self {
        Self {
            body: 45_000,
            ambient: 5_000,
            spiral: 30_000,
            crown: 800,
        }
    }
}

impl PopulationSizes {
    pub fn new(body: usize, ambient: usize, spiral: usize, crown: usize) -> Self {
        Self {
            body,
            ambient,
            spiral,
            crown,
        }
    }

    pub fn get(&self, population: Population) -> usize {
        match population {
            Population::Body => self.body,
            Population::Ambient => self.ambient,
            Population::Spiral => self.spiral,
            Population::Crown => self.crown,
        }
    }

    /// Total particle count across all populations.
    pub fn total(&self) -> usize {
        self.body
            .saturating_add(self.ambient)
            .saturating_add(self.spiral)
            .saturating_add(self.crown)
    }

    /// A field needs at least one particle. Individual populations may be empty.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.total() == 0 {
            return Err(ConfigError::invalid(
                "population sizes sum to zero; at least one particle is required",
            ));
        }
        // The GPU draws instances with a u32 count.
        if u32::try_from(self.total()).is_err() {
            return Err(ConfigError::invalid(format!(
                "{} particles exceeds the drawable instance limit",
                self.total()
            )));
        }
        Ok(())
    }
}

/// One particle's attributes, gathered from the buffers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub rest_position: Vec3,
    pub expanded_position: Vec3,
    pub color: Vec3,
    pub brightness: f32,
    pub size: f32,
    pub random_phase: f32,
}

/// Static per-particle attributes, one array per attribute.
///
/// Allocated once with exact capacity and never resized. Share it by
/// reference (or behind an `Arc`) with the renderer.
#[derive(Clone, Debug, Default)]
pub struct ParticleBuffers {
    rest_positions: Vec<Vec3>,
    expanded_positions: Vec<Vec3>,
    colors: Vec<Vec3>,
    brightness: Vec<f32>,
    sizes: Vec<f32>,
    random_phases: Vec<f32>,
    ranges: [Range<usize>; 4],
}

impl ParticleBuffers {
    fn with_capacity(n: usize) -> Self {
        Self {
            rest_positions: Vec::with_capacity(n),
            expanded_positions: Vec::with_capacity(n),
            colors: Vec::with_capacity(n),
            brightness: Vec::with_capacity(n),
            sizes: Vec::with_capacity(n),
            random_phases: Vec::with_capacity(n),
            ranges: Default::default(),
        }
    }

    fn push(&mut self, p: Particle) {
        self.rest_positions.push(p.rest_position);
        self.expanded_positions.push(p.expanded_position);
        self.colors.push(p.color);
        self.brightness.push(p.brightness);
        self.sizes.push(p.size);
        self.random_phases.push(p.random_phase);
    }

    /// Total number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.rest_positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rest_positions.is_empty()
    }

    /// Index range occupied by a population.
    pub fn range(&self, population: Population) -> Range<usize> {
        self.ranges[population.index()].clone()
    }

    pub fn rest_positions(&self) -> &[Vec3] {
        &self.rest_positions
    }

    pub fn expanded_positions(&self) -> &[Vec3] {
        &self.expanded_positions
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn brightness(&self) -> &[f32] {
        &self.brightness
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn random_phases(&self) -> &[f32] {
        &self.random_phases
    }

    /// Gather particle `index`, or `None` when out of range.
    pub fn particle(&self, index: usize) -> Option<Particle> {
        if index >= self.len() {
            return None;
        }
        Some(Particle {
            rest_position: self.rest_positions[index],
            expanded_position: self.expanded_positions[index],
            color: self.colors[index],
            brightness: self.brightness[index],
            size: self.sizes[index],
            random_phase: self.random_phases[index],
        })
    }

    /// Iterate over all particles in index order.
    pub fn iter(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.len()).filter_map(move |i| self.particle(i))
    }
}

/// Generate the particle field with the default formation layout.
pub fn generate<R: Rng>(
    sizes: &PopulationSizes,
    palette: &PaletteConfig,
    rng: &mut R,
) -> ConfigResult<ParticleBuffers> {
    generate_with_layout(sizes, palette, &FormationLayout::default(), rng)
}

/// Generate the particle field.
///
/// Validates everything before allocating, so a bad configuration never
/// yields a partially filled buffer set.
pub fn generate_with_layout<R: Rng>(
    sizes: &PopulationSizes,
    palette: &PaletteConfig,
    layout: &FormationLayout,
    rng: &mut R,
) -> ConfigResult<ParticleBuffers> {
    sizes.validate()?;
    layout.validate()?;
    let palette = palette.resolve()?;

    let mut buffers = ParticleBuffers::with_capacity(sizes.total());
    let mut sampler = Sampler::new(rng);

    for population in Population::ALL {
        let start = buffers.len();
        let count = sizes.get(population);
        let rule = population.morph_rule();
        for i in 0..count {
            let particle = match population {
                Population::Body => body_particle(i, count, layout, &palette, &mut sampler),
                Population::Ambient => ambient_particle(layout, &palette, &mut sampler),
                Population::Spiral => spiral_particle(i, count, layout, &palette, &mut sampler),
                Population::Crown => crown_particle(layout, &palette, &mut sampler),
            };
            let expanded_position =
                rule.resolve(particle.rest_position, &layout.dispersed, &mut sampler);
            buffers.push(Particle {
                expanded_position,
                random_phase: sampler.random(),
                ..particle
            });
        }
        buffers.ranges[population.index()] = start..buffers.len();
    }

    tracing::info!(
        target: "generator",
        total = buffers.len(),
        body = sizes.body,
        ambient = sizes.ambient,
        spiral = sizes.spiral,
        crown = sizes.crown,
        "particle field generated"
    );

    Ok(buffers)
}

// Each rule fills everything but `expanded_position` and `random_phase`.

fn body_particle<R: Rng>(
    i: usize,
    count: usize,
    layout: &FormationLayout,
    palette: &Palette,
    sampler: &mut Sampler<'_, R>,
) -> Particle {
    let body = &layout.body;
    let h = progress(i, count).powf(body.height_exponent);
    let y = body.base_y + h * body.height;
    let disk = sampler.random_in_disk(body.max_radius * (1.0 - h));

    let draw = sampler.random();
    let (color, tier) = if draw > body.ornament_fraction {
        let hue = sampler.random();
        (palette.foliage.pick(hue, body.foliage_split), body.foliage)
    } else {
        (palette.ornament.pick(draw, body.ornament_split), body.ornament)
    };

    Particle {
        rest_position: Vec3::new(disk.x, y, disk.z),
        expanded_position: Vec3::ZERO,
        color,
        brightness: tier.brightness,
        size: tier.size,
        random_phase: 0.0,
    }
}

fn ambient_particle<R: Rng>(
    layout: &FormationLayout,
    palette: &Palette,
    sampler: &mut Sampler<'_, R>,
) -> Particle {
    let ambient = &layout.ambient;
    let y = ambient.min_y + sampler.random() * ambient.height;
    let disk = sampler.random_in_disk(ambient.radius);

    Particle {
        rest_position: Vec3::new(disk.x, y, disk.z),
        expanded_position: Vec3::ZERO,
        color: palette.ambient,
        brightness: ambient.brightness,
        size: sampler.random_range(ambient.size_min, ambient.size_max),
        random_phase: 0.0,
    }
}

fn spiral_particle<R: Rng>(
    i: usize,
    count: usize,
    layout: &FormationLayout,
    palette: &Palette,
    sampler: &mut Sampler<'_, R>,
) -> Particle {
    let spiral = &layout.spiral;
    let center = spiral_center(
        progress(i, count),
        spiral.top_y,
        spiral.drop,
        spiral.max_radius,
        spiral.turns,
    );
    let spread = sampler.random_range(spiral.spread_min, spiral.spread_max);
    let offset = sampler.random_in_sphere(spread);

    Particle {
        rest_position: center + offset,
        expanded_position: Vec3::ZERO,
        color: palette.spiral.pick(sampler.random(), spiral.primary_threshold),
        brightness: spiral.brightness,
        size: sampler.random_range(spiral.size_min, spiral.size_max),
        random_phase: 0.0,
    }
}

/// Point on the garland's center curve at progress `p`.
///
/// Descends linearly while its radius grows linearly and its angle advances
/// `p * 2π * turns`.
pub fn spiral_center(p: f32, top_y: f32, drop: f32, max_radius: f32, turns: f32) -> Vec3 {
    let y = top_y - p * drop;
    let radius = max_radius * p;
    let theta = p * std::f32::consts::TAU * turns;
    Vec3::new(radius * theta.cos(), y, radius * theta.sin())
}

fn crown_particle<R: Rng>(
    layout: &FormationLayout,
    palette: &Palette,
    sampler: &mut Sampler<'_, R>,
) -> Particle {
    let crown = &layout.crown;
    let radius = if sampler.random() < crown.outer_chance {
        crown.outer_radius
    } else {
        crown.inner_radius
    };
    let offset = sampler.biased_in_sphere(radius, crown.radius_exponent);

    Particle {
        rest_position: crown.apex + offset,
        expanded_position: Vec3::ZERO,
        color: palette.crown.pick(sampler.random(), crown.primary_threshold),
        brightness: sampler.random_range(crown.brightness_min, crown.brightness_max),
        size: sampler.random_range(crown.size_min, crown.size_max),
        random_phase: 0.0,
    }
}
