//! Integration tests for the generated particle field.
//!
//! These go through the public API only: generate a field with a fixed seed
//! and check the statistical and structural properties of its buffers.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use treelight::generator::spiral_center;
use treelight::layout::FormationLayout;
use treelight::prelude::*;

fn field(sizes: PopulationSizes, seed: u64) -> ParticleBuffers {
    let mut rng = SmallRng::seed_from_u64(seed);
    generate(&sizes, &PaletteConfig::default(), &mut rng).unwrap()
}

// ============================================================================
// Buffer structure
// ============================================================================

#[test]
fn test_attribute_arrays_share_one_length() {
    let sizes = PopulationSizes::new(1234, 56, 789, 10);
    let buffers = field(sizes, 11);

    assert_eq!(buffers.len(), sizes.total());
    assert_eq!(buffers.rest_positions().len(), sizes.total());
    assert_eq!(buffers.expanded_positions().len(), sizes.total());
    assert_eq!(buffers.colors().len(), sizes.total());
    assert_eq!(buffers.brightness().len(), sizes.total());
    assert_eq!(buffers.sizes().len(), sizes.total());
    assert_eq!(buffers.random_phases().len(), sizes.total());
}

#[test]
fn test_population_ranges_cover_buffers() {
    let sizes = PopulationSizes::new(300, 0, 200, 40);
    let buffers = field(sizes, 12);

    let mut next = 0;
    for population in Population::ALL {
        let range = buffers.range(population);
        assert_eq!(range.start, next, "{population:?} starts where the last ended");
        assert_eq!(range.len(), sizes.get(population));
        next = range.end;
    }
    assert_eq!(next, buffers.len());
}

#[test]
fn test_ambient_never_moves() {
    let buffers = field(PopulationSizes::default(), 13);
    for i in buffers.range(Population::Ambient) {
        assert_eq!(buffers.expanded_positions()[i], buffers.rest_positions()[i]);
    }
}

#[test]
fn test_dispersed_populations_move() {
    let buffers = field(PopulationSizes::new(500, 0, 500, 50), 14);
    for population in [Population::Body, Population::Spiral, Population::Crown] {
        let moved = buffers
            .range(population)
            .filter(|&i| buffers.expanded_positions()[i] != buffers.rest_positions()[i])
            .count();
        assert_eq!(moved, buffers.range(population).len(), "{population:?}");
    }
}

#[test]
fn test_every_value_is_finite() {
    let buffers = field(PopulationSizes::new(2000, 200, 1000, 100), 15);
    for p in buffers.iter() {
        assert!(p.rest_position.is_finite());
        assert!(p.expanded_position.is_finite());
        assert!(p.color.is_finite());
        assert!(p.brightness.is_finite() && p.brightness > 0.0);
        assert!(p.size.is_finite() && p.size > 0.0);
        assert!((0.0..1.0).contains(&p.random_phase));
    }
}

// ============================================================================
// Body radial distribution
// ============================================================================

/// Within a height band the body fills the cone's cross-section uniformly
/// by area, so `r² / R(h)²` is uniform on `[0, 1]`.
#[test]
fn test_body_radius_squared_is_flat() {
    const BINS: usize = 10;

    let layout = FormationLayout::default().body;
    let buffers = field(PopulationSizes::new(60_000, 0, 0, 0), 16);

    let mut histogram = [0usize; BINS];
    let mut linear_low = 0usize;
    let mut samples = 0usize;

    for i in buffers.range(Population::Body) {
        let p = buffers.rest_positions()[i];
        let h = (p.y - layout.base_y) / layout.height;
        if !(0.1..0.3).contains(&h) {
            continue;
        }
        let max_r = layout.max_radius * (1.0 - h);
        let r = (p.x * p.x + p.z * p.z).sqrt() / max_r;
        let bin = ((r * r * BINS as f32) as usize).min(BINS - 1);
        histogram[bin] += 1;
        if r < 0.1 {
            linear_low += 1;
        }
        samples += 1;
    }

    assert!(samples > 5_000, "band too sparse: {samples}");
    let expected = samples as f32 / BINS as f32;
    for (bin, &count) in histogram.iter().enumerate() {
        let deviation = (count as f32 - expected).abs() / expected;
        assert!(deviation < 0.15, "bin {bin}: {count} vs {expected}");
    }

    // Uniform in radius would put a tenth of the samples below r = 0.1.
    assert!((linear_low as f32 / samples as f32) < 0.03);
}

// ============================================================================
// Spiral and crown placement
// ============================================================================

#[test]
fn test_spiral_hugs_its_center_curve() {
    let spiral = FormationLayout::default().spiral;
    let count = 3_000;
    let buffers = field(PopulationSizes::new(0, 0, count, 0), 18);

    let range = buffers.range(Population::Spiral);
    for (k, i) in range.enumerate() {
        let p = k as f32 / count as f32;
        let center = spiral_center(p, spiral.top_y, spiral.drop, spiral.max_radius, spiral.turns);
        let offset = buffers.rest_positions()[i].distance(center);
        assert!(offset <= spiral.spread_max + 1e-4, "particle {k} is {offset} off the curve");
    }
}

#[test]
fn test_crown_clusters_at_apex() {
    let layout = FormationLayout::default();
    let buffers = field(PopulationSizes::new(0, 0, 0, 2_000), 19);

    let dispersed_apex = Vec3::new(0.0, layout.dispersed.apex_y(), 0.0);
    for i in buffers.range(Population::Crown) {
        let rest = buffers.rest_positions()[i].distance(layout.crown.apex);
        assert!(rest <= layout.crown.outer_radius + 1e-4, "rest {rest}");

        let expanded = buffers.expanded_positions()[i].distance(dispersed_apex);
        assert!(expanded <= layout.dispersed.apex_radius + 1e-3, "expanded {expanded}");
    }
}

// ============================================================================
// Determinism and errors
// ============================================================================

#[test]
fn test_same_seed_same_field() {
    let sizes = PopulationSizes::new(500, 50, 300, 20);
    assert_eq!(field(sizes, 99).rest_positions(), field(sizes, 99).rest_positions());
    assert_ne!(field(sizes, 99).rest_positions(), field(sizes, 100).rest_positions());
}

#[test]
fn test_zero_total_is_rejected() {
    let mut rng = SmallRng::seed_from_u64(1);
    let result = generate(&PopulationSizes::new(0, 0, 0, 0), &PaletteConfig::default(), &mut rng);
    assert!(matches!(result, Err(ConfigError::InvalidConfiguration(_))));
}

#[test]
fn test_signed_hex_in_palette_is_rejected() {
    let mut palette = PaletteConfig::default();
    palette.crown.primary = "#+f+f+f".to_string();
    let mut rng = SmallRng::seed_from_u64(1);
    let result = generate(&PopulationSizes::default(), &palette, &mut rng);
    assert!(matches!(result, Err(ConfigError::InvalidConfiguration(_))));
}

#[test]
fn test_single_population_field() {
    let buffers = field(PopulationSizes::new(0, 0, 0, 25), 17);
    assert_eq!(buffers.len(), 25);
    assert!(buffers.range(Population::Body).is_empty());
    assert_eq!(buffers.range(Population::Crown), 0..25);
}
