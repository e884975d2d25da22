//! Integration tests for the frame loop without a window.
//!
//! Drives a [`TreeScene`] the way the viewer does: gestures in, ticks out.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use treelight::prelude::*;
use treelight::{AnimationController, GestureOutcome, GpuUniforms, InteractionField, ShadingParams};

fn small_scene() -> TreeScene {
    let mut rng = SmallRng::seed_from_u64(2024);
    let buffers = generate(
        &PopulationSizes::new(100, 20, 50, 10),
        &PaletteConfig::default(),
        &mut rng,
    )
    .unwrap();
    TreeScene::new(
        Arc::new(buffers),
        AnimationConfig::default(),
        InteractionConfig::default(),
    )
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_first_frame_is_at_rest() {
    let mut scene = small_scene();
    assert_eq!(scene.buffers().len(), 180);

    let frame = scene.tick(0.0, Vec2::ZERO, &CameraTransform::identity());
    assert_eq!(frame.morph_progress, 0.0);
    assert_eq!(frame.elapsed_time, 0.0);
    assert!(frame.interaction_point.is_finite());
}

#[test]
fn test_frame_packs_into_gpu_uniforms() {
    let mut scene = small_scene();
    let camera = OrbitCamera::new().transform(1.5);
    let frame = scene.tick(1.25, Vec2::new(0.1, -0.2), &camera);

    let gpu = GpuUniforms::new(&frame, &camera, &ShadingParams::default(), 0.1, [1280.0, 720.0]);
    assert_eq!(gpu.frame[0], 1.25);
    assert_eq!(gpu.frame[1], frame.morph_progress);
    assert_eq!(gpu.interaction[3], frame.interaction_intensity);
    assert_eq!(gpu.viewport[0], 1280.0);
    assert_eq!(bytemuck::bytes_of(&gpu).len() % 16, 0);
}

// ============================================================================
// Gestures and progress
// ============================================================================

#[test]
fn test_double_activation_window() {
    let mut scene = small_scene();

    scene.on_gesture(ms(1_000), false);
    assert_eq!(
        scene.on_gesture(ms(1_150), false),
        GestureOutcome::Toggled(MorphTarget::Dispersed)
    );

    scene.on_gesture(ms(5_000), false);
    assert_eq!(scene.on_gesture(ms(5_500), false), GestureOutcome::Armed);
    assert_eq!(scene.morph_target(), MorphTarget::Dispersed);
}

#[test]
fn test_ui_gestures_never_toggle() {
    let mut scene = small_scene();
    for i in 0..20 {
        assert_eq!(scene.on_gesture(ms(1_000 + i * 50), true), GestureOutcome::Ignored);
    }
    assert_eq!(scene.morph_target(), MorphTarget::Compact);
}

#[test]
fn test_progress_returns_to_compact() {
    let mut scene = small_scene();
    let camera = CameraTransform::identity();
    let mut t = 0.0;
    let mut step = |scene: &mut TreeScene| {
        t += 1.0 / 60.0;
        scene.tick(t, Vec2::ZERO, &camera).morph_progress
    };

    scene.on_gesture(ms(100), false);
    scene.on_gesture(ms(200), false);
    for _ in 0..200 {
        step(&mut scene);
    }
    assert!(scene.morph_progress() > 0.99);

    scene.on_gesture(ms(10_000), false);
    scene.on_gesture(ms(10_100), false);
    assert_eq!(scene.morph_target(), MorphTarget::Compact);

    let mut last = scene.morph_progress();
    let mut settled_at = None;
    for frame in 0..300 {
        let progress = step(&mut scene);
        assert!(progress <= last, "progress rose at frame {frame}");
        if progress < 0.01 && settled_at.is_none() {
            settled_at = Some(frame);
        }
        last = progress;
    }
    // 0.95^n < 0.01 once n >= 90.
    assert!(settled_at.is_some_and(|f| f < 100), "settled at {settled_at:?}");
    assert!(last < 0.01);
}

#[test]
fn test_controller_alone_matches_scene() {
    let mut controller = AnimationController::default();
    let mut scene = small_scene();
    let camera = CameraTransform::identity();

    controller.on_gesture(ms(0), false);
    controller.on_gesture(ms(10), false);
    scene.on_gesture(ms(0), false);
    scene.on_gesture(ms(10), false);

    for i in 1..=30 {
        let expected = controller.advance(1.0 / 60.0);
        let frame = scene.tick(i as f32 / 60.0, Vec2::ZERO, &camera);
        assert!((frame.morph_progress - expected).abs() < 1e-6);
    }
}

// ============================================================================
// Interaction
// ============================================================================

#[test]
fn test_intensity_fades_toward_edges() {
    let field = InteractionField::new(InteractionConfig::default());
    assert_eq!(field.intensity(Vec2::ZERO), 1.0);
    assert_eq!(field.intensity(Vec2::new(0.95, 0.0)), 0.0);
    assert_eq!(field.intensity(Vec2::new(-0.8, 0.8)), 0.0);
    let mid = field.intensity(Vec2::new(0.75, 0.0));
    assert!(mid > 0.0 && mid < 1.0);
}

#[test]
fn test_pointer_at_center_hits_orbit_target() {
    let mut scene = small_scene();
    let camera = OrbitCamera::new().transform(16.0 / 9.0);
    let frame = scene.tick(0.5, Vec2::ZERO, &camera);
    // The center ray passes through the orbit target at the origin.
    assert!(frame.interaction_point.length() < 1e-3);
    assert_eq!(frame.interaction_intensity, 1.0);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_scene_from_json_file() {
    let path = std::env::temp_dir().join(format!("treelight-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r##"{
            "populations": { "body": 40, "ambient": 4, "spiral": 20, "crown": 3 },
            "palette": { "crown": { "primary": "#ffffff", "secondary": "#ffd700" } },
            "animation": { "double_activation_ms": 250 },
            "viewer": { "seed": 5 }
        }"##,
    )
    .unwrap();

    let config = SceneConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.animation.double_activation_ms, 250);
    assert_eq!(config.viewer.seed, Some(5));

    let mut rng = SmallRng::seed_from_u64(5);
    let mut scene = TreeScene::from_config(&config, &mut rng).unwrap();
    assert_eq!(scene.buffers().len(), 67);

    // 280 ms is outside the configured window.
    scene.on_gesture(ms(0), false);
    assert_eq!(scene.on_gesture(ms(280), false), GestureOutcome::Armed);
}

#[test]
fn test_invalid_json_config_is_rejected() {
    let err = SceneConfig::from_json_str(r#"{ "interaction": { "repel_radius": -1.0 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
}
