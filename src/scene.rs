//! The per-session scene: static particle buffers plus the frame tick.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use rand::Rng;

use crate::animation::{AnimationConfig, AnimationController, GestureOutcome, MorphTarget};
use crate::camera::CameraTransform;
use crate::config::SceneConfig;
use crate::error::ConfigResult;
use crate::generator::{generate_with_layout, ParticleBuffers};
use crate::interaction::{InteractionConfig, InteractionField};
use crate::uniforms::FrameUniforms;

/// Owns everything that changes per frame and shares the static buffers.
///
/// Single-threaded: call [`TreeScene::on_gesture`] from input handling and
/// [`TreeScene::tick`] once per frame.
#[derive(Debug)]
pub struct TreeScene {
    buffers: Arc<ParticleBuffers>,
    animation: AnimationController,
    interaction: InteractionField,
    last_elapsed: f32,
}

impl TreeScene {
    pub fn new(
        buffers: Arc<ParticleBuffers>,
        animation: AnimationConfig,
        interaction: InteractionConfig,
    ) -> Self {
        Self {
            buffers,
            animation: AnimationController::new(animation),
            interaction: InteractionField::new(interaction),
            last_elapsed: 0.0,
        }
    }

    /// Validate `config`, generate the particle field and build the scene.
    pub fn from_config<R: Rng>(config: &SceneConfig, rng: &mut R) -> ConfigResult<Self> {
        config.validate()?;
        let buffers = generate_with_layout(&config.populations, &config.palette, &config.layout, rng)?;
        Ok(Self::new(Arc::new(buffers), config.animation, config.interaction))
    }

    /// Static buffers, shared with whoever uploads them.
    pub fn buffers(&self) -> &Arc<ParticleBuffers> {
        &self.buffers
    }

    pub fn morph_target(&self) -> MorphTarget {
        self.animation.target()
    }

    pub fn morph_progress(&self) -> f32 {
        self.animation.progress()
    }

    pub fn interaction_config(&self) -> &InteractionConfig {
        self.interaction.config()
    }

    /// Forward a pointer-down to the animation controller.
    pub fn on_gesture(&mut self, timestamp: Duration, from_ui_element: bool) -> GestureOutcome {
        self.animation.on_gesture(timestamp, from_ui_element)
    }

    /// Advance one frame and publish its uniforms.
    ///
    /// `elapsed_time` is clamped so the published value never decreases.
    pub fn tick(
        &mut self,
        elapsed_time: f32,
        pointer_ndc: Vec2,
        camera: &CameraTransform,
    ) -> FrameUniforms {
        let elapsed = if elapsed_time.is_finite() && elapsed_time >= self.last_elapsed {
            elapsed_time
        } else {
            tracing::warn!(
                target: "scene",
                elapsed_time,
                last = self.last_elapsed,
                "clock went backwards or is not finite; holding last value"
            );
            self.last_elapsed
        };
        let delta = elapsed - self.last_elapsed;
        self.last_elapsed = elapsed;

        let morph_progress = self.animation.advance(delta);
        let sample = self.interaction.sample(pointer_ndc, camera);

        FrameUniforms {
            elapsed_time: elapsed,
            interaction_point: sample.point,
            interaction_intensity: sample.intensity,
            morph_progress,
            repulsion_radius: self.interaction.config().repulsion_radius(morph_progress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate, PopulationSizes};
    use crate::palette::PaletteConfig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn scene() -> TreeScene {
        let mut rng = SmallRng::seed_from_u64(7);
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

    #[test]
    fn test_first_tick() {
        let mut scene = scene();
        let frame = scene.tick(0.0, Vec2::ZERO, &CameraTransform::identity());
        assert_eq!(frame.morph_progress, 0.0);
        assert_eq!(frame.elapsed_time, 0.0);
        assert!(frame.interaction_point.is_finite());
        assert_eq!(frame.interaction_intensity, 1.0);
        assert_eq!(frame.repulsion_radius, 2.0);
    }

    #[test]
    fn test_elapsed_never_decreases() {
        let mut scene = scene();
        let cam = CameraTransform::identity();
        assert_eq!(scene.tick(2.0, Vec2::ZERO, &cam).elapsed_time, 2.0);
        assert_eq!(scene.tick(1.0, Vec2::ZERO, &cam).elapsed_time, 2.0);
        assert_eq!(scene.tick(f32::NAN, Vec2::ZERO, &cam).elapsed_time, 2.0);
        assert_eq!(scene.tick(3.0, Vec2::ZERO, &cam).elapsed_time, 3.0);
    }

    #[test]
    fn test_double_tap_then_disperses() {
        let mut scene = scene();
        let cam = CameraTransform::identity();
        scene.on_gesture(Duration::from_millis(1000), false);
        scene.on_gesture(Duration::from_millis(1120), false);
        assert_eq!(scene.morph_target(), MorphTarget::Dispersed);

        let mut last = 0.0;
        for i in 1..=120 {
            let frame = scene.tick(i as f32 / 60.0, Vec2::ZERO, &cam);
            assert!(frame.morph_progress > last);
            last = frame.morph_progress;
        }
        assert!(last > 0.99);
        let frame = scene.tick(3.0, Vec2::ZERO, &cam);
        assert!(frame.repulsion_radius > 6.9);
    }

    #[test]
    fn test_buffers_are_shared() {
        let scene = scene();
        let shared = Arc::clone(scene.buffers());
        assert_eq!(Arc::strong_count(&shared), 2);
        assert_eq!(shared.len(), 180);
    }

    #[test]
    fn test_from_config() {
        let mut config = SceneConfig::default();
        config.populations = PopulationSizes::new(30, 5, 10, 2);
        let mut rng = SmallRng::seed_from_u64(1);
        let scene = TreeScene::from_config(&config, &mut rng).unwrap();
        assert_eq!(scene.buffers().len(), 47);
    }
}
