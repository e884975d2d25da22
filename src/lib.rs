//! # Treelight
//!
//! A procedural particle tree that morphs between a compact formation and a
//! dispersed cloud, lit and pushed around by the pointer.
//!
//! Treelight generates every particle once on the CPU, uploads the buffers to
//! the GPU, and from then on only publishes a small set of per-frame uniforms.
//! Position, color, twinkle and repulsion are all evaluated in the shaders.
//!
//! ## Quick Start
//!
//! ```ignore
//! use treelight::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     treelight::run(SceneConfig::default())
//! }
//! ```
//!
//! ## Headless use
//!
//! The generator and the frame tick do not need a window:
//!
//! ```
//! use rand::{rngs::SmallRng, SeedableRng};
//! use treelight::prelude::*;
//!
//! let mut rng = SmallRng::seed_from_u64(7);
//! let config = SceneConfig::default();
//! let mut scene = TreeScene::from_config(&config, &mut rng).unwrap();
//!
//! let camera = OrbitCamera::new().transform(16.0 / 9.0);
//! let frame = scene.tick(0.016, Vec2::ZERO, &camera);
//! assert_eq!(frame.morph_progress, 0.0);
//! ```
//!
//! ## Populations
//!
//! | Population | Compact formation | Dispersed formation |
//! |------------|-------------------|---------------------|
//! | [`Population::Body`] | cone of foliage and ornaments | anywhere in the wide cone |
//! | [`Population::Ambient`] | cloud around the tree | unchanged |
//! | [`Population::Spiral`] | garland wound around the cone | anywhere in the wide cone |
//! | [`Population::Crown`] | star at the apex | apex of the wide cone |
//!
//! ## Configuration
//!
//! Every knob lives in [`SceneConfig`], which loads from JSON with per-section
//! defaults. See [`config`].

pub mod animation;
pub mod camera;
pub mod config;
pub mod decor;
pub mod error;
pub mod generator;
mod gpu;
pub mod input;
pub mod interaction;
pub mod layout;
pub mod morph;
pub mod palette;
pub mod scene;
pub mod shading;
pub mod spawn;
pub mod time;
pub mod uniforms;
mod viewer;

pub use animation::{AnimationConfig, AnimationController, GestureOutcome, MorphTarget, Smoothing};
pub use camera::{CameraTransform, OrbitCamera, OrbitLimits};
pub use config::{SceneConfig, ViewerConfig};
pub use decor::{generate_decor, DecorBuffers, DecorConfig, DecorLayer};
pub use error::{ConfigError, ConfigResult, GpuError, ViewerError};
pub use generator::{generate, generate_with_layout, Particle, ParticleBuffers, Population, PopulationSizes};
pub use glam::{Vec2, Vec3};
pub use interaction::{InteractionConfig, InteractionField, InteractionSample};
pub use layout::FormationLayout;
pub use palette::PaletteConfig;
pub use scene::TreeScene;
pub use shading::{shade_particle, ShadedParticle, ShadingParams};
pub use uniforms::{FrameUniforms, GpuUniforms};
pub use viewer::run;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use treelight::prelude::*;
/// ```
pub mod prelude {
    pub use crate::animation::{AnimationConfig, MorphTarget, Smoothing};
    pub use crate::camera::{CameraTransform, OrbitCamera};
    pub use crate::config::SceneConfig;
    pub use crate::error::{ConfigError, ViewerError};
    pub use crate::generator::{generate, ParticleBuffers, Population, PopulationSizes};
    pub use crate::interaction::InteractionConfig;
    pub use crate::palette::PaletteConfig;
    pub use crate::scene::TreeScene;
    pub use crate::uniforms::FrameUniforms;
    pub use crate::{Vec2, Vec3};
}
