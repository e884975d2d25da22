//! Morph animation state: gesture debounce and progress smoothing.
//!
//! The controller is conceptually a two-state machine (compact, dispersed)
//! but the visible state is a continuous progress value that eases toward
//! the current target every frame. A double activation toggles the target.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::layout::check_finite;

/// The formation the animation is heading toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MorphTarget {
    #[default]
    Compact,
    Dispersed,
}

impl MorphTarget {
    /// Numeric value the progress approaches.
    #[inline]
    pub fn value(self) -> f32 {
        match self {
            MorphTarget::Compact => 0.0,
            MorphTarget::Dispersed => 1.0,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            MorphTarget::Compact => MorphTarget::Dispersed,
            MorphTarget::Dispersed => MorphTarget::Compact,
        }
    }
}

/// How progress is eased toward the target each frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Smoothing {
    /// Fixed lerp factor per tick. Visual pace depends on the frame rate.
    PerFrame { factor: f32 },
    /// Lerp factor expressed at `reference_rate` ticks per second and
    /// rescaled by each tick's elapsed time.
    TimeScaled { factor: f32, reference_rate: f32 },
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::PerFrame { factor: 0.05 }
    }
}

impl Smoothing {
    /// Lerp factor to apply for a tick that covered `delta_time` seconds.
    pub fn factor(&self, delta_time: f32) -> f32 {
        match *self {
            Smoothing::PerFrame { factor } => factor,
            Smoothing::TimeScaled {
                factor,
                reference_rate,
            } => {
                let frames = (delta_time.max(0.0) * reference_rate).min(1.0e4);
                1.0 - (1.0 - factor).powf(frames)
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let factor = match *self {
            Smoothing::PerFrame { factor } => factor,
            Smoothing::TimeScaled {
                factor,
                reference_rate,
            } => {
                check_finite("animation.smoothing.reference_rate", reference_rate)?;
                if reference_rate <= 0.0 {
                    return Err(ConfigError::invalid(
                        "animation.smoothing.reference_rate must be positive",
                    ));
                }
                factor
            }
        };
        check_finite("animation.smoothing.factor", factor)?;
        if factor <= 0.0 || factor > 1.0 {
            return Err(ConfigError::invalid(format!(
                "animation.smoothing.factor must be within (0, 1], got {factor}"
            )));
        }
        Ok(())
    }
}

/// Tuning for the animation controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Maximum spacing between the two halves of a double activation, in ms.
    pub double_activation_ms: u64,
    pub smoothing: Smoothing,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            double_activation_ms: 300,
            smoothing: Smoothing::default(),
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.double_activation_ms == 0 {
            return Err(ConfigError::invalid(
                "animation.double_activation_ms must be positive",
            ));
        }
        self.smoothing.validate()
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.double_activation_ms)
    }
}

/// What a gesture did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Came from a UI element; ignored entirely.
    Ignored,
    /// First half of a potential double activation.
    Armed,
    /// Completed a double activation and flipped the target.
    Toggled(MorphTarget),
}

/// Owns morph progress and the double-activation state machine.
#[derive(Clone, Debug)]
pub struct AnimationController {
    config: AnimationConfig,
    target: MorphTarget,
    progress: f32,
    last_activation: Option<Duration>,
}

impl AnimationController {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            target: MorphTarget::Compact,
            progress: 0.0,
            last_activation: None,
        }
    }

    #[inline]
    pub fn target(&self) -> MorphTarget {
        self.target
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Handle a pointer-down at `timestamp` (any monotonic session clock).
    ///
    /// A second activation strictly within the window of the previous one
    /// toggles the target and is consumed, so a third quick tap starts a new
    /// pair instead of toggling back. Gestures that originate from UI elements
    /// are ignored and don't disturb the pending activation.
    pub fn on_gesture(&mut self, timestamp: Duration, from_ui_element: bool) -> GestureOutcome {
        if from_ui_element {
            return GestureOutcome::Ignored;
        }

        let is_second_half = self
            .last_activation
            .and_then(|last| timestamp.checked_sub(last))
            .is_some_and(|gap| !gap.is_zero() && gap < self.config.window());

        if is_second_half {
            self.target = self.target.toggled();
            self.last_activation = None;
            tracing::debug!(target: "animation", target = ?self.target, "morph target toggled");
            GestureOutcome::Toggled(self.target)
        } else {
            self.last_activation = Some(timestamp);
            GestureOutcome::Armed
        }
    }

    /// Ease progress toward the target for a tick covering `delta_time` seconds.
    pub fn advance(&mut self, delta_time: f32) -> f32 {
        let k = self.config.smoothing.factor(delta_time);
        let goal = self.target.value();
        let next = self.progress + (goal - self.progress) * k;
        if next.is_finite() {
            self.progress = next.clamp(0.0, 1.0);
        }
        self.progress
    }
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}
