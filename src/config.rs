//! Scene configuration, loadable from JSON.
//!
//! Every section defaults independently, so a file only needs the values it
//! changes:
//!
//! ```json
//! {
//!     "populations": { "body": 20000 },
//!     "palette": { "ambient": "#40a0ff" },
//!     "animation": { "smoothing": { "mode": "time_scaled", "factor": 0.05, "reference_rate": 60.0 } }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::animation::AnimationConfig;
use crate::camera::OrbitLimits;
use crate::decor::DecorConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::generator::PopulationSizes;
use crate::input::UiRegion;
use crate::interaction::InteractionConfig;
use crate::layout::{check_non_negative, FormationLayout};
use crate::palette::{parse_hex, PaletteConfig};
use crate::shading::ShadingParams;

/// Window and camera settings for the interactive viewer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Clear color as a hex string.
    pub background: String,
    /// Auto-rotation while compact; 1.0 is one turn per minute.
    pub auto_rotate_speed: f32,
    pub orbit: OrbitLimits,
    /// Fixed RNG seed for reproducible fields. Random when absent.
    pub seed: Option<u64>,
    /// Screen regions treated as UI; pointer-downs there never toggle the morph.
    pub ui_regions: Vec<UiRegion>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Treelight".to_string(),
            width: 1280,
            height: 720,
            background: "#010306".to_string(),
            auto_rotate_speed: 0.3,
            orbit: OrbitLimits::default(),
            seed: None,
            ui_regions: Vec::new(),
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::invalid("viewer size must be non-zero"));
        }
        parse_hex(&self.background)
            .map_err(|e| ConfigError::invalid(format!("viewer.background: {e}")))?;
        check_non_negative("viewer.auto_rotate_speed", self.auto_rotate_speed)?;

        let o = &self.orbit;
        check_non_negative("viewer.orbit.min_distance", o.min_distance)?;
        check_non_negative("viewer.orbit.max_distance", o.max_distance)?;
        check_non_negative("viewer.orbit.min_polar", o.min_polar)?;
        check_non_negative("viewer.orbit.max_polar", o.max_polar)?;
        if o.min_distance > o.max_distance || o.min_polar > o.max_polar {
            return Err(ConfigError::invalid("viewer.orbit minimums must not exceed maximums"));
        }

        for region in &self.ui_regions {
            region.validate()?;
        }
        Ok(())
    }
}

/// Everything needed to build and show a scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub populations: PopulationSizes,
    pub palette: PaletteConfig,
    pub layout: FormationLayout,
    pub animation: AnimationConfig,
    pub interaction: InteractionConfig,
    pub shading: ShadingParams,
    pub decor: DecorConfig,
    pub viewer: ViewerConfig,
}

impl SceneConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(target: "config", path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every section. The palette is resolved to catch bad hex strings.
    pub fn validate(&self) -> ConfigResult<()> {
        self.populations.validate()?;
        self.palette.resolve()?;
        self.layout.validate()?;
        self.animation.validate()?;
        self.interaction.validate()?;
        self.shading.validate()?;
        self.decor.validate()?;
        self.viewer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Smoothing;

    #[test]
    fn test_default_is_valid() {
        SceneConfig::default().validate().unwrap();
    }

    #[test]
    fn test_empty_object_is_default() {
        let config = SceneConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let json = r##"{
            "populations": { "body": 2000 },
            "palette": { "ambient": "#40a0ff" },
            "animation": { "smoothing": { "mode": "time_scaled", "factor": 0.1, "reference_rate": 60.0 } }
        }"##;
        let config = SceneConfig::from_json_str(json).unwrap();
        assert_eq!(config.populations.body, 2000);
        assert_eq!(config.populations.crown, 800);
        assert_eq!(config.palette.ambient, "#40a0ff");
        assert_eq!(
            config.animation.smoothing,
            Smoothing::TimeScaled {
                factor: 0.1,
                reference_rate: 60.0
            }
        );
    }

    #[test]
    fn test_serialized_config_names_every_section() {
        let json = SceneConfig::default().to_json_string().unwrap();
        for section in ["populations", "palette", "layout", "animation", "interaction", "shading", "decor", "viewer"] {
            assert!(json.contains(section), "missing {section}");
        }
    }

    #[test]
    fn test_zero_total_rejected() {
        let json = r#"{ "populations": { "body": 0, "ambient": 0, "spiral": 0, "crown": 0 } }"#;
        let err = SceneConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_bad_hex_rejected() {
        let json = r##"{ "palette": { "ambient": "#12345" } }"##;
        assert!(matches!(
            SceneConfig::from_json_str(json),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_negative_size_is_parse_error() {
        let json = r#"{ "populations": { "body": -5 } }"#;
        assert!(matches!(
            SceneConfig::from_json_str(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SceneConfig::from_json_file("/nonexistent/treelight.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_viewer_limits_checked() {
        let mut config = SceneConfig::default();
        config.viewer.orbit.min_distance = 50.0;
        assert!(config.validate().is_err());
    }
}
