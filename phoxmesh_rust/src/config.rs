//! Render Configuration

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{MeshError, Result};

/// Frame rate of every rendered movie.
pub const MOVIE_FPS: u32 = 10;

/// Plotting options for the mesh renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Horizontal view extent as a multiple of the mesh width.
    pub x_padding_factor: f64,
    /// Vertical view extent as a multiple of the mesh height.
    pub y_padding_factor: f64,
    /// Phase shifter rectangle thickness; 3x the waveguide width when unset.
    pub phase_shifter_thickness: Option<f64>,
    /// Label font size in pixels; labels are skipped when unset.
    pub label_size: Option<f64>,
    /// Distance of demo headings from the mesh; half the label size when unset.
    pub label_distance: Option<f64>,
    pub width_px: u32,
    pub height_px: u32,
    pub fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            x_padding_factor: 1.25,
            y_padding_factor: 1.25,
            phase_shifter_thickness: None,
            label_size: None,
            label_distance: None,
            width_px: 1280,
            height_px: 720,
            fps: MOVIE_FPS,
        }
    }
}

impl RenderConfig {
    /// Preset for static role-colored diagrams.
    pub fn demo() -> Self {
        Self {
            y_padding_factor: 1.5,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(MeshError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, v
                )))
            }
        };
        positive("x_padding_factor", self.x_padding_factor)?;
        positive("y_padding_factor", self.y_padding_factor)?;
        if let Some(t) = self.phase_shifter_thickness {
            positive("phase_shifter_thickness", t)?;
        }
        if let Some(s) = self.label_size {
            positive("label_size", s)?;
        }
        if self.width_px < 2 || self.height_px < 2 {
            return Err(MeshError::InvalidConfig(format!(
                "frame size must be at least 2x2, got {}x{}",
                self.width_px, self.height_px
            )));
        }
        if self.fps == 0 {
            return Err(MeshError::InvalidConfig("fps must be non-zero".into()));
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, filepath: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(filepath, json)?;
        Ok(())
    }

    /// Load configuration from file.
    pub fn load(filepath: &str) -> Result<Self> {
        let json = fs::read_to_string(filepath)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RenderConfig::default().validate().is_ok());
        assert!(RenderConfig::demo().validate().is_ok());
        assert_eq!(RenderConfig::default().fps, 10);
    }

    #[test]
    fn test_rejects_bad_padding() {
        let config = RenderConfig {
            x_padding_factor: 0.0,
            ..RenderConfig::default()
        };
        assert!(matches!(config.validate(), Err(MeshError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_tiny_frame() {
        let config = RenderConfig {
            width_px: 1,
            ..RenderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_load() {
        let config = RenderConfig {
            label_size: Some(14.0),
            ..RenderConfig::demo()
        };
        let path = std::env::temp_dir().join("phoxmesh_test_config.json");
        let path = path.to_str().unwrap();

        config.save(path).unwrap();
        let loaded = RenderConfig::load(path).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{"label_size": 12.0}"#).unwrap();
        assert_eq!(config.label_size, Some(12.0));
        assert_eq!(config.width_px, 1280);
    }
}
