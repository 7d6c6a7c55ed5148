//! Engine configuration.
//!
//! Keys use the same camelCase names the host page passes as options, so a
//! JSON options object can be loaded directly.

use crate::color::{DEFAULT_INK_HEX, parse_hex_color};
use crate::error::{SignatureError, SignatureResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default minimum interval between accepted move events.
pub const DEFAULT_THROTTLE_INTERVAL_MS: f64 = 8.0;

/// Default background grid spacing in pixels.
pub const DEFAULT_GRID_STEP: f64 = 25.0;

/// Signature pad settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignatureConfig {
    /// Initial ink color for new strokes.
    pub stroke_color: String,
    /// Initial line width for new strokes.
    pub stroke_thickness: f64,
    pub throttle_interval_ms: f64,
    pub dpi: u32,
    #[serde(rename = "minCanvasWidth")]
    pub min_width: u32,
    #[serde(rename = "maxCanvasWidth")]
    pub max_width: u32,
    #[serde(rename = "minCanvasHeight")]
    pub min_height: u32,
    #[serde(rename = "maxCanvasHeight")]
    pub max_height: u32,
    pub grid_step: f64,
    /// Use mouse/touch listeners when native pointer events are missing.
    /// When false, `start_capture` reports an unsupported environment instead.
    pub allow_fallback_input: bool,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            stroke_color: DEFAULT_INK_HEX.to_string(),
            stroke_thickness: 2.0,
            throttle_interval_ms: DEFAULT_THROTTLE_INTERVAL_MS,
            dpi: 96,
            min_width: 200,
            max_width: 1200,
            min_height: 100,
            max_height: 800,
            grid_step: DEFAULT_GRID_STEP,
            allow_fallback_input: true,
        }
    }
}

impl SignatureConfig {
    /// Parse a config from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> SignatureResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SignatureResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        log::debug!("Loaded signature config from {}", path.display());
        Self::from_json(&json)
    }

    /// Check value ranges.
    pub fn validate(&self) -> SignatureResult<()> {
        if parse_hex_color(&self.stroke_color).is_none() {
            return Err(SignatureError::InvalidColor(self.stroke_color.clone()));
        }
        if !(self.stroke_thickness.is_finite() && self.stroke_thickness > 0.0) {
            return Err(SignatureError::InvalidThickness(self.stroke_thickness));
        }
        if !(self.throttle_interval_ms.is_finite() && self.throttle_interval_ms >= 0.0) {
            return Err(SignatureError::InvalidConfig(format!(
                "throttleIntervalMs must be a non-negative number, got {}",
                self.throttle_interval_ms
            )));
        }
        if self.dpi == 0 {
            return Err(SignatureError::InvalidConfig("dpi must be positive".to_string()));
        }
        if self.min_width == 0 || self.min_width > self.max_width {
            return Err(SignatureError::InvalidConfig(format!(
                "width bounds {}..={} are invalid",
                self.min_width, self.max_width
            )));
        }
        if self.min_height == 0 || self.min_height > self.max_height {
            return Err(SignatureError::InvalidConfig(format!(
                "height bounds {}..={} are invalid",
                self.min_height, self.max_height
            )));
        }
        if !(self.grid_step.is_finite() && self.grid_step > 0.0) {
            return Err(SignatureError::InvalidConfig(format!(
                "gridStep must be positive, got {}",
                self.grid_step
            )));
        }
        Ok(())
    }

    /// Clamp a requested size into the configured bounds.
    pub fn clamp_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            width.clamp(self.min_width, self.max_width),
            height.clamp(self.min_height, self.max_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SignatureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.throttle_interval_ms, 8.0);
        assert_eq!((config.min_width, config.max_width), (200, 1200));
        assert_eq!((config.min_height, config.max_height), (100, 800));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SignatureConfig::from_json(r##"{"strokeColor": "#ff0000", "maxCanvasWidth": 900}"##).unwrap();
        assert_eq!(config.stroke_color, "#ff0000");
        assert_eq!(config.max_width, 900);
        assert_eq!(config.dpi, 96);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SignatureConfig::from_json(r#"{"strokeThickness": 0}"#).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidThickness(_)));

        let err = SignatureConfig::from_json(r#"{"minCanvasWidth": 500, "maxCanvasWidth": 400}"#).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidConfig(_)));

        let err = SignatureConfig::from_json(r#"{"strokeColor": "blue"}"#).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidColor(_)));
    }

    #[test]
    fn test_clamp_size() {
        let config = SignatureConfig::default();
        assert_eq!(config.clamp_size(50, 5000), (200, 800));
        assert_eq!(config.clamp_size(600, 300), (600, 300));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"throttleIntervalMs": 16, "allowFallbackInput": false}}"#).unwrap();

        let config = SignatureConfig::load(file.path()).unwrap();
        assert_eq!(config.throttle_interval_ms, 16.0);
        assert!(!config.allow_fallback_input);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SignatureConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SignatureError::Io(_)));
    }
}
