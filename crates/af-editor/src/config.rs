//! Editor configuration.

use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Tunables for the canvas editor.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Smallest allowed zoom factor. Default: **0.1**.
    pub min_scale: f64,
    /// Largest allowed zoom factor. Default: **5.0**.
    pub max_scale: f64,
    /// Change applied by one zoom-in / zoom-out step. Default: **0.1**.
    pub zoom_step: f64,
    /// How long a rejection notice stays visible, in milliseconds. Default: **3000**.
    pub notice_ttl_ms: u64,
    /// Maximum undo depth. Default: **200**.
    pub undo_depth: usize,
    /// Pick radius for handles and edges, in world units. Default: **8.0**.
    pub hit_tolerance: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 5.0,
            zoom_step: 0.1,
            notice_ttl_ms: 3000,
            undo_depth: 200,
            hit_tolerance: 8.0,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Zoom limits must form a non-empty positive range and the step must be positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let range_ok = self.min_scale > 0.0 && self.min_scale <= self.max_scale;
        let step_ok = self.zoom_step > 0.0;
        if !range_ok {
            return Err(ConfigError::ScaleRange {
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        if !step_ok {
            return Err(ConfigError::ZoomStep(self.zoom_step));
        }
        Ok(())
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"undo_depth": 10}"#).unwrap();
        assert_eq!(config.undo_depth, 10);
        assert_eq!(config.zoom_step, 0.1);
        assert_eq!(config.notice_ttl(), Duration::from_secs(3));
    }

    #[test]
    fn rejects_inverted_zoom_range_and_bad_step() {
        assert!(matches!(
            EditorConfig::from_json(r#"{"min_scale": 4.0, "max_scale": 2.0}"#),
            Err(ConfigError::ScaleRange { .. })
        ));
        assert!(matches!(
            EditorConfig::from_json(r#"{"zoom_step": 0}"#),
            Err(ConfigError::ZoomStep(_))
        ));
        assert!(matches!(
            EditorConfig::from_json("[1, 2]"),
            Err(ConfigError::Parse(_))
        ));
    }
}
