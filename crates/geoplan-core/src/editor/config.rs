//! Session tuning knobs.

use crate::projection::{ConfigResult, ConfigurationError};
use serde::{Deserialize, Serialize};

/// Editor settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Handle scale before a plan sets one from its zoom.
    pub handle_scale: f64,
    /// Arrow key nudge in drawing units.
    pub nudge_step: f64,
    /// Rotate handle distance past the bbox for the edit tool, times scale.
    pub edit_rotate_gap: f64,
    /// Rotate handle distance past the translate circle for objects, times scale.
    pub object_rotate_gap: f64,
    /// Handle radius, times scale.
    pub handle_radius: f64,
    /// Distance to the path origin that closes a path, times scale.
    pub close_tolerance: f64,
    /// Shorter measurements are dropped.
    pub min_measure_length: f64,
    /// Objects that never get a rotate handle.
    pub no_rotate_ids: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handle_scale: 0.4,
            nudge_step: 0.1,
            edit_rotate_gap: 14.0,
            object_rotate_gap: 16.0,
            handle_radius: 3.0,
            close_tolerance: 3.0,
            min_measure_length: 0.5,
            no_rotate_ids: vec!["NORDPFEIL".to_string()],
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    /// Whether an element may be rotated by the object tool.
    pub fn rotates(&self, element_id: Option<&str>) -> bool {
        element_id.is_none_or(|id| !self.no_rotate_ids.iter().any(|exempt| exempt == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(SessionConfig::from_json("{}").unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = SessionConfig::from_json(r#"{"nudge_step": 1.0, "no_rotate_ids": []}"#).unwrap();
        assert!((config.nudge_step - 1.0).abs() < f64::EPSILON);
        assert!((config.handle_scale - 0.4).abs() < f64::EPSILON);
        assert!(config.rotates(Some("NORDPFEIL")));
    }

    #[test]
    fn test_nordpfeil_does_not_rotate() {
        let config = SessionConfig::default();
        assert!(!config.rotates(Some("NORDPFEIL")));
        assert!(config.rotates(Some("A1")));
        assert!(config.rotates(None));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            SessionConfig::from_json("{\"nudge_step\": \"far\"}"),
            Err(ConfigurationError::Parse(_))
        ));
    }
}
