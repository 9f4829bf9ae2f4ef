//! Tile set projection configuration.

use super::ConfigurationError;
use super::swiss::Srs;
use serde::{Deserialize, Serialize};

/// Contents of a base map tile set's `config.json`.
///
/// Every field is optional at the serde level so that a missing entry is
/// reported as a [`ConfigurationError`] instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Reference frame; tile sets without one are LV03.
    #[serde(default)]
    pub srs: Option<Srs>,
    /// `[min_x, min_y, max_x, max_y]` in national grid meters.
    #[serde(default)]
    pub bounds: Option<[f64; 4]>,
    /// Meters per pixel at `maxzoom`.
    #[serde(default)]
    pub resolution: Option<f64>,
    #[serde(default)]
    pub maxzoom: Option<u32>,
    #[serde(default)]
    pub minzoom: Option<u32>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl ProjectionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::Parse(e.to_string()))
    }

    pub fn srs(&self) -> Srs {
        self.srs.unwrap_or_default()
    }
}

/// Per-zoom resolutions: `resolution[maxzoom]` is the configured value and
/// each coarser level doubles it.
pub fn resolution_table(resolution: f64, maxzoom: u32) -> Vec<f64> {
    let mut table = vec![0.0; maxzoom as usize + 1];
    table[maxzoom as usize] = resolution;
    for z in (0..maxzoom as usize).rev() {
        table[z] = 2.0 * table[z + 1];
    }
    table
}
