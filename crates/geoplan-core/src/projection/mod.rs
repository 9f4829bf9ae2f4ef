//! Coordinate projection between drawing space, Swiss grid and WGS84.

mod axis;
mod config;
mod swiss;

pub use axis::{AxisConvention, Y_UPPER_LV03, Y_UPPER_LV95};
pub use config::{ProjectionConfig, resolution_table};
pub use swiss::{LatLng, ORIGIN_LAT, ORIGIN_LON, Srs, SwissProjection};

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deepest zoom level a tile set may declare.
pub const MAX_ZOOM: u32 = 30;

/// Projection configuration problems. Fatal for every projection call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("No projection configured")]
    Unconfigured,
    #[error("Projection config is missing {0}")]
    Missing(&'static str),
    #[error("Invalid projection parameter {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("Cannot parse projection config: {0}")]
    Parse(String),
}

/// Result type for configuration-dependent operations.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// A geographic rectangle as handed out by a base map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }
}

/// A validated coordinate reference system for one tile set.
///
/// Immutable once built and shared by all conversions of a session.
#[derive(Debug, Clone)]
pub struct Crs {
    projection: SwissProjection,
    axis: AxisConvention,
    resolutions: Vec<f64>,
    bounds: Rect,
    minzoom: u32,
}

impl Crs {
    /// Validate a configuration and build the projection.
    pub fn from_config(config: &ProjectionConfig) -> ConfigResult<Self> {
        let resolution = config.resolution.ok_or(ConfigurationError::Missing("resolution"))?;
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(ConfigurationError::Invalid {
                name: "resolution",
                reason: format!("{resolution} is not a positive number"),
            });
        }
        let maxzoom = config.maxzoom.ok_or(ConfigurationError::Missing("maxzoom"))?;
        if maxzoom > MAX_ZOOM {
            return Err(ConfigurationError::Invalid {
                name: "maxzoom",
                reason: format!("{maxzoom} exceeds {MAX_ZOOM}"),
            });
        }
        let [min_x, min_y, max_x, max_y] =
            config.bounds.ok_or(ConfigurationError::Missing("bounds"))?;
        if !(min_x < max_x && min_y < max_y) {
            return Err(ConfigurationError::Invalid {
                name: "bounds",
                reason: format!("[{min_x}, {min_y}, {max_x}, {max_y}] is empty"),
            });
        }
        let minzoom = config.minzoom.unwrap_or(0);
        if minzoom > maxzoom {
            return Err(ConfigurationError::Invalid {
                name: "minzoom",
                reason: format!("{minzoom} exceeds maxzoom {maxzoom}"),
            });
        }

        let srs = config.srs();
        log::debug!("Projection {} with {} zoom levels", srs.epsg(), maxzoom + 1);
        Ok(Self {
            projection: SwissProjection::new(srs),
            axis: AxisConvention::for_srs(srs),
            resolutions: resolution_table(resolution, maxzoom),
            bounds: Rect::new(min_x, min_y, max_x, max_y),
            minzoom,
        })
    }

    /// Parse and validate a `config.json`.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Self::from_config(&ProjectionConfig::from_json(json)?)
    }

    pub fn srs(&self) -> Srs {
        self.projection.srs()
    }

    pub fn axis(&self) -> AxisConvention {
        self.axis
    }

    /// National grid bounds of the tile set.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn max_zoom(&self) -> u32 {
        (self.resolutions.len() - 1) as u32
    }

    pub fn min_zoom(&self) -> u32 {
        self.minzoom
    }

    /// Meters per pixel at zoom `z`, `None` past the finest level.
    pub fn resolution(&self, z: u32) -> Option<f64> {
        self.resolutions.get(z as usize).copied()
    }

    pub fn resolutions(&self) -> &[f64] {
        &self.resolutions
    }

    /// WGS84 -> national grid.
    pub fn project(&self, position: LatLng) -> Point {
        self.projection.project(position)
    }

    /// National grid -> WGS84.
    pub fn unproject(&self, point: Point) -> LatLng {
        self.projection.unproject(point)
    }

    /// Whether a national grid point lies inside the configured bounds.
    pub fn contains(&self, national: Point) -> bool {
        national.x >= self.bounds.x0
            && national.x <= self.bounds.x1
            && national.y >= self.bounds.y0
            && national.y <= self.bounds.y1
    }

    /// Drawing-space point -> WGS84.
    pub fn svg_to_lat_lng(&self, svg: Point) -> LatLng {
        self.unproject(self.axis.to_national(svg))
    }

    /// WGS84 -> drawing space.
    pub fn lat_lng_to_svg(&self, position: LatLng) -> Point {
        self.axis.to_svg(self.project(position))
    }

    /// Geographic corners of a drawing-space region.
    pub fn svg_region_to_geo(&self, region: Rect) -> GeoBounds {
        let national = self.axis.rect_to_national(region);
        GeoBounds::new(
            self.unproject(Point::new(national.x0, national.y0)),
            self.unproject(Point::new(national.x1, national.y1)),
        )
    }

    /// National grid rectangle of geographic bounds.
    pub fn geo_to_national(&self, bounds: &GeoBounds) -> Rect {
        Rect::from_points(self.project(bounds.south_west), self.project(bounds.north_east))
    }

    /// Drawing-space top-left corner of geographic bounds.
    pub fn geo_to_svg_origin(&self, bounds: &GeoBounds) -> Point {
        let national = self.geo_to_national(bounds);
        Point::new(national.x0, self.axis.to_svg(Point::new(national.x0, national.y1)).y)
    }
}
