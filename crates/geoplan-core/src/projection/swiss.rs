//! Swiss oblique Mercator on the Bessel ellipsoid, with the datum shift to WGS84.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Latitude of the projection origin (old observatory of Bern), degrees.
pub const ORIGIN_LAT: f64 = 46.95240555555556;
/// Longitude of the projection origin, degrees.
pub const ORIGIN_LON: f64 = 7.439583333333333;

const BESSEL_A: f64 = 6377397.155;
const BESSEL_RF: f64 = 299.1528128;
const WGS84_A: f64 = 6378137.0;
const WGS84_RF: f64 = 298.257223563;

/// CH1903 -> WGS84 geocentric translation in meters.
const TO_WGS84: [f64; 3] = [674.374, 15.056, 405.346];

const INVERSE_ITERATIONS: usize = 6;
const INVERSE_EPSILON: f64 = 1e-10;

/// Swiss national reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Srs {
    /// CH1903 / LV03, EPSG:21781.
    #[default]
    #[serde(rename = "LV03")]
    Lv03,
    /// CH1903+ / LV95, EPSG:2056.
    #[serde(rename = "LV95")]
    Lv95,
}

impl Srs {
    /// EPSG code of the frame.
    pub fn epsg(self) -> &'static str {
        match self {
            Srs::Lv03 => "EPSG:21781",
            Srs::Lv95 => "EPSG:2056",
        }
    }

    /// False easting and northing.
    pub fn false_origin(self) -> (f64, f64) {
        match self {
            Srs::Lv03 => (600_000.0, 200_000.0),
            Srs::Lv95 => (2_600_000.0, 1_200_000.0),
        }
    }
}

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    a: f64,
    es: f64,
}

impl Ellipsoid {
    fn from_flattening(a: f64, rf: f64) -> Self {
        let f = 1.0 / rf;
        Self { a, es: f * (2.0 - f) }
    }

    fn geocentric(self, lat: f64, lon: f64) -> [f64; 3] {
        let (sin_lat, cos_lat) = lat.sin_cos();
        let n = self.a / (1.0 - self.es * sin_lat * sin_lat).sqrt();
        [
            n * cos_lat * lon.cos(),
            n * cos_lat * lon.sin(),
            n * (1.0 - self.es) * sin_lat,
        ]
    }

    fn geodetic(self, [x, y, z]: [f64; 3]) -> (f64, f64) {
        let p = x.hypot(y);
        let lon = y.atan2(x);
        let mut lat = z.atan2(p * (1.0 - self.es));
        for _ in 0..10 {
            let sin_lat = lat.sin();
            let n = self.a / (1.0 - self.es * sin_lat * sin_lat).sqrt();
            let h = p / lat.cos() - n;
            let next = z.atan2(p * (1.0 - self.es * n / (n + h)));
            if (next - lat).abs() < 1e-14 {
                lat = next;
                break;
            }
            lat = next;
        }
        (lat, lon)
    }
}

/// Ellipsoidal Swiss oblique Mercator (`+proj=somerc`).
///
/// `project` takes WGS84 degrees and returns national grid meters
/// (x = easting, y = northing, y growing north).
#[derive(Debug, Clone, Copy)]
pub struct SwissProjection {
    srs: Srs,
    bessel: Ellipsoid,
    wgs84: Ellipsoid,
    e: f64,
    c: f64,
    k: f64,
    k_r: f64,
    sin_p0: f64,
    cos_p0: f64,
    lon0: f64,
}

impl SwissProjection {
    pub fn new(srs: Srs) -> Self {
        let bessel = Ellipsoid::from_flattening(BESSEL_A, BESSEL_RF);
        let wgs84 = Ellipsoid::from_flattening(WGS84_A, WGS84_RF);
        let es = bessel.es;
        let e = es.sqrt();
        let one_es = 1.0 - es;
        let phi0 = ORIGIN_LAT.to_radians();

        let cp = phi0.cos().powi(2);
        let c = (1.0 + es * cp * cp / one_es).sqrt();
        let sin_phi0 = phi0.sin();
        let sin_p0 = sin_phi0 / c;
        let phip0 = sin_p0.asin();
        let cos_p0 = phip0.cos();
        let sp = sin_phi0 * e;
        let k = (FRAC_PI_4 + 0.5 * phip0).tan().ln()
            - c * ((FRAC_PI_4 + 0.5 * phi0).tan().ln() - 0.5 * e * ((1.0 + sp) / (1.0 - sp)).ln());
        let k_r = one_es.sqrt() / (1.0 - sp * sp);

        Self {
            srs,
            bessel,
            wgs84,
            e,
            c,
            k,
            k_r,
            sin_p0,
            cos_p0,
            lon0: ORIGIN_LON.to_radians(),
        }
    }

    pub fn srs(&self) -> Srs {
        self.srs
    }

    /// WGS84 -> national grid.
    pub fn project(&self, position: LatLng) -> Point {
        let wgs = self
            .wgs84
            .geocentric(position.lat.to_radians(), position.lng.to_radians());
        let shifted = [
            wgs[0] - TO_WGS84[0],
            wgs[1] - TO_WGS84[1],
            wgs[2] - TO_WGS84[2],
        ];
        let (phi, lon) = self.bessel.geodetic(shifted);
        self.forward(phi, lon - self.lon0)
    }

    /// National grid -> WGS84.
    pub fn unproject(&self, point: Point) -> LatLng {
        let (phi, lam) = self.inverse(point);
        let bessel = self.bessel.geocentric(phi, lam + self.lon0);
        let shifted = [
            bessel[0] + TO_WGS84[0],
            bessel[1] + TO_WGS84[1],
            bessel[2] + TO_WGS84[2],
        ];
        let (lat, lng) = self.wgs84.geodetic(shifted);
        LatLng::new(lat.to_degrees(), lng.to_degrees())
    }

    fn forward(&self, phi: f64, lam: f64) -> Point {
        let half_e = 0.5 * self.e;
        let sp = self.e * phi.sin();
        let phip = 2.0
            * (self.c * ((FRAC_PI_4 + 0.5 * phi).tan().ln() - half_e * ((1.0 + sp) / (1.0 - sp)).ln())
                + self.k)
                .exp()
                .atan()
            - FRAC_PI_2;
        let lamp = self.c * lam;
        let cp = phip.cos();
        let phipp = (self.cos_p0 * phip.sin() - self.sin_p0 * cp * lamp.cos()).asin();
        let lampp = (cp * lamp.sin() / phipp.cos()).asin();

        let (x0, y0) = self.srs.false_origin();
        Point::new(
            self.bessel.a * self.k_r * lampp + x0,
            self.bessel.a * self.k_r * (FRAC_PI_4 + 0.5 * phipp).tan().ln() + y0,
        )
    }

    fn inverse(&self, point: Point) -> (f64, f64) {
        let (x0, y0) = self.srs.false_origin();
        let x = (point.x - x0) / self.bessel.a;
        let y = (point.y - y0) / self.bessel.a;

        let phipp = 2.0 * ((y / self.k_r).exp().atan() - FRAC_PI_4);
        let lampp = x / self.k_r;
        let cp = phipp.cos();
        let mut phip = (self.cos_p0 * phipp.sin() + self.sin_p0 * cp * lampp.cos()).asin();
        let lamp = (cp * lampp.sin() / phip.cos()).asin();

        let half_e = 0.5 * self.e;
        let one_es = 1.0 - self.e * self.e;
        let con = (self.k - (FRAC_PI_4 + 0.5 * phip).tan().ln()) / self.c;
        for _ in 0..INVERSE_ITERATIONS {
            let esp = self.e * phip.sin();
            let delta = (con + (FRAC_PI_4 + 0.5 * phip).tan().ln()
                - half_e * ((1.0 + esp) / (1.0 - esp)).ln())
                * (1.0 - esp * esp)
                * phip.cos()
                / one_es;
            phip -= delta;
            if delta.abs() < INVERSE_EPSILON {
                break;
            }
        }
        (phip, lamp / self.c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_lv03() {
        let projection = SwissProjection::new(Srs::Lv03);
        let bern = projection.unproject(Point::new(600_000.0, 200_000.0));
        // Bern old observatory in WGS84.
        assert!((bern.lat - 46.95108).abs() < 2e-4, "{bern:?}");
        assert!((bern.lng - 7.43864).abs() < 2e-4, "{bern:?}");
    }

    #[test]
    fn test_lv95_differs_only_by_false_origin() {
        let lv03 = SwissProjection::new(Srs::Lv03);
        let lv95 = SwissProjection::new(Srs::Lv95);
        let position = LatLng::new(47.3769, 8.5417);
        let a = lv03.project(position);
        let b = lv95.project(position);
        assert!((b.x - a.x - 2_000_000.0).abs() < 1e-6);
        assert!((b.y - a.y - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip_grid_to_wgs84() {
        let projection = SwissProjection::new(Srs::Lv95);
        for point in [
            Point::new(2_683_253.0, 1_246_389.0),
            Point::new(2_600_000.0, 1_200_000.0),
            Point::new(2_500_000.0, 1_100_000.0),
        ] {
            let back = projection.project(projection.unproject(point));
            assert!((back.x - point.x).abs() < 0.05, "{point:?} -> {back:?}");
            assert!((back.y - point.y).abs() < 0.05, "{point:?} -> {back:?}");
        }
    }

    #[test]
    fn test_zurich_lies_north_east_of_bern() {
        let projection = SwissProjection::new(Srs::Lv03);
        let zurich = projection.project(LatLng::new(47.3769, 8.5417));
        assert!(zurich.x > 600_000.0 && zurich.x < 700_000.0);
        assert!(zurich.y > 200_000.0 && zurich.y < 260_000.0);
    }

    #[test]
    fn test_srs_names() {
        assert_eq!(Srs::Lv03.epsg(), "EPSG:21781");
        assert_eq!(Srs::Lv95.epsg(), "EPSG:2056");
        assert_eq!(serde_json::to_string(&Srs::Lv95).unwrap(), "\"LV95\"");
    }
}
