//! Axis convention between national grid and drawing space.

use super::swiss::Srs;
use kurbo::{Point, Rect};

/// Upper y bound used to flip LV03 northings into drawing space.
pub const Y_UPPER_LV03: f64 = 256_070.0;
/// Upper y bound used to flip LV95 northings into drawing space.
pub const Y_UPPER_LV95: f64 = 1_256_069.0;

/// Maps national grid coordinates (y grows north) to drawing coordinates
/// (y grows down) and back.
///
/// `svg_y = y_upper - ch_y`, x is unchanged. The mapping is an involution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConvention {
    y_upper: f64,
}

impl AxisConvention {
    pub fn new(y_upper: f64) -> Self {
        Self { y_upper }
    }

    /// Convention used for drawings in the given frame.
    pub fn for_srs(srs: Srs) -> Self {
        match srs {
            Srs::Lv03 => Self::new(Y_UPPER_LV03),
            Srs::Lv95 => Self::new(Y_UPPER_LV95),
        }
    }

    pub fn y_upper(&self) -> f64 {
        self.y_upper
    }

    pub fn to_svg(&self, national: Point) -> Point {
        Point::new(national.x, self.y_upper - national.y)
    }

    pub fn to_national(&self, svg: Point) -> Point {
        Point::new(svg.x, self.y_upper - svg.y)
    }

    /// National grid rectangle covered by a drawing-space rectangle.
    pub fn rect_to_national(&self, svg: Rect) -> Rect {
        let a = self.to_national(Point::new(svg.x0, svg.y0));
        let b = self.to_national(Point::new(svg.x1, svg.y1));
        Rect::from_points(a, b)
    }
}
