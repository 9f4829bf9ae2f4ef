//! Handle definitions for widget manipulation.

use super::WidgetKind;
use kurbo::{Point, Rect};

/// A manipulation handle owned by a widget.
///
/// Positions are in the space of the handle container's owner node.
#[derive(Debug, Clone, PartialEq)]
pub struct Handle {
    /// Widget that reacts to this handle.
    pub widget: WidgetKind,
    /// The kind of handle (determines behavior).
    pub kind: HandleKind,
    pub position: Point,
    /// Visual shape of the handle.
    pub shape: HandleShape,
    /// Radius of point handles.
    pub radius: f64,
    /// Covered area of `Area` handles.
    pub area: Option<Rect>,
    /// Point a connector line is drawn from (path control points).
    pub anchor: Option<Point>,
}

/// The kind of handle - determines what manipulation it performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Drag the whole node.
    Move,
    Rotate,
    /// Resize handle, index 0..8 counter-clockwise from the bottom-left corner.
    Resize(usize),
    /// Path control point; -1 is the first segment's leading control.
    Control(isize),
}

/// Visual shape of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleShape {
    /// Square handle (default for resize handles).
    #[default]
    Square,
    Circle,
    /// Diamond handle (for control points).
    Diamond,
    /// Invisible area covering a region.
    Area,
}

impl Handle {
    pub fn new(widget: WidgetKind, kind: HandleKind, position: Point) -> Self {
        Self {
            widget,
            kind,
            position,
            shape: HandleShape::default(),
            radius: 1.0,
            area: None,
            anchor: None,
        }
    }

    /// A move handle covering `area`.
    pub fn area(widget: WidgetKind, area: Rect) -> Self {
        Self {
            area: Some(area),
            shape: HandleShape::Area,
            ..Self::new(widget, HandleKind::Move, area.center())
        }
    }

    pub fn with_shape(mut self, shape: HandleShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_anchor(mut self, anchor: Point) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Whether a point in owner space lies on the handle.
    pub fn hit_test(&self, point: Point) -> bool {
        match (self.shape, self.area) {
            (HandleShape::Area, Some(area)) => area.contains(point),
            (HandleShape::Circle, _) => (point - self.position).hypot() <= self.radius,
            _ => {
                let d = point - self.position;
                d.x.abs() <= self.radius && d.y.abs() <= self.radius
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_handle_hit() {
        let handle = Handle::new(WidgetKind::Scale, HandleKind::Resize(0), Point::new(10.0, 10.0)).with_radius(3.0);
        assert!(handle.hit_test(Point::new(12.5, 7.5)));
        assert!(!handle.hit_test(Point::new(14.0, 10.0)));
    }

    #[test]
    fn test_circle_handle_hit() {
        let handle = Handle::new(WidgetKind::Translate, HandleKind::Move, Point::ZERO)
            .with_shape(HandleShape::Circle)
            .with_radius(5.0);
        assert!(handle.hit_test(Point::new(3.0, 3.0)));
        assert!(!handle.hit_test(Point::new(4.0, 4.0)));
    }

    #[test]
    fn test_area_handle_hit() {
        let handle = Handle::area(WidgetKind::Translate, Rect::new(-5.0, -2.0, 5.0, 2.0));
        assert_eq!(handle.kind, HandleKind::Move);
        assert!(handle.hit_test(Point::new(4.0, -1.0)));
        assert!(!handle.hit_test(Point::new(6.0, 0.0)));
    }
}
