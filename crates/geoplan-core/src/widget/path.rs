//! Spline paths and the control point widget.
//!
//! Splines are stored as `M 0 0 C c0 c1 p1 S c2 p2 S c3 p3 ...`: an explicit
//! cubic for the first segment and smooth segments after it, all relative
//! to the path's own origin.

use super::{Handle, HandleContainer, HandleKind, HandleShape, Widget, WidgetKind};
use crate::persistence::Persister;
use crate::scene::{NodeId, SceneGraph};
use crate::transform::untransform_point;
use kurbo::{Point, Rect};
use std::fmt::Write as _;

/// One smooth segment: incoming control point and end point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub control: Point,
    pub point: Point,
}

impl Segment {
    pub fn new(control: Point, point: Point) -> Self {
        Self { control, point }
    }
}

/// A smooth cubic spline starting at the origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplinePath {
    /// Leading control point of the first segment.
    pub start_control: Point,
    pub segments: Vec<Segment>,
}

impl SplinePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse path data written by [`SplinePath::to_d`].
    pub fn parse(d: &str) -> Option<Self> {
        let tokens: Vec<&str> = d.split_whitespace().collect();
        let number = |index: usize| tokens.get(index).and_then(|token| token.parse::<f64>().ok());
        let point = |index: usize| Some(Point::new(number(index)?, number(index + 1)?));

        if tokens.first() != Some(&"M") || point(1)? != Point::ZERO {
            return None;
        }
        let mut path = SplinePath::new();
        if tokens.len() == 3 {
            return Some(path);
        }
        if tokens.get(3) != Some(&"C") {
            return None;
        }
        path.start_control = point(4)?;
        path.segments.push(Segment::new(point(6)?, point(8)?));

        let mut index = 10;
        while index < tokens.len() {
            if tokens[index] != "S" {
                return None;
            }
            path.segments.push(Segment::new(point(index + 1)?, point(index + 3)?));
            index += 5;
        }
        Some(path)
    }

    pub fn to_d(&self) -> String {
        let mut d = String::from("M 0 0");
        for (i, segment) in self.segments.iter().enumerate() {
            let (c, p) = (segment.control, segment.point);
            // Writing into a String cannot fail.
            let _ = if i == 0 {
                let c0 = self.start_control;
                write!(d, " C {} {} {} {} {} {}", c0.x, c0.y, c.x, c.y, p.x, p.y)
            } else {
                write!(d, " S {} {} {} {}", c.x, c.y, p.x, p.y)
            };
        }
        d
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    pub fn last_mut(&mut self) -> Option<&mut Segment> {
        self.segments.last_mut()
    }

    /// Control point by handle index, -1 being the start control.
    pub fn control(&self, index: isize) -> Option<Point> {
        match index {
            -1 => Some(self.start_control),
            i if i >= 0 => self.segments.get(i as usize).map(|s| s.control),
            _ => None,
        }
    }

    pub fn set_control(&mut self, index: isize, point: Point) -> bool {
        match index {
            -1 => {
                self.start_control = point;
                true
            }
            i if i >= 0 => match self.segments.get_mut(i as usize) {
                Some(segment) => {
                    segment.control = point;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Point a control handle is connected to.
    fn anchor(&self, index: isize) -> Point {
        match index {
            i if i >= 0 => self.segments.get(i as usize).map_or(Point::ZERO, |s| s.point),
            _ => Point::ZERO,
        }
    }
}

/// Drags the control points of a spline path.
#[derive(Debug, Clone)]
pub struct PathWidget {
    radius: f64,
    scale: f64,
    target: Option<NodeId>,
    path: SplinePath,
    /// Dragged control index and the data at press time.
    drag: Option<(isize, String)>,
}

impl PathWidget {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            scale: 1.0,
            target: None,
            path: SplinePath::new(),
            drag: None,
        }
    }

    fn place(&self, container: &mut HandleContainer) {
        container.remove_widget(WidgetKind::Path);
        for index in -1..self.path.len() as isize {
            let Some(control) = self.path.control(index) else {
                continue;
            };
            container.push(
                Handle::new(WidgetKind::Path, HandleKind::Control(index), control)
                    .with_shape(HandleShape::Circle)
                    .with_radius(self.radius * self.scale)
                    .with_anchor(self.path.anchor(index)),
            );
        }
    }
}

impl Widget for PathWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Path
    }

    fn attach(&mut self, scene: &SceneGraph, target: NodeId, container: &mut HandleContainer, _bbox: Rect) {
        let d = scene.node(target).and_then(|node| node.attr("d")).unwrap_or_default();
        match SplinePath::parse(d) {
            Some(path) => {
                self.path = path;
                self.target = Some(target);
                self.place(container);
            }
            None => log::warn!("Path {target} is not a spline: {d:?}"),
        }
    }

    fn detach(&mut self, container: &mut HandleContainer) {
        container.remove_widget(WidgetKind::Path);
        self.target = None;
        self.drag = None;
    }

    fn scale(&mut self, container: &mut HandleContainer, scale: f64) {
        self.scale = scale;
        if self.target.is_some() {
            self.place(container);
        }
    }

    fn begin(&mut self, scene: &SceneGraph, handle: &Handle, _pointer: Point) -> bool {
        let (Some(target), HandleKind::Control(index)) = (self.target, handle.kind) else {
            return false;
        };
        let d = scene.attr_value(target, "d").unwrap_or_default();
        self.drag = Some((index, d));
        true
    }

    fn drag(&mut self, scene: &mut SceneGraph, container: &mut HandleContainer, pointer: Point) -> bool {
        let (Some(target), Some((index, _))) = (self.target, self.drag.as_ref()) else {
            return false;
        };
        let local = untransform_point(scene.world_transform(target), pointer);
        if !self.path.set_control(*index, local) {
            return false;
        }
        if scene.set_attr(target, "d", &self.path.to_d()).is_err() {
            return false;
        }
        self.place(container);
        true
    }

    fn end(&mut self, scene: &mut SceneGraph, persister: &mut Persister) {
        let (Some(target), Some((_, start))) = (self.target, self.drag.take()) else {
            return;
        };
        if scene.attr_value(target, "d").is_some_and(|d| d != start) {
            persister.attribute(scene, target, "d");
        }
    }

    fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}
