//! Scale widget for rect, circle and ellipse geometry.
//!
//! Handles sit on the corners and edge midpoints of the local box and edit
//! the geometry attributes directly in local units. On release a rect is
//! re-centered on its origin and the transform compensates, so the shape
//! does not move on screen.

use super::{Handle, HandleContainer, HandleKind, Widget, WidgetKind};
use crate::persistence::Persister;
use crate::scene::{NodeId, SceneGraph, Tag};
use crate::transform::untransform_point;
use kurbo::{Affine, Point, Rect, Vec2};
use std::f64::consts::SQRT_2;

/// Handle positions as fractions of the box, bottom-left first.
const HANDLE_X: [f64; 8] = [0.0, 0.5, 1.0, 1.0, 1.0, 0.5, 0.0, 0.0];
const HANDLE_Y: [f64; 8] = [1.0, 1.0, 1.0, 0.5, 0.0, 0.0, 0.0, 0.5];

/// Rect multipliers per handle: which of x, y, width, height follow the pointer.
const RECT_DX: [f64; 8] = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0];
const RECT_DY: [f64; 8] = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0];
const RECT_DW: [f64; 8] = [-1.0, 0.0, 1.0, 1.0, 1.0, 0.0, -1.0, -1.0];
const RECT_DH: [f64; 8] = [1.0, 1.0, 1.0, 0.0, -1.0, -1.0, -1.0, 0.0];

/// Ellipse handles that change rx / ry.
const ELLIPSE_DX: [bool; 8] = [true, false, true, true, true, false, true, true];
const ELLIPSE_DY: [bool; 8] = [true, true, true, false, true, true, true, false];

const MIN_SIZE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Geometry {
    Rect { x: f64, y: f64, width: f64, height: f64 },
    Circle { center: Point, r: f64 },
    Ellipse { center: Point, rx: f64, ry: f64 },
}

impl Geometry {
    fn read(scene: &SceneGraph, id: NodeId) -> Option<Self> {
        let num = |name: &str| scene.attr_f64(id, name).unwrap_or(0.0);
        match scene.node(id)?.tag()? {
            Tag::Rect => Some(Geometry::Rect {
                x: num("x"),
                y: num("y"),
                width: num("width"),
                height: num("height"),
            }),
            Tag::Circle => Some(Geometry::Circle {
                center: Point::new(num("cx"), num("cy")),
                r: num("r"),
            }),
            Tag::Ellipse => Some(Geometry::Ellipse {
                center: Point::new(num("cx"), num("cy")),
                rx: num("rx"),
                ry: num("ry"),
            }),
            _ => None,
        }
    }

    /// Geometry after moving handle `index` by `delta`, ending at `pointer`.
    fn resized(self, index: usize, delta: Vec2, pointer: Point) -> Self {
        match self {
            Geometry::Rect { x, y, width, height } => {
                let (x, width) = resize_span(x + RECT_DX[index] * delta.x, width + RECT_DW[index] * delta.x);
                let (y, height) = resize_span(y + RECT_DY[index] * delta.y, height + RECT_DH[index] * delta.y);
                Geometry::Rect { x, y, width, height }
            }
            Geometry::Circle { center, .. } => {
                let divisor = if index % 2 == 0 { SQRT_2 } else { 1.0 };
                Geometry::Circle {
                    center,
                    r: ((pointer - center).hypot() / divisor).max(MIN_SIZE),
                }
            }
            Geometry::Ellipse { center, rx, ry } => {
                let offset = pointer - center;
                Geometry::Ellipse {
                    center,
                    rx: if ELLIPSE_DX[index] { offset.x.abs().max(MIN_SIZE) } else { rx },
                    ry: if ELLIPSE_DY[index] { offset.y.abs().max(MIN_SIZE) } else { ry },
                }
            }
        }
    }

    fn write(self, scene: &mut SceneGraph, id: NodeId) -> bool {
        let values: Vec<(&str, f64)> = match self {
            Geometry::Rect { x, y, width, height } => {
                vec![("x", x), ("y", y), ("width", width), ("height", height)]
            }
            Geometry::Circle { r, .. } => vec![("r", r)],
            Geometry::Ellipse { rx, ry, .. } => vec![("rx", rx), ("ry", ry)],
        };
        values
            .into_iter()
            .all(|(name, value)| scene.set_attr_f64(id, name, value).is_ok())
    }

    fn attribute_names(self) -> &'static [&'static str] {
        match self {
            Geometry::Rect { .. } => &["x", "y", "width", "height"],
            Geometry::Circle { .. } => &["r"],
            Geometry::Ellipse { .. } => &["rx", "ry"],
        }
    }
}

/// Flip a negative span to the other side and enforce the minimum size.
fn resize_span(start: f64, size: f64) -> (f64, f64) {
    let (start, size) = if size < 0.0 { (start + size, -size) } else { (start, size) };
    (start, size.max(MIN_SIZE))
}

#[derive(Debug, Clone, Copy)]
struct ScaleDrag {
    index: usize,
    /// Press point in the node's space.
    pointer: Point,
    geometry: Geometry,
}

#[derive(Debug, Clone)]
pub struct ScaleWidget {
    radius: f64,
    scale: f64,
    target: Option<NodeId>,
    bbox: Rect,
    drag: Option<ScaleDrag>,
}

impl ScaleWidget {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            scale: 1.0,
            target: None,
            bbox: Rect::ZERO,
            drag: None,
        }
    }

    fn place(&self, container: &mut HandleContainer) {
        container.remove_widget(WidgetKind::Scale);
        for index in 0..8 {
            let position = Point::new(
                self.bbox.x0 + HANDLE_X[index] * self.bbox.width(),
                self.bbox.y0 + HANDLE_Y[index] * self.bbox.height(),
            );
            container.push(
                Handle::new(WidgetKind::Scale, HandleKind::Resize(index), position)
                    .with_radius(self.radius * self.scale),
            );
        }
    }

    /// Re-center a rect on its origin, compensating in the transform.
    fn recenter(scene: &mut SceneGraph, target: NodeId) -> bool {
        let Some(Geometry::Rect { x, y, width, height }) = Geometry::read(scene, target) else {
            return false;
        };
        let center = Vec2::new(x + width / 2.0, y + height / 2.0);
        let centered = Geometry::Rect {
            x: -width / 2.0,
            y: -height / 2.0,
            width,
            height,
        };
        let m = scene.get_transform(target) * Affine::translate(center);
        centered.write(scene, target) && scene.set_transform(target, m).is_ok()
    }
}

impl Widget for ScaleWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Scale
    }

    fn attach(&mut self, scene: &SceneGraph, target: NodeId, container: &mut HandleContainer, bbox: Rect) {
        if Geometry::read(scene, target).is_none() {
            log::debug!("{target} has no scalable geometry");
            return;
        }
        self.target = Some(target);
        self.bbox = bbox;
        self.place(container);
    }

    fn detach(&mut self, container: &mut HandleContainer) {
        container.remove_widget(WidgetKind::Scale);
        self.target = None;
        self.drag = None;
    }

    fn scale(&mut self, container: &mut HandleContainer, scale: f64) {
        self.scale = scale;
        if self.target.is_some() {
            self.place(container);
        }
    }

    fn begin(&mut self, scene: &SceneGraph, handle: &Handle, pointer: Point) -> bool {
        let (Some(target), HandleKind::Resize(index)) = (self.target, handle.kind) else {
            return false;
        };
        let Some(geometry) = Geometry::read(scene, target).filter(|_| index < 8) else {
            return false;
        };
        self.drag = Some(ScaleDrag {
            index,
            pointer: untransform_point(scene.world_transform(target), pointer),
            geometry,
        });
        true
    }

    fn drag(&mut self, scene: &mut SceneGraph, container: &mut HandleContainer, pointer: Point) -> bool {
        let (Some(target), Some(drag)) = (self.target, self.drag) else {
            return false;
        };
        let local = untransform_point(scene.world_transform(target), pointer);
        let resized = drag.geometry.resized(drag.index, local - drag.pointer, local);
        if !resized.write(scene, target) {
            return false;
        }
        if let Some(bbox) = scene.local_bbox(target) {
            self.bbox = bbox;
            self.place(container);
        }
        true
    }

    fn end(&mut self, scene: &mut SceneGraph, persister: &mut Persister) {
        let (Some(target), Some(drag)) = (self.target, self.drag.take()) else {
            return;
        };
        let Some(current) = Geometry::read(scene, target) else {
            return;
        };
        if current == drag.geometry {
            return;
        }
        let recentered = Self::recenter(scene, target);
        for name in current.attribute_names() {
            persister.attribute(scene, target, name);
        }
        if recentered {
            persister.transform(scene, target);
        }
    }

    fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}
