//! Translate widget.

use super::{Handle, HandleContainer, HandleKind, HandleShape, Widget, WidgetKind};
use crate::persistence::Persister;
use crate::scene::{NodeId, SceneGraph, SceneResult};
use crate::transform::{translation, untransform_point, with_translation};
use kurbo::{Affine, Point, Rect, Vec2};

/// Circle radius factor around an object's origin.
const CIRCLE_FACTOR: f64 = 1.41;

/// Area that starts a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateArea {
    /// The node's own bounding box.
    Bounds,
    /// A circle around the node's origin reaching past its box corner.
    Circle,
}

#[derive(Debug, Clone, Copy)]
struct TranslateDrag {
    start: Affine,
    /// Press point in the parent's space.
    pointer: Point,
}

/// Moves a node by changing the translation of its transform.
#[derive(Debug, Clone)]
pub struct TranslateWidget {
    area: TranslateArea,
    target: Option<NodeId>,
    drag: Option<TranslateDrag>,
}

impl TranslateWidget {
    pub fn new(area: TranslateArea) -> Self {
        Self {
            area,
            target: None,
            drag: None,
        }
    }

    /// Move `target` by `delta` in its parent's space and persist.
    pub fn nudge(scene: &mut SceneGraph, persister: &mut Persister, target: NodeId, delta: Vec2) -> SceneResult<()> {
        let m = scene.get_transform(target);
        let t = translation(m) + delta;
        scene.set_transform(target, with_translation(m, t.x, t.y))?;
        persister.transform(scene, target);
        Ok(())
    }

    fn handle(&self, bbox: Rect) -> Handle {
        match self.area {
            TranslateArea::Bounds => Handle::area(WidgetKind::Translate, bbox),
            TranslateArea::Circle => {
                let radius = bbox.x1.abs().max(bbox.y1.abs()) * CIRCLE_FACTOR;
                Handle::new(WidgetKind::Translate, HandleKind::Move, Point::ZERO)
                    .with_shape(HandleShape::Circle)
                    .with_radius(radius)
            }
        }
    }
}

impl Widget for TranslateWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Translate
    }

    fn attach(&mut self, _scene: &SceneGraph, target: NodeId, container: &mut HandleContainer, bbox: Rect) {
        self.target = Some(target);
        container.push(self.handle(bbox));
    }

    fn detach(&mut self, container: &mut HandleContainer) {
        container.remove_widget(WidgetKind::Translate);
        self.drag = None;
    }

    // The move area follows the node, not the zoom.
    fn scale(&mut self, _container: &mut HandleContainer, _scale: f64) {}

    fn begin(&mut self, scene: &SceneGraph, handle: &Handle, pointer: Point) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        if handle.kind != HandleKind::Move {
            return false;
        }
        self.drag = Some(TranslateDrag {
            start: scene.get_transform(target),
            pointer: untransform_point(scene.parent_world_transform(target), pointer),
        });
        true
    }

    fn drag(&mut self, scene: &mut SceneGraph, _container: &mut HandleContainer, pointer: Point) -> bool {
        let (Some(target), Some(drag)) = (self.target, self.drag) else {
            return false;
        };
        let now = untransform_point(scene.parent_world_transform(target), pointer);
        let t = translation(drag.start) + (now - drag.pointer);
        scene.set_transform(target, with_translation(drag.start, t.x, t.y)).is_ok()
    }

    fn end(&mut self, scene: &mut SceneGraph, persister: &mut Persister) {
        let (Some(target), Some(drag)) = (self.target, self.drag.take()) else {
            return;
        };
        if scene.get_transform(target) != drag.start {
            persister.transform(scene, target);
        }
    }

    fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}
