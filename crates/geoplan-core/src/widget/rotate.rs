//! Rotate widget.
//!
//! The rotation is computed in the parent's space from the node origin to
//! the pointer. The linear part becomes a pure rotation, so any scale on
//! the node is reset to 1.

use super::{Handle, HandleContainer, HandleKind, HandleShape, Widget, WidgetKind};
use crate::persistence::Persister;
use crate::scene::{NodeId, SceneGraph};
use crate::transform::{rotation_towards, translation, untransform_point};
use kurbo::{Affine, Point, Rect};

/// Where the rotate handle sits relative to the node's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotatePlacement {
    /// Right of the box, vertically centered.
    Edge,
    /// Right of the box at its top (text baseline boxes).
    TopEdge,
    /// Right of the circular move area of an object.
    Circle,
}

#[derive(Debug, Clone)]
pub struct RotateWidget {
    placement: RotatePlacement,
    gap: f64,
    radius: f64,
    scale: f64,
    target: Option<NodeId>,
    bbox: Rect,
    start: Option<Affine>,
}

impl RotateWidget {
    /// `gap` and `radius` are in handle units, multiplied by the view scale.
    pub fn new(placement: RotatePlacement, gap: f64, radius: f64) -> Self {
        Self {
            placement,
            gap,
            radius,
            scale: 1.0,
            target: None,
            bbox: Rect::ZERO,
            start: None,
        }
    }

    fn position(&self) -> Point {
        let gap = self.gap * self.scale;
        match self.placement {
            RotatePlacement::Edge => Point::new(self.bbox.x1 + gap, self.bbox.center().y),
            RotatePlacement::TopEdge => Point::new(self.bbox.x1 + gap, self.bbox.y0),
            RotatePlacement::Circle => {
                let reach = self.bbox.x1.abs().max(self.bbox.y1.abs()) * 1.41;
                Point::new(reach + gap, 0.0)
            }
        }
    }

    fn place(&self, container: &mut HandleContainer) {
        container.remove_widget(WidgetKind::Rotate);
        container.push(
            Handle::new(WidgetKind::Rotate, HandleKind::Rotate, self.position())
                .with_shape(HandleShape::Circle)
                .with_radius(self.radius * self.scale),
        );
    }
}

impl Widget for RotateWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Rotate
    }

    fn attach(&mut self, _scene: &SceneGraph, target: NodeId, container: &mut HandleContainer, bbox: Rect) {
        self.target = Some(target);
        self.bbox = bbox;
        self.place(container);
    }

    fn detach(&mut self, container: &mut HandleContainer) {
        container.remove_widget(WidgetKind::Rotate);
        self.target = None;
        self.start = None;
    }

    fn scale(&mut self, container: &mut HandleContainer, scale: f64) {
        self.scale = scale;
        if self.target.is_some() {
            self.place(container);
        }
    }

    fn begin(&mut self, scene: &SceneGraph, handle: &Handle, _pointer: Point) -> bool {
        match (self.target, handle.kind) {
            (Some(target), HandleKind::Rotate) => {
                self.start = Some(scene.get_transform(target));
                true
            }
            _ => false,
        }
    }

    fn drag(&mut self, scene: &mut SceneGraph, _container: &mut HandleContainer, pointer: Point) -> bool {
        let (Some(target), Some(_)) = (self.target, self.start) else {
            return false;
        };
        let m = scene.get_transform(target);
        let local = untransform_point(scene.parent_world_transform(target), pointer);
        let direction = local.to_vec2() - translation(m);
        match rotation_towards(m, direction) {
            Some(rotated) => scene.set_transform(target, rotated).is_ok(),
            // Pointer on the pivot.
            None => false,
        }
    }

    fn end(&mut self, scene: &mut SceneGraph, persister: &mut Persister) {
        let (Some(target), Some(start)) = (self.target, self.start.take()) else {
            return;
        };
        if scene.get_transform(target) != start {
            persister.transform(scene, target);
        }
    }

    fn is_dragging(&self) -> bool {
        self.start.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemorySink;
    use crate::scene::NodeDescriptor;
    use crate::transform::{coefficients, rotation_angle, uniform_scale};
    use std::f64::consts::FRAC_PI_2;

    fn scene_with(transform: &str) -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let node = scene
            .add_node(
                None,
                &NodeDescriptor::new("rect")
                    .attr("id", "1")
                    .attr("x", "-5")
                    .attr("y", "-5")
                    .attr("width", "10")
                    .attr("height", "10")
                    .attr("transform", transform),
            )
            .unwrap();
        (scene, node)
    }

    fn rotate_to(scene: &mut SceneGraph, node: NodeId, pointer: Point) -> MemorySink {
        let sink = MemorySink::new();
        let mut persister = Persister::new(sink.clone());
        let mut container = HandleContainer::new();
        let mut widget = RotateWidget::new(RotatePlacement::Edge, 14.0, 3.0);
        let bbox = scene.local_bbox(node).unwrap();
        widget.attach(scene, node, &mut container, bbox);
        let handle = container.handles()[0].clone();
        assert!(widget.begin(scene, &handle, pointer));
        widget.drag(scene, &mut container, pointer);
        widget.end(scene, &mut persister);
        sink
    }

    #[test]
    fn test_handle_placement() {
        let (scene, node) = scene_with("matrix(1 0 0 1 0 0)");
        let mut container = HandleContainer::new();
        let mut widget = RotateWidget::new(RotatePlacement::Edge, 14.0, 3.0);
        widget.scale(&mut container, 0.5);
        widget.attach(&scene, node, &mut container, Rect::new(-5.0, -5.0, 5.0, 5.0));
        assert_eq!(container.handles()[0].position, Point::new(12.0, 0.0));
        assert!((container.handles()[0].radius - 1.5).abs() < 1e-9);

        let mut top = RotateWidget::new(RotatePlacement::TopEdge, 14.0, 3.0);
        top.attach(&scene, node, &mut container, Rect::new(0.0, -12.0, 30.0, 0.0));
        assert_eq!(container.handles()[0].position, Point::new(44.0, -12.0));
    }

    #[test]
    fn test_rotate_towards_pointer_keeps_translation() {
        let (mut scene, node) = scene_with("matrix(1 0 0 1 10 10)");
        let sink = rotate_to(&mut scene, node, Point::new(10.0, 30.0));
        let m = scene.get_transform(node);
        assert!((rotation_angle(m) - FRAC_PI_2).abs() < 1e-9);
        let [.., e, f] = coefficients(m);
        assert_eq!((e, f), (10.0, 10.0));
        assert_eq!(sink.mutations().len(), 1);
    }

    #[test]
    fn test_rotate_resets_uniform_scale() {
        // Known limitation: rotation writes a pure rotation matrix.
        let (mut scene, node) = scene_with("matrix(2 0 0 2 0 0)");
        rotate_to(&mut scene, node, Point::new(0.0, 5.0));
        assert!((uniform_scale(scene.get_transform(node)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_on_pivot_is_ignored() {
        let (mut scene, node) = scene_with("matrix(1 0 0 1 3 4)");
        let sink = rotate_to(&mut scene, node, Point::new(3.0, 4.0));
        assert_eq!(coefficients(scene.get_transform(node)), [1.0, 0.0, 0.0, 1.0, 3.0, 4.0]);
        assert!(sink.mutations().is_empty());
    }
}
