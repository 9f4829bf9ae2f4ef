//! Single object selection on the static layer.

use super::ToolContext;
use crate::input::Key;
use crate::scene::NodeId;
use crate::widget::{HandleContainer, RotatePlacement, RotateWidget, TranslateArea, TranslateWidget, Widget, WidgetSet};
use kurbo::Point;

/// Moves and rotates one positioned object.
#[derive(Debug)]
pub struct ObjectTool {
    set: WidgetSet,
}

impl Default for ObjectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTool {
    pub fn new() -> Self {
        Self { set: WidgetSet::new() }
    }

    pub fn target(&self) -> Option<NodeId> {
        self.set.target()
    }

    pub fn handles(&self) -> &HandleContainer {
        self.set.container()
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.set.set_scale(scale);
    }

    pub fn attach(&mut self, ctx: &mut ToolContext<'_>, node: NodeId) {
        self.detach(ctx);
        let mut widgets: Vec<Box<dyn Widget>> = vec![Box::new(TranslateWidget::new(TranslateArea::Circle))];
        let element_id = ctx.scene.node(node).and_then(|n| n.element_id());
        if ctx.config.rotates(element_id) {
            widgets.push(Box::new(RotateWidget::new(
                RotatePlacement::Circle,
                ctx.config.object_rotate_gap,
                ctx.config.handle_radius,
            )));
        }
        self.set.set_scale(ctx.scale);
        self.set.attach(ctx.scene, node, widgets);
    }

    pub fn detach(&mut self, ctx: &mut ToolContext<'_>) -> Option<NodeId> {
        self.set.detach(ctx.scene, ctx.persister)
    }

    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        self.set.begin(ctx.scene, point)
    }

    pub fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        self.set.drag(ctx.scene, point)
    }

    pub fn pointer_up(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        self.set.end(ctx.scene, ctx.persister)
    }

    /// Arrow keys nudge the object.
    pub fn key_down(&mut self, ctx: &mut ToolContext<'_>, key: Key) -> bool {
        match key.arrow_direction() {
            Some(direction) => self.set.nudge(ctx.scene, ctx.persister, direction * ctx.config.nudge_step),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeDescriptor;
    use crate::tools::test_support::Harness;
    use crate::transform::{rotation_angle, translation};
    use crate::widget::HandleKind;

    fn object(harness: &mut Harness, id: &str) -> NodeId {
        let layer = harness.layer;
        harness
            .scene
            .add_node(
                Some(layer),
                &NodeDescriptor::new("g")
                    .attr("id", id)
                    .attr("class", "object")
                    .attr("transform", "matrix(1 0 0 1 100 100)")
                    .child(NodeDescriptor::new("rect").attr("x", "-2").attr("y", "-2").attr("width", "4").attr("height", "4")),
            )
            .unwrap()
    }

    #[test]
    fn test_object_gets_circle_and_rotate_handle() {
        let mut harness = Harness::new();
        let node = object(&mut harness, "A1");
        let mut tool = ObjectTool::new();
        tool.attach(&mut harness.ctx(), node);
        let handles = tool.handles().handles();
        assert_eq!(handles.len(), 2);
        let rotate = handles.iter().find(|h| h.kind == HandleKind::Rotate).unwrap();
        // Circle reach 2 * 1.41 plus 16 units.
        assert!((rotate.position.x - (2.82 + 16.0)).abs() < 1e-9);
    }

    #[test]
    fn test_nordpfeil_cannot_rotate() {
        let mut harness = Harness::new();
        let node = object(&mut harness, "NORDPFEIL");
        let mut tool = ObjectTool::new();
        tool.attach(&mut harness.ctx(), node);
        assert!(tool.handles().handles().iter().all(|h| h.kind != HandleKind::Rotate));
    }

    #[test]
    fn test_drag_rotate_handle() {
        let mut harness = Harness::new();
        let node = object(&mut harness, "A1");
        let mut tool = ObjectTool::new();
        tool.attach(&mut harness.ctx(), node);
        assert!(tool.pointer_down(&mut harness.ctx(), Point::new(118.82, 100.0)));
        tool.pointer_move(&mut harness.ctx(), Point::new(100.0, 80.0));
        assert!(tool.pointer_up(&mut harness.ctx()));
        let m = harness.scene.get_transform(node);
        assert!((rotation_angle(m) + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(harness.sink.mutations().len(), 1);
    }

    #[test]
    fn test_arrow_nudge() {
        let mut harness = Harness::new();
        let node = object(&mut harness, "A1");
        let mut tool = ObjectTool::new();
        tool.attach(&mut harness.ctx(), node);
        assert!(tool.key_down(&mut harness.ctx(), Key::ArrowUp));
        let t = translation(harness.scene.get_transform(node));
        assert!((t.y - 99.9).abs() < 1e-9);
        assert!(!tool.key_down(&mut harness.ctx(), Key::Char('x')));
        assert_eq!(tool.detach(&mut harness.ctx()), Some(node));
        assert_eq!(harness.sink.mutations().len(), 1);
    }
}
