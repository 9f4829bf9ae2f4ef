//! Group selection.
//!
//! Members stay where they are in the tree. A transient group container is
//! placed at the center of their joint world box and carries the translate
//! and rotate widgets; every container change is replayed onto the members
//! relative to where they were when the drag started.

use super::ToolContext;
use crate::input::Key;
use crate::scene::{NodeDescriptor, NodeId, SceneGraph};
use crate::transform::apply_linear_inverse;
use crate::widget::{
    HandleContainer, RotatePlacement, RotateWidget, TranslateArea, TranslateWidget, Widget, WidgetSet,
};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// How `align` lines members up against the joint box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Right,
    Top,
    Bottom,
    /// Same horizontal center (a vertical center line).
    CenterVertical,
    /// Same vertical center.
    CenterHorizontal,
}

impl Alignment {
    /// World delta that moves `member` onto `group`.
    fn delta(self, group: Rect, member: Rect) -> Vec2 {
        match self {
            Alignment::Left => Vec2::new(group.x0 - member.x0, 0.0),
            Alignment::Right => Vec2::new(group.x1 - member.x1, 0.0),
            Alignment::Top => Vec2::new(0.0, group.y0 - member.y0),
            Alignment::Bottom => Vec2::new(0.0, group.y1 - member.y1),
            Alignment::CenterVertical => Vec2::new(group.center().x - member.center().x, 0.0),
            Alignment::CenterHorizontal => Vec2::new(0.0, group.center().y - member.center().y),
        }
    }
}

#[derive(Debug, Clone)]
struct GroupDrag {
    container: Affine,
    /// World transforms of the members at press time.
    members: Vec<(NodeId, Affine)>,
}

#[derive(Debug)]
pub struct MultiTool {
    members: Vec<NodeId>,
    container: Option<NodeId>,
    set: WidgetSet,
    drag: Option<GroupDrag>,
}

impl Default for MultiTool {
    fn default() -> Self {
        Self::new()
    }
}

fn union_bbox(scene: &SceneGraph, members: &[NodeId]) -> Option<Rect> {
    members
        .iter()
        .filter_map(|&id| scene.world_bbox(id))
        .reduce(|acc, rect| acc.union(rect))
}

impl MultiTool {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            container: None,
            set: WidgetSet::new(),
            drag: None,
        }
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// The transient group node, while there are members.
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn handles(&self) -> &HandleContainer {
        self.set.container()
    }

    pub fn set_scale(&mut self, ctx: &mut ToolContext<'_>, scale: f64) {
        self.set.set_scale(scale);
        self.rebuild(ctx);
    }

    /// Add a node to the group, or take it out if it is already a member.
    pub fn attach(&mut self, ctx: &mut ToolContext<'_>, node: NodeId) {
        match self.members.iter().position(|&m| m == node) {
            Some(index) => {
                self.members.remove(index);
            }
            None => self.members.push(node),
        }
        self.set.set_scale(ctx.scale);
        self.rebuild(ctx);
    }

    /// Empty the group. Returns the first member.
    pub fn detach(&mut self, ctx: &mut ToolContext<'_>) -> Option<NodeId> {
        if self.drag.is_some() {
            self.pointer_up(ctx);
        }
        self.set.forget();
        if let Some(container) = self.container.take() {
            if let Err(err) = ctx.scene.remove(container) {
                log::warn!("Group container already gone: {err}");
            }
        }
        let first = self.members.first().copied();
        self.members.clear();
        first
    }

    /// Drop the whole selection.
    pub fn cancel(&mut self, ctx: &mut ToolContext<'_>) {
        self.detach(ctx);
    }

    /// Place the container around the members and lay out its handles.
    fn rebuild(&mut self, ctx: &mut ToolContext<'_>) {
        self.members.retain(|&m| ctx.scene.contains(m));
        self.set.forget();
        let Some(bounds) = union_bbox(ctx.scene, &self.members) else {
            if let Some(container) = self.container.take() {
                let _ = ctx.scene.remove(container);
            }
            return;
        };
        if let Some(container) = self.container.take() {
            let _ = ctx.scene.remove(container);
        }
        let frame = NodeDescriptor::new("rect")
            .attr("class", "multi-frame")
            .attr("x", (-bounds.width() / 2.0).to_string())
            .attr("y", (-bounds.height() / 2.0).to_string())
            .attr("width", bounds.width().to_string())
            .attr("height", bounds.height().to_string());
        let descriptor = NodeDescriptor::new("g").attr("class", "multi-select").child(frame);
        let container = match ctx.add_transient(None, &descriptor) {
            Ok(container) => container,
            Err(err) => {
                log::warn!("Cannot create group container: {err}");
                return;
            }
        };
        let center = bounds.center().to_vec2();
        if let Err(err) = ctx.scene.set_transform(container, Affine::translate(center)) {
            log::warn!("Cannot place group container: {err}");
        }
        self.container = Some(container);

        let widgets: Vec<Box<dyn Widget>> = vec![
            Box::new(TranslateWidget::new(TranslateArea::Bounds)),
            Box::new(RotateWidget::new(
                RotatePlacement::Edge,
                ctx.config.object_rotate_gap,
                ctx.config.handle_radius,
            )),
        ];
        self.set.attach(ctx.scene, container, widgets);
    }

    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        let Some(container) = self.container else {
            return false;
        };
        if !self.set.begin(ctx.scene, point) {
            return false;
        }
        self.drag = Some(GroupDrag {
            container: ctx.scene.world_transform(container),
            members: self
                .members
                .iter()
                .map(|&m| (m, ctx.scene.world_transform(m)))
                .collect(),
        });
        true
    }

    pub fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        let (Some(container), Some(drag)) = (self.container, self.drag.as_ref()) else {
            return false;
        };
        if !self.set.drag(ctx.scene, point) {
            return false;
        }
        let change = ctx.scene.world_transform(container) * drag.container.inverse();
        for &(member, start) in &drag.members {
            let parent = ctx.scene.parent_world_transform(member);
            let local = parent.inverse() * change * start;
            if let Err(err) = ctx.scene.set_transform(member, local) {
                log::warn!("Group member vanished: {err}");
            }
        }
        true
    }

    /// Persist every member that moved.
    pub fn pointer_up(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        self.set.end(ctx.scene, ctx.persister);
        for (member, start) in drag.members {
            if ctx.scene.contains(member) && ctx.scene.world_transform(member) != start {
                ctx.persister.transform(ctx.scene, member);
            }
        }
        true
    }

    /// Line members up against the joint box. Rotation is untouched.
    pub fn align(&mut self, ctx: &mut ToolContext<'_>, alignment: Alignment) {
        let Some(group) = union_bbox(ctx.scene, &self.members) else {
            return;
        };
        for &member in &self.members {
            let Some(bbox) = ctx.scene.world_bbox(member) else {
                continue;
            };
            let delta = alignment.delta(group, bbox);
            if delta.hypot() <= f64::EPSILON {
                continue;
            }
            let local = apply_linear_inverse(ctx.scene.parent_world_transform(member), delta);
            if let Err(err) = TranslateWidget::nudge(ctx.scene, ctx.persister, member, local) {
                log::warn!("Cannot align {member}: {err}");
            }
        }
        self.rebuild(ctx);
    }

    /// Arrow keys move every member; Escape drops the selection.
    pub fn key_down(&mut self, ctx: &mut ToolContext<'_>, key: Key) -> bool {
        if key == Key::Escape {
            self.cancel(ctx);
            return true;
        }
        let Some(direction) = key.arrow_direction() else {
            return false;
        };
        if self.members.is_empty() || self.drag.is_some() {
            return false;
        }
        let delta = direction * ctx.config.nudge_step;
        for &member in &self.members {
            let local = apply_linear_inverse(ctx.scene.parent_world_transform(member), delta);
            if let Err(err) = TranslateWidget::nudge(ctx.scene, ctx.persister, member, local) {
                log::warn!("Cannot move {member}: {err}");
            }
        }
        self.rebuild(ctx);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::Harness;
    use crate::transform::translation;
    use crate::widget::HandleKind;

    fn square(harness: &mut Harness, id: &str, x: f64, y: f64) -> NodeId {
        let layer = harness.layer;
        harness
            .scene
            .add_node(
                Some(layer),
                &NodeDescriptor::new("rect")
                    .attr("id", id)
                    .attr("x", "-1")
                    .attr("y", "-1")
                    .attr("width", "2")
                    .attr("height", "2")
                    .attr("transform", format!("matrix(1 0 0 1 {x} {y})")),
            )
            .unwrap()
    }

    fn center(scene: &SceneGraph, id: NodeId) -> Point {
        scene.world_bbox(id).unwrap().center()
    }

    #[test]
    fn test_container_at_union_center() {
        let mut harness = Harness::new();
        let a = square(&mut harness, "1", 0.0, 0.0);
        let b = square(&mut harness, "2", 10.0, 4.0);
        let mut tool = MultiTool::new();
        tool.attach(&mut harness.ctx(), a);
        tool.attach(&mut harness.ctx(), b);
        let container = tool.container().unwrap();
        assert!(harness.scene.get(container).unwrap().transient);
        assert_eq!(translation(harness.scene.get_transform(container)), Vec2::new(5.0, 2.0));
        assert_eq!(tool.members(), [a, b]);
    }

    #[test]
    fn test_attach_twice_removes_member() {
        let mut harness = Harness::new();
        let a = square(&mut harness, "1", 0.0, 0.0);
        let mut tool = MultiTool::new();
        tool.attach(&mut harness.ctx(), a);
        tool.attach(&mut harness.ctx(), a);
        assert!(tool.members().is_empty());
        assert!(tool.container().is_none());
    }

    #[test]
    fn test_group_translate_moves_members_in_lockstep() {
        let mut harness = Harness::new();
        let a = square(&mut harness, "1", 0.0, 0.0);
        let b = square(&mut harness, "2", 10.0, 0.0);
        let mut tool = MultiTool::new();
        tool.attach(&mut harness.ctx(), a);
        tool.attach(&mut harness.ctx(), b);

        assert!(tool.pointer_down(&mut harness.ctx(), Point::new(5.0, 0.0)));
        tool.pointer_move(&mut harness.ctx(), Point::new(8.0, 2.0));
        assert!(tool.pointer_up(&mut harness.ctx()));

        assert_eq!(translation(harness.scene.get_transform(a)), Vec2::new(3.0, 2.0));
        assert_eq!(translation(harness.scene.get_transform(b)), Vec2::new(13.0, 2.0));
        // Only the members are persisted, never the container.
        assert_eq!(harness.sink.mutations().len(), 2);
    }

    #[test]
    fn test_group_rotation_is_rigid() {
        let mut harness = Harness::new();
        let a = square(&mut harness, "1", 0.0, 0.0);
        let b = square(&mut harness, "2", 10.0, 0.0);
        let mut tool = MultiTool::new();
        tool.attach(&mut harness.ctx(), a);
        tool.attach(&mut harness.ctx(), b);
        let pivot = Point::new(5.0, 0.0);
        let before = (center(&harness.scene, a) - pivot, center(&harness.scene, b) - pivot);

        let rotate = tool
            .handles()
            .handles()
            .iter()
            .find(|h| h.kind == HandleKind::Rotate)
            .unwrap()
            .position;
        assert!(tool.pointer_down(&mut harness.ctx(), pivot + rotate.to_vec2()));
        // Quarter turn: pointer straight below the pivot.
        tool.pointer_move(&mut harness.ctx(), Point::new(5.0, 20.0));
        tool.pointer_up(&mut harness.ctx());

        let after = (center(&harness.scene, a) - pivot, center(&harness.scene, b) - pivot);
        let turned = |v: Vec2| Vec2::new(-v.y, v.x);
        assert!((after.0 - turned(before.0)).hypot() < 1e-9);
        assert!((after.1 - turned(before.1)).hypot() < 1e-9);
        let distance = (center(&harness.scene, a) - center(&harness.scene, b)).hypot();
        assert!((distance - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_align_left_and_center() {
        let mut harness = Harness::new();
        let a = square(&mut harness, "1", 0.0, 0.0);
        let b = square(&mut harness, "2", 10.0, 6.0);
        let mut tool = MultiTool::new();
        tool.attach(&mut harness.ctx(), a);
        tool.attach(&mut harness.ctx(), b);

        tool.align(&mut harness.ctx(), Alignment::Left);
        assert_eq!(translation(harness.scene.get_transform(b)), Vec2::new(0.0, 6.0));
        assert_eq!(harness.sink.mutations().len(), 1);

        tool.align(&mut harness.ctx(), Alignment::CenterHorizontal);
        let (ya, yb) = (center(&harness.scene, a).y, center(&harness.scene, b).y);
        assert!((ya - 3.0).abs() < 1e-9);
        assert!((yb - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_escape_cancels_group() {
        let mut harness = Harness::new();
        let a = square(&mut harness, "1", 0.0, 0.0);
        let mut tool = MultiTool::new();
        tool.attach(&mut harness.ctx(), a);
        let container = tool.container().unwrap();
        assert!(tool.key_down(&mut harness.ctx(), Key::Escape));
        assert!(tool.members().is_empty());
        assert!(!harness.scene.contains(container));
    }
}
