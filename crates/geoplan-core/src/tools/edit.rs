//! Shape editing on the project layers.

use super::ToolContext;
use crate::editor::{EditorEvent, SessionConfig};
use crate::input::Key;
use crate::scene::NodeId;
use crate::widget::{
    HandleContainer, PathWidget, RotatePlacement, RotateWidget, ScaleWidget, TranslateArea, TranslateWidget,
    Widget, WidgetSet,
};
use kurbo::Point;

/// Widgets for a shape, chosen by the tool that drew it (`data-tool`).
pub fn widgets_for(data_tool: Option<&str>, config: &SessionConfig) -> Vec<Box<dyn Widget>> {
    let translate = || -> Box<dyn Widget> { Box::new(TranslateWidget::new(TranslateArea::Bounds)) };
    let rotate = |placement| -> Box<dyn Widget> {
        Box::new(RotateWidget::new(placement, config.edit_rotate_gap, config.handle_radius))
    };
    match data_tool {
        Some("rect" | "circle" | "ellipse") => vec![
            translate(),
            rotate(RotatePlacement::Edge),
            Box::new(ScaleWidget::new(config.handle_radius)),
        ],
        Some("text") => vec![translate(), rotate(RotatePlacement::TopEdge)],
        Some("symbol") => vec![translate(), rotate(RotatePlacement::Edge)],
        Some("path") => vec![translate(), Box::new(PathWidget::new(config.handle_radius))],
        _ => vec![translate()],
    }
}

/// Moves, rotates, resizes and reshapes one project shape.
#[derive(Debug)]
pub struct EditTool {
    set: WidgetSet,
}

impl Default for EditTool {
    fn default() -> Self {
        Self::new()
    }
}

impl EditTool {
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
        let data_tool = ctx.scene.node(node).and_then(|n| n.attr("data-tool"));
        let widgets = widgets_for(data_tool, ctx.config);
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

    /// Delete removes the shape, arrow keys nudge it.
    pub fn key_down(&mut self, ctx: &mut ToolContext<'_>, key: Key) -> bool {
        if key == Key::Delete {
            return self.delete(ctx);
        }
        match key.arrow_direction() {
            Some(direction) => self.set.nudge(ctx.scene, ctx.persister, direction * ctx.config.nudge_step),
            None => false,
        }
    }

    fn delete(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let Some(node) = self.set.forget() else {
            return false;
        };
        let external = ctx.scene.external_id(node);
        if let Err(err) = ctx.scene.remove(node) {
            log::warn!("Cannot delete {external}: {err}");
            return false;
        }
        ctx.persister.deleted(external.clone());
        ctx.events.push(EditorEvent::NodeDeleted(external));
        true
    }
}
