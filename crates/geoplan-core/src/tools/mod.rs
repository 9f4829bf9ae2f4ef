//! Editing tools.
//!
//! Exactly one [`Tool`] is active per session. Every tool gets the same
//! lifecycle calls; tools that do not care about one simply ignore it.

mod edit;
mod measure;
mod multi;
mod object;
mod path;
mod shape;
mod symbol;
mod viewbox;

pub use edit::EditTool;
pub use measure::MeasureTool;
pub use multi::{Alignment, MultiTool};
pub use object::ObjectTool;
pub use path::{DrawTool, PathTool};
pub use shape::{ShapeKind, ShapeTool};
pub use symbol::SymbolTool;
pub use viewbox::ViewboxTool;

use crate::editor::{EditorEvent, SessionConfig};
use crate::input::Key;
use crate::persistence::Persister;
use crate::plans::PlanKind;
use crate::scene::{NodeClass, NodeId, NodeRole, SceneGraph, SceneResult};
use crate::transform::untransform_point;
use crate::viewer::Viewer;
use crate::widget::HandleContainer;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Tool names as used by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolName {
    #[default]
    None,
    Object,
    Multi,
    Rect,
    Circle,
    Ellipse,
    Text,
    Path,
    Symbol,
    Draw,
    Measure,
    Viewbox,
    Edit,
}

impl ToolName {
    pub const ALL: [ToolName; 13] = [
        ToolName::None,
        ToolName::Object,
        ToolName::Multi,
        ToolName::Rect,
        ToolName::Circle,
        ToolName::Ellipse,
        ToolName::Text,
        ToolName::Path,
        ToolName::Symbol,
        ToolName::Draw,
        ToolName::Measure,
        ToolName::Viewbox,
        ToolName::Edit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::None => "none",
            ToolName::Object => "object",
            ToolName::Multi => "multi",
            ToolName::Rect => "rect",
            ToolName::Circle => "circle",
            ToolName::Ellipse => "ellipse",
            ToolName::Text => "text",
            ToolName::Path => "path",
            ToolName::Symbol => "symbol",
            ToolName::Draw => "draw",
            ToolName::Measure => "measure",
            ToolName::Viewbox => "viewbox",
            ToolName::Edit => "edit",
        }
    }

    /// Tools that select existing nodes by clicking them.
    pub fn selects(self) -> bool {
        matches!(self, ToolName::Object | ToolName::Multi | ToolName::Edit)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A toolbar name that matches no tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolName {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}

/// Choices made in the side panels that tools read when creating nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOptions {
    /// Style class of new shapes.
    pub shape_class: Option<String>,
    /// Content of new text shapes.
    pub text: String,
    /// Element id of the symbol definition to drop.
    pub symbol: Option<String>,
}

/// Everything a tool may touch while handling one event.
pub struct ToolContext<'a> {
    pub scene: &'a mut SceneGraph,
    pub persister: &'a mut Persister,
    pub events: &'a mut Vec<EditorEvent>,
    pub viewer: &'a mut Viewer,
    pub config: &'a SessionConfig,
    pub options: &'a ToolOptions,
    /// Layer new nodes go into.
    pub layer: Option<NodeId>,
    pub plan: PlanKind,
    /// Current handle scale.
    pub scale: f64,
}

impl ToolContext<'_> {
    /// Document point in the space of the target layer.
    pub fn layer_point(&self, point: Point) -> Option<(NodeId, Point)> {
        let layer = self.layer?;
        Some((layer, untransform_point(self.scene.world_transform(layer), point)))
    }

    /// Turn a node drawn by `tool` into a persisted plan shape.
    pub fn commit_shape(&mut self, node: NodeId, tool: ToolName) -> SceneResult<()> {
        let id = self.scene.next_id();
        let mut class = NodeClass::new(NodeRole::Shape);
        class.plan = Some(self.plan);
        match (tool, &self.options.shape_class) {
            // Symbols carry their own look.
            (ToolName::Symbol, _) => class.set_style("symbol"),
            (_, Some(style)) => class.set_style(style),
            (_, None) => {}
        }
        let shape = self.scene.get_mut(node)?;
        shape.transient = false;
        shape.class = class;
        shape.set_attr("id", id.to_string());
        shape.set_attr("data-tool", tool.as_str());
        self.scene.register(node);
        self.persister.created(self.scene, node);
        self.events.push(EditorEvent::NodeCreated(node));
        log::debug!("Created {tool} shape {id}");
        Ok(())
    }

    /// Add an editor-only node that is never persisted.
    pub fn add_transient(
        &mut self,
        parent: Option<NodeId>,
        descriptor: &crate::scene::NodeDescriptor,
    ) -> SceneResult<NodeId> {
        let id = self.scene.add_node(parent, descriptor)?;
        self.scene.get_mut(id)?.transient = true;
        Ok(id)
    }
}

/// The active tool and its state.
#[derive(Debug, Default)]
pub enum Tool {
    #[default]
    None,
    Object(ObjectTool),
    Multi(MultiTool),
    Edit(EditTool),
    Shape(ShapeTool),
    Path(PathTool),
    Draw(DrawTool),
    Symbol(SymbolTool),
    Measure(MeasureTool),
    Viewbox(ViewboxTool),
}

impl Tool {
    pub fn new(name: ToolName) -> Self {
        match name {
            ToolName::None => Tool::None,
            ToolName::Object => Tool::Object(ObjectTool::new()),
            ToolName::Multi => Tool::Multi(MultiTool::new()),
            ToolName::Edit => Tool::Edit(EditTool::new()),
            ToolName::Rect => Tool::Shape(ShapeTool::new(ShapeKind::Rect)),
            ToolName::Circle => Tool::Shape(ShapeTool::new(ShapeKind::Circle)),
            ToolName::Ellipse => Tool::Shape(ShapeTool::new(ShapeKind::Ellipse)),
            ToolName::Text => Tool::Shape(ShapeTool::new(ShapeKind::Text)),
            ToolName::Path => Tool::Path(PathTool::new()),
            ToolName::Draw => Tool::Draw(DrawTool::new()),
            ToolName::Symbol => Tool::Symbol(SymbolTool::new()),
            ToolName::Measure => Tool::Measure(MeasureTool::new()),
            ToolName::Viewbox => Tool::Viewbox(ViewboxTool::new()),
        }
    }

    pub fn name(&self) -> ToolName {
        match self {
            Tool::None => ToolName::None,
            Tool::Object(_) => ToolName::Object,
            Tool::Multi(_) => ToolName::Multi,
            Tool::Edit(_) => ToolName::Edit,
            Tool::Shape(tool) => tool.kind().tool_name(),
            Tool::Path(_) => ToolName::Path,
            Tool::Draw(_) => ToolName::Draw,
            Tool::Symbol(_) => ToolName::Symbol,
            Tool::Measure(_) => ToolName::Measure,
            Tool::Viewbox(_) => ToolName::Viewbox,
        }
    }

    /// Creation tools own the pointer; the viewer stops panning and zooming.
    pub fn activate(&mut self, ctx: &mut ToolContext<'_>) {
        match self {
            Tool::None | Tool::Object(_) | Tool::Multi(_) | Tool::Edit(_) => ctx.viewer.enable(),
            Tool::Viewbox(tool) => {
                ctx.viewer.disable();
                tool.show(ctx);
            }
            _ => ctx.viewer.disable(),
        }
    }

    /// Finish or drop whatever is in progress.
    pub fn deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        match self {
            Tool::Shape(tool) => tool.cancel(ctx),
            Tool::Path(tool) => tool.finish(ctx),
            Tool::Draw(tool) => tool.finish(ctx),
            Tool::Measure(tool) => tool.finish(ctx),
            Tool::Viewbox(tool) => tool.cancel(ctx),
            Tool::None | Tool::Object(_) | Tool::Multi(_) | Tool::Edit(_) | Tool::Symbol(_) => {}
        }
        ctx.viewer.enable();
    }

    pub fn attach(&mut self, ctx: &mut ToolContext<'_>, node: NodeId) {
        match self {
            Tool::Object(tool) => tool.attach(ctx, node),
            Tool::Multi(tool) => tool.attach(ctx, node),
            Tool::Edit(tool) => tool.attach(ctx, node),
            _ => {}
        }
    }

    /// Detach whatever is selected and return it.
    pub fn detach(&mut self, ctx: &mut ToolContext<'_>) -> Option<NodeId> {
        match self {
            Tool::Object(tool) => tool.detach(ctx),
            Tool::Multi(tool) => tool.detach(ctx),
            Tool::Edit(tool) => tool.detach(ctx),
            _ => None,
        }
    }

    /// Node the tool currently has attached.
    pub fn selection(&self) -> Option<NodeId> {
        match self {
            Tool::Object(tool) => tool.target(),
            Tool::Multi(tool) => tool.members().first().copied(),
            Tool::Edit(tool) => tool.target(),
            _ => None,
        }
    }

    pub fn set_scale(&mut self, ctx: &mut ToolContext<'_>, scale: f64) {
        match self {
            Tool::Object(tool) => tool.set_scale(scale),
            Tool::Multi(tool) => tool.set_scale(ctx, scale),
            Tool::Edit(tool) => tool.set_scale(scale),
            _ => {}
        }
    }

    /// Returns whether the tool consumed the press.
    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        match self {
            Tool::None => false,
            Tool::Object(tool) => tool.pointer_down(ctx, point),
            Tool::Multi(tool) => tool.pointer_down(ctx, point),
            Tool::Edit(tool) => tool.pointer_down(ctx, point),
            Tool::Shape(tool) => tool.pointer_down(ctx, point),
            Tool::Path(tool) => tool.pointer_down(ctx, point),
            Tool::Draw(tool) => tool.pointer_down(ctx, point),
            Tool::Symbol(tool) => tool.pointer_down(ctx, point),
            Tool::Measure(tool) => tool.pointer_down(ctx, point),
            Tool::Viewbox(tool) => tool.pointer_down(ctx, point),
        }
    }

    pub fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        match self {
            Tool::None | Tool::Symbol(_) => false,
            Tool::Object(tool) => tool.pointer_move(ctx, point),
            Tool::Multi(tool) => tool.pointer_move(ctx, point),
            Tool::Edit(tool) => tool.pointer_move(ctx, point),
            Tool::Shape(tool) => tool.pointer_move(ctx, point),
            Tool::Path(tool) => tool.pointer_move(ctx, point),
            Tool::Draw(tool) => tool.pointer_move(ctx, point),
            Tool::Measure(tool) => tool.pointer_move(ctx, point),
            Tool::Viewbox(tool) => tool.pointer_move(ctx, point),
        }
    }

    pub fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        match self {
            Tool::None | Tool::Symbol(_) => false,
            Tool::Object(tool) => tool.pointer_up(ctx),
            Tool::Multi(tool) => tool.pointer_up(ctx),
            Tool::Edit(tool) => tool.pointer_up(ctx),
            Tool::Shape(tool) => tool.pointer_up(ctx),
            Tool::Path(tool) => tool.pointer_up(ctx),
            Tool::Draw(tool) => tool.pointer_up(ctx),
            Tool::Measure(tool) => tool.pointer_up(ctx, point),
            Tool::Viewbox(tool) => tool.pointer_up(ctx),
        }
    }

    pub fn key_down(&mut self, ctx: &mut ToolContext<'_>, key: Key) -> bool {
        match self {
            Tool::Object(tool) => tool.key_down(ctx, key),
            Tool::Multi(tool) => tool.key_down(ctx, key),
            Tool::Edit(tool) => tool.key_down(ctx, key),
            Tool::Path(tool) if key == Key::Escape => {
                tool.finish(ctx);
                true
            }
            Tool::Shape(tool) if key == Key::Escape => {
                tool.cancel(ctx);
                true
            }
            _ => false,
        }
    }

    /// Handles to draw on top of the scene.
    pub fn handles(&self) -> Option<&HandleContainer> {
        let container = match self {
            Tool::Object(tool) => tool.handles(),
            Tool::Multi(tool) => tool.handles(),
            Tool::Edit(tool) => tool.handles(),
            _ => return None,
        };
        Some(container).filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::persistence::MemorySink;
    use crate::scene::NodeDescriptor;

    /// Owned pieces a [`ToolContext`] borrows from.
    pub struct Harness {
        pub scene: SceneGraph,
        pub persister: Persister,
        pub sink: MemorySink,
        pub events: Vec<EditorEvent>,
        pub viewer: Viewer,
        pub config: SessionConfig,
        pub options: ToolOptions,
        pub layer: NodeId,
    }

    impl Harness {
        /// A scene with one empty `PROJECT0` layer.
        pub fn new() -> Self {
            let mut scene = SceneGraph::new();
            let layer = scene
                .add_node(None, &NodeDescriptor::new("g").attr("id", "PROJECT0").attr("class", "layer"))
                .unwrap();
            let sink = MemorySink::new();
            Self {
                scene,
                persister: Persister::new(sink.clone()),
                sink,
                events: Vec::new(),
                viewer: Viewer::new(),
                config: SessionConfig::default(),
                options: ToolOptions::default(),
                layer,
            }
        }

        pub fn ctx(&mut self) -> ToolContext<'_> {
            ToolContext {
                scene: &mut self.scene,
                persister: &mut self.persister,
                events: &mut self.events,
                viewer: &mut self.viewer,
                config: &self.config,
                options: &self.options,
                layer: Some(self.layer),
                plan: PlanKind::Lageplan,
                scale: 1.0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_round_trip() {
        for name in ToolName::ALL {
            assert_eq!(name.as_str().parse::<ToolName>().unwrap(), name);
            assert_eq!(Tool::new(name).name(), name);
        }
        assert_eq!("lasso".parse::<ToolName>(), Err(UnknownTool("lasso".to_string())));
    }

    #[test]
    fn test_selecting_tools() {
        assert!(ToolName::Edit.selects());
        assert!(!ToolName::Rect.selects());
    }

    #[test]
    fn test_creation_tools_disable_viewer() {
        let mut harness = test_support::Harness::new();
        let mut tool = Tool::new(ToolName::Rect);
        tool.activate(&mut harness.ctx());
        assert!(!harness.viewer.is_enabled());
        tool.deactivate(&mut harness.ctx());
        assert!(harness.viewer.is_enabled());
    }
}
