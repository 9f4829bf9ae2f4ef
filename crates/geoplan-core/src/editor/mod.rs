//! The editing session: one document, its plans and the active tool.
//!
//! [`EditorSession`] is what an embedding UI talks to. Pointer input arrives
//! in screen pixels and is mapped into drawing space through the
//! [`Viewer`]. Everything the UI may want to react to is queued as an
//! [`EditorEvent`] and drained with [`EditorSession::take_events`].

mod config;
mod event;

pub use config::SessionConfig;
pub use event::EditorEvent;

use crate::input::{InputState, Key, Modifiers, MouseButton, PointerEvent};
use crate::persistence::{PersistenceSink, Persister};
use crate::plans::{
    LayoutChange, PickEntry, PlanError, PlanKind, PlanMove, PlanSet, ProjectLayer, STATIC_LAYER,
    LAGEPLAN_SHAPES_LAYER, StaticLayer, show_plan,
};
use crate::projection::{ConfigurationError, Crs, GeoBounds, LatLng};
use crate::scene::{NodeId, NodeRole, SceneDocument, SceneError, SceneGraph};
use crate::style::{self, ElementStyle, StylePreview};
use crate::tools::{Alignment, Tool, ToolContext, ToolName, ToolOptions};
use crate::viewer::Viewer;
use crate::widget::HandleContainer;
use crate::zorder::{self, ZOrder};
use kurbo::{Point, Rect, Size, Vec2};
use std::time::Instant;
use thiserror::Error;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Document has no {0} layer")]
    MissingLayer(&'static str),
    #[error("Nothing selected")]
    NoSelection,
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// The layer the user is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveLayer {
    /// Plan objects on `STATIC`, edited with the object tool.
    Static,
    /// Free shapes on `PROJECT0`/`PROJECT1`, edited with the edit tool.
    Project,
}

/// What the current press drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Gesture {
    #[default]
    Idle,
    Tool,
    Pan,
}

/// An open document with its plans, tools and view.
pub struct EditorSession {
    id: String,
    scene: SceneGraph,
    plans: PlanSet,
    persister: Persister,
    config: SessionConfig,
    crs: Option<Crs>,
    viewer: Viewer,
    input: InputState,
    tool: Tool,
    /// Tool multi-select falls back to.
    single_tool: ToolName,
    selection: Option<NodeId>,
    options: ToolOptions,
    static_layer: Option<StaticLayer>,
    project_layer: Option<ProjectLayer>,
    active_layer: Option<ActiveLayer>,
    /// Layer tools draw into.
    layer: Option<NodeId>,
    scale: f64,
    preview: StylePreview,
    gesture: Gesture,
    events: Vec<EditorEvent>,
}

impl EditorSession {
    /// Open a document. The Lageplan becomes active and the static layer is
    /// selected for editing, or the project layer when there is none.
    pub fn new(
        document: &SceneDocument,
        config: SessionConfig,
        sink: impl PersistenceSink + 'static,
    ) -> SessionResult<Self> {
        let scene = document.build_scene()?;
        let plans = PlanSet::from_configs(&document.plans)?;
        let static_layer = StaticLayer::find(&scene);
        let project_layer = ProjectLayer::find(&scene);

        let mut session = Self {
            id: document.document_id(),
            scene,
            plans,
            persister: Persister::new(sink),
            scale: config.handle_scale,
            config,
            crs: None,
            viewer: Viewer::new(),
            input: InputState::new(),
            tool: Tool::None,
            single_tool: ToolName::Object,
            selection: None,
            options: ToolOptions::default(),
            static_layer,
            project_layer,
            active_layer: None,
            layer: None,
            preview: StylePreview::new(),
            gesture: Gesture::Idle,
            events: Vec::new(),
        };
        log::info!("Opened document {} with {} nodes", session.id, session.scene.len());

        session.set_plan(PlanKind::Lageplan);
        if session.static_layer.is_some() {
            session.activate_static_layer()?;
        } else if session.project_layer.is_some() {
            session.activate_project_layer()?;
        }
        Ok(session)
    }

    /// Open a document from its JSON form.
    pub fn from_json(json: &str, config: SessionConfig, sink: impl PersistenceSink + 'static) -> SessionResult<Self> {
        Self::new(&SceneDocument::from_json(json)?, config, sink)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn plans(&self) -> &PlanSet {
        &self.plans
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn tool_name(&self) -> ToolName {
        self.tool.name()
    }

    pub fn active_layer(&self) -> Option<ActiveLayer> {
        self.active_layer
    }

    /// Node with handles attached. In multi-select mode, the first member.
    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    pub fn is_multi(&self) -> bool {
        self.tool.name() == ToolName::Multi
    }

    /// Members of the multi-selection, empty outside multi-select mode.
    pub fn multi_members(&self) -> &[NodeId] {
        match &self.tool {
            Tool::Multi(tool) => tool.members(),
            _ => &[],
        }
    }

    /// Current handle scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Handles to draw on top of the scene.
    pub fn handles(&self) -> Option<&HandleContainer> {
        self.tool.handles()
    }

    /// Queued events, persistence failures included.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        self.flush_failures();
        std::mem::take(&mut self.events)
    }

    /// Snapshot the document with the current plan regions and layouts.
    pub fn to_document(&self) -> SessionResult<SceneDocument> {
        Ok(SceneDocument::capture(
            Some(self.id.clone()),
            &self.scene,
            self.plans.to_configs(),
        )?)
    }

    fn flush_failures(&mut self) {
        for failure in self.persister.take_failures() {
            self.events.push(EditorEvent::PersistenceFailed(failure));
        }
    }

    /// Run `f` with the active tool and a context over the session state.
    fn with_tool<R>(&mut self, f: impl FnOnce(&mut Tool, &mut ToolContext<'_>) -> R) -> R {
        let mut ctx = ToolContext {
            scene: &mut self.scene,
            persister: &mut self.persister,
            events: &mut self.events,
            viewer: &mut self.viewer,
            config: &self.config,
            options: &self.options,
            layer: self.layer,
            plan: self.plans.active(),
            scale: self.scale,
        };
        f(&mut self.tool, &mut ctx)
    }

    fn sync_selection(&mut self) {
        let current = self.tool.selection();
        if current != self.selection {
            self.selection = current;
            self.events.push(EditorEvent::SelectionChanged(current));
        }
    }

    // Tools and selection.

    /// Switch tools. The current selection is handed over to the new tool.
    pub fn set_tool(&mut self, name: ToolName) {
        if self.tool.name() == name {
            return;
        }
        let selected = self.with_tool(|tool, ctx| {
            let node = tool.detach(ctx);
            tool.deactivate(ctx);
            node
        });
        self.tool = Tool::new(name);
        let scale = self.scale;
        self.with_tool(|tool, ctx| {
            tool.activate(ctx);
            tool.set_scale(ctx, scale);
            if let Some(node) = selected.filter(|&node| ctx.scene.contains(node)) {
                tool.attach(ctx, node);
            }
        });
        if name.selects() && name != ToolName::Multi {
            self.single_tool = name;
        }
        log::debug!("Switched to {name} tool");
        self.events.push(EditorEvent::ToolChanged(name));
        self.sync_selection();
    }

    /// Attach handles to a node. In multi-select mode this toggles
    /// membership.
    pub fn attach(&mut self, node: NodeId) -> SessionResult<()> {
        self.scene.get(node)?;
        self.with_tool(|tool, ctx| tool.attach(ctx, node));
        self.sync_selection();
        Ok(())
    }

    /// Drop the selection, persisting a pending transform. Returns the node
    /// that was selected.
    pub fn detach(&mut self) -> Option<NodeId> {
        let node = self.with_tool(|tool, ctx| tool.detach(ctx));
        self.sync_selection();
        node
    }

    fn enter_multi(&mut self) {
        let name = self.tool.name();
        if !name.selects() || name == ToolName::Multi {
            return;
        }
        self.single_tool = name;
        self.set_tool(ToolName::Multi);
        self.events.push(EditorEvent::MultiSelectChanged(true));
    }

    fn leave_multi(&mut self) {
        if !self.is_multi() {
            return;
        }
        self.detach();
        self.set_tool(self.single_tool);
        self.events.push(EditorEvent::MultiSelectChanged(false));
    }

    /// Put every positioned, visible object of the static layer into a
    /// multi-selection.
    pub fn select_all(&mut self) {
        let (Some(layer), Some(ActiveLayer::Static)) = (self.static_layer, self.active_layer) else {
            return;
        };
        let objects = layer.select_all(&self.scene);
        if objects.is_empty() {
            return;
        }
        self.detach();
        self.enter_multi();
        self.with_tool(|tool, ctx| {
            for &object in &objects {
                tool.attach(ctx, object);
            }
        });
        log::debug!("Selected all {} objects", objects.len());
        self.sync_selection();
    }

    // Input.

    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) {
        self.pointer_down_at(screen, modifiers, Instant::now());
    }

    /// Press at `now`. Handles of the current selection win over nodes
    /// below them; a press on the background pans.
    pub fn pointer_down_at(&mut self, screen: Point, modifiers: Modifiers, now: Instant) {
        self.input.set_modifiers(modifiers);
        self.input.handle_pointer_event_at(
            PointerEvent::Down {
                position: screen,
                button: MouseButton::Left,
            },
            now,
        );
        let point = self.viewer.screen_to_user(screen);
        let name = self.tool.name();

        if name.selects() && !modifiers.ctrl && self.input.is_double_click() {
            if let Some(node) = self.scene.pick(point).filter(|&node| self.is_static_object(node)) {
                self.detach();
                if let Err(err) = self.toggle_positioned(node) {
                    log::warn!("Cannot toggle placement: {err}");
                }
                let _ = self.attach(node);
                return;
            }
        }

        // Ctrl-clicks in multi mode toggle members under the group frame.
        let toggling = modifiers.ctrl && name == ToolName::Multi;
        if !toggling && self.with_tool(|tool, ctx| tool.pointer_down(ctx, point)) {
            self.gesture = Gesture::Tool;
            return;
        }
        if !name.selects() {
            return;
        }

        match self.scene.pick(point) {
            Some(node) => self.press_node(node, point, modifiers),
            None => {
                self.detach();
                self.leave_multi();
                if self.viewer.is_enabled() {
                    self.viewer.pan_start(screen);
                    self.gesture = Gesture::Pan;
                }
            }
        }
    }

    fn press_node(&mut self, node: NodeId, point: Point, modifiers: Modifiers) {
        if modifiers.ctrl {
            self.enter_multi();
        } else {
            self.leave_multi();
        }
        if self.is_multi() {
            let _ = self.attach(node);
            return;
        }
        if self.selection != Some(node) {
            let _ = self.attach(node);
        }
        if self.with_tool(|tool, ctx| tool.pointer_down(ctx, point)) {
            self.gesture = Gesture::Tool;
        }
    }

    fn is_static_object(&self, node: NodeId) -> bool {
        self.active_layer == Some(ActiveLayer::Static)
            && self.scene.node(node).is_some_and(|n| n.class.role == NodeRole::Object)
    }

    pub fn pointer_move(&mut self, screen: Point) {
        self.input.handle_pointer_event(PointerEvent::Move { position: screen });
        match self.gesture {
            Gesture::Pan => {
                self.viewer.pan_move(screen);
            }
            Gesture::Tool | Gesture::Idle => {
                let point = self.viewer.screen_to_user(screen);
                self.with_tool(|tool, ctx| tool.pointer_move(ctx, point));
            }
        }
    }

    pub fn pointer_up(&mut self, screen: Point) {
        self.input.handle_pointer_event(PointerEvent::Up {
            position: screen,
            button: MouseButton::Left,
        });
        match std::mem::take(&mut self.gesture) {
            Gesture::Pan => self.viewer.pan_end(),
            Gesture::Tool | Gesture::Idle => {
                let point = self.viewer.screen_to_user(screen);
                self.with_tool(|tool, ctx| tool.pointer_up(ctx, point));
            }
        }
        self.sync_selection();
    }

    /// Ctrl starts multi-select, Ctrl+A selects every object; everything
    /// else goes to the tool.
    pub fn key_down(&mut self, key: Key) -> bool {
        self.input.handle_key(key, true);
        match key {
            Key::Control => {
                self.enter_multi();
                self.is_multi()
            }
            Key::Char('a') | Key::Char('A') if self.input.modifiers.ctrl => {
                self.select_all();
                self.is_multi()
            }
            _ => {
                let handled = self.with_tool(|tool, ctx| tool.key_down(ctx, key));
                self.sync_selection();
                handled
            }
        }
    }

    /// Releasing Ctrl keeps the group; the next plain click collapses it.
    pub fn key_up(&mut self, key: Key) {
        self.input.handle_key(key, false);
    }

    /// Zoom around the pointer. Returns whether the view changed.
    pub fn wheel(&mut self, screen: Point, delta_y: f64) -> bool {
        self.input.handle_pointer_event(PointerEvent::Scroll {
            position: screen,
            delta: Vec2::new(0.0, delta_y),
        });
        if !self.viewer.wheel(screen, delta_y) {
            return false;
        }
        self.update_handle_scale();
        true
    }

    pub fn set_viewport(&mut self, size: Size) {
        self.viewer.set_viewport(size);
    }

    /// Resize handles; usually follows the zoom.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
        self.with_tool(|tool, ctx| tool.set_scale(ctx, scale));
    }

    fn update_handle_scale(&mut self) {
        if let Some(scale) = self.viewer.handle_scale() {
            self.set_scale(scale);
        }
    }

    // Tool options.

    /// Content of the next text shape.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.options.text = text.into();
    }

    /// Element id in the defs of the next symbol.
    pub fn set_symbol(&mut self, symbol: Option<String>) {
        self.options.symbol = symbol;
    }

    /// Predefined style of the next shape.
    pub fn set_shape_class(&mut self, class: Option<String>) {
        self.options.shape_class = class;
    }

    // Plans and layers.

    /// Make a plan active: its viewbox and zoom, title block, overlays and
    /// object categories.
    pub fn set_plan(&mut self, kind: PlanKind) {
        self.detach();
        let previous = self.plans.active();
        if let (Some(project), Some(ActiveLayer::Project)) = (self.project_layer, self.active_layer) {
            project.clear_plan_selection(&mut self.scene, previous);
        }
        self.plans.set_active(kind);

        let massstab = self.plans.get(kind).layout.massstab;
        self.viewer.set_plan(kind, self.plans.viewbox(kind), massstab);
        show_plan(&mut self.scene, kind);
        if let Some(layer) = self.static_layer {
            layer.set_plan(&mut self.scene, kind);
        }
        if let (Some(project), Some(ActiveLayer::Project)) = (self.project_layer, self.active_layer) {
            project.set_plan(&mut self.scene, kind);
            self.layer = Some(project.layer_for(kind));
        }
        self.update_handle_scale();
        log::info!("Active plan {kind}");
        self.events.push(EditorEvent::PlanChanged(kind));
    }

    /// Edit the plan objects. Returns the object pick list.
    pub fn activate_static_layer(&mut self) -> SessionResult<Vec<PickEntry>> {
        let layer = self.static_layer.ok_or(SessionError::MissingLayer(STATIC_LAYER))?;
        self.detach();
        if let Some(project) = self.project_layer {
            project.clear_plan_selection(&mut self.scene, self.plans.active());
        }
        let entries = layer.activate(&mut self.scene, self.plans.active());
        self.active_layer = Some(ActiveLayer::Static);
        self.layer = Some(layer.id());
        self.set_tool(ToolName::Object);
        Ok(entries)
    }

    /// Edit the free shapes of the active plan.
    pub fn activate_project_layer(&mut self) -> SessionResult<()> {
        let project = self
            .project_layer
            .ok_or(SessionError::MissingLayer(LAGEPLAN_SHAPES_LAYER))?;
        self.detach();
        if let Some(layer) = self.static_layer {
            layer.unregister(&mut self.scene);
        }
        let plan = self.plans.active();
        project.set_plan(&mut self.scene, plan);
        self.active_layer = Some(ActiveLayer::Project);
        self.layer = Some(project.layer_for(plan));
        self.set_tool(ToolName::Edit);
        Ok(())
    }

    /// Object selector entries of the static layer.
    pub fn pick_list(&self) -> Vec<PickEntry> {
        self.static_layer
            .map(|layer| layer.pick_list(&self.scene))
            .unwrap_or_default()
    }

    /// Place or park a static object in the current view.
    pub fn toggle_positioned(&mut self, node: NodeId) -> SessionResult<bool> {
        let layer = self.static_layer.ok_or(SessionError::MissingLayer(STATIC_LAYER))?;
        let viewbox = self
            .viewer
            .viewbox()
            .unwrap_or_else(|| self.plans.viewbox(self.plans.active()));
        Ok(layer.toggle_positioned(&mut self.scene, node, viewbox, &mut self.persister)?)
    }

    /// Move a plan by `delta` in drawing space.
    pub fn move_plan(&mut self, kind: PlanKind, delta: Vec2) -> SessionResult<PlanMove> {
        let before = self.viewboxes();
        self.detach();
        let moved = self
            .plans
            .move_plan(kind, delta, &mut self.scene, &mut self.persister)?;
        self.refresh_views(&before, &moved.changed);
        Ok(moved)
    }

    /// Move a plan onto a rectangle picked on the base map.
    pub fn move_plan_to_geo(&mut self, kind: PlanKind, bounds: &GeoBounds) -> SessionResult<PlanMove> {
        let crs = self.crs.as_ref().ok_or(ConfigurationError::Unconfigured)?;
        let before = self.viewboxes();
        let moved = self
            .plans
            .move_plan_to_geo(kind, bounds, crs, &mut self.scene, &mut self.persister)?;
        self.refresh_views(&before, &moved.changed);
        Ok(moved)
    }

    /// Change a layout setting. Returns the plans that changed.
    pub fn change_layout(&mut self, kind: PlanKind, change: LayoutChange) -> SessionResult<Vec<PlanKind>> {
        let before = self.viewboxes();
        let changed = self.plans.change_layout(kind, change, &mut self.persister)?;
        self.refresh_views(&before, &changed);
        let active = self.plans.active();
        if changed.contains(&active) {
            let massstab = self.plans.get(active).layout.massstab;
            self.viewer.set_plan(active, self.plans.viewbox(active), massstab);
            self.update_handle_scale();
        }
        Ok(changed)
    }

    fn viewboxes(&self) -> Vec<(PlanKind, Rect)> {
        PlanKind::ALL
            .into_iter()
            .map(|kind| (kind, self.plans.viewbox(kind)))
            .collect()
    }

    /// Forget the zoom of plans whose viewbox moved or resized.
    fn refresh_views(&mut self, before: &[(PlanKind, Rect)], changed: &[PlanKind]) {
        for &(kind, viewbox) in before {
            let current = self.plans.viewbox(kind);
            if changed.contains(&kind) && current != viewbox {
                self.viewer.reset_plan(kind, current);
            }
        }
        if changed.contains(&self.plans.active()) {
            self.update_handle_scale();
        }
    }

    /// Delete the unlocked shapes of the active plan.
    pub fn clear_plan(&mut self) -> SessionResult<Vec<String>> {
        let project = self
            .project_layer
            .ok_or(SessionError::MissingLayer(LAGEPLAN_SHAPES_LAYER))?;
        self.detach();
        let deleted = project.clear_plan(&mut self.scene, self.plans.active(), &mut self.persister)?;
        for id in &deleted {
            self.events.push(EditorEvent::NodeDeleted(id.clone()));
        }
        Ok(deleted)
    }

    /// Lock or unlock the selected shape against clearing.
    pub fn toggle_lock(&mut self) -> SessionResult<bool> {
        let project = self
            .project_layer
            .ok_or(SessionError::MissingLayer(LAGEPLAN_SHAPES_LAYER))?;
        let node = self.selection.ok_or(SessionError::NoSelection)?;
        Ok(project.toggle_lock(&mut self.scene, node, &mut self.persister)?)
    }

    /// Highlight the shapes of the active plan.
    pub fn highlight(&mut self, on: bool) {
        if let Some(project) = self.project_layer {
            project.highlight(&mut self.scene, self.plans.active(), on);
        }
    }

    // Projection.

    pub fn set_crs(&mut self, crs: Crs) {
        log::info!("Projection {:?}", crs.srs());
        self.crs = Some(crs);
    }

    pub fn crs(&self) -> SessionResult<&Crs> {
        Ok(self.crs.as_ref().ok_or(ConfigurationError::Unconfigured)?)
    }

    /// Geographic position of a drawing point.
    pub fn svg_to_lat_lng(&self, point: Point) -> SessionResult<LatLng> {
        Ok(self.crs()?.svg_to_lat_lng(point))
    }

    /// Geographic rectangle covered by a plan.
    pub fn plan_bounds(&self, kind: PlanKind) -> SessionResult<GeoBounds> {
        Ok(self.crs()?.svg_region_to_geo(self.plans.get(kind).region()))
    }

    // Ordering and alignment.

    /// Restack the selected node within its layer.
    pub fn reorder(&mut self, order: ZOrder) -> SessionResult<bool> {
        let node = self.selection.ok_or(SessionError::NoSelection)?;
        self.detach();
        let moved = zorder::reorder(&mut self.scene, &mut self.persister, node, order)?;
        self.attach(node)?;
        Ok(moved)
    }

    /// Align the members of the multi-selection.
    pub fn align(&mut self, alignment: Alignment) -> bool {
        self.with_tool(|tool, ctx| match tool {
            Tool::Multi(multi) => {
                multi.align(ctx, alignment);
                true
            }
            _ => false,
        })
    }

    // Styling.

    /// Start a style preview on a copy of the selected node.
    pub fn clone_select(&mut self) -> SessionResult<NodeId> {
        let node = self.selection.ok_or(SessionError::NoSelection)?;
        self.detach();
        let clone = self.preview.clone_select(&mut self.scene, node)?;
        self.attach(clone)?;
        Ok(clone)
    }

    /// Style the selection. During a preview only the copy changes.
    pub fn set_element_style(&mut self, element_style: ElementStyle) -> SessionResult<()> {
        let node = self
            .preview
            .clone_node()
            .or(self.selection)
            .ok_or(SessionError::NoSelection)?;
        Ok(self
            .preview
            .set_element_style(&mut self.scene, &mut self.persister, node, element_style)?)
    }

    /// Keep the previewed style on the original.
    pub fn clone_apply(&mut self) -> SessionResult<Option<NodeId>> {
        self.detach();
        let original = self.preview.clone_apply(&mut self.scene, &mut self.persister)?;
        if let Some(node) = original {
            self.attach(node)?;
        }
        Ok(original)
    }

    /// Drop the preview and reselect the unchanged original.
    pub fn clone_delete(&mut self) -> SessionResult<Option<NodeId>> {
        self.detach();
        let original = self.preview.clone_delete(&mut self.scene);
        if let Some(node) = original {
            self.attach(node)?;
        }
        Ok(original)
    }

    /// Give the selected shape a predefined style.
    pub fn set_style_class(&mut self, class: &str) -> SessionResult<bool> {
        let node = self.selection.ok_or(SessionError::NoSelection)?;
        let plan = self.plans.active();
        Ok(style::set_style_class(&mut self.scene, &mut self.persister, node, plan, class)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemorySink, Mutation};
    use crate::plans::{Massstab, PlanConfig, PlanLayout};
    use crate::scene::NodeDescriptor;
    use std::time::Duration;

    fn object(id: &str, x: f64, y: f64) -> NodeDescriptor {
        NodeDescriptor::new("g")
            .attr("id", id)
            .attr("class", "object")
            .attr("transform", format!("matrix(1 0 0 1 {x} {y})"))
            .child(NodeDescriptor::new("rect").attr("width", "4").attr("height", "4"))
    }

    fn document() -> SceneDocument {
        SceneDocument {
            id: Some("doc-1".to_string()),
            layers: vec![
                NodeDescriptor::new("g").attr("id", "STATIC").attr("class", "layer").child(
                    NodeDescriptor::new("g")
                        .attr("id", "KNOTEN")
                        .attr("class", "category")
                        .child(object("K1", 10.0, 10.0))
                        .child(object("K2", 30.0, 30.0))
                        .child(object("K3", 60.0, 10.0)),
                ),
                NodeDescriptor::new("g").attr("id", "PROJECT0").attr("class", "layer").child(
                    NodeDescriptor::new("rect")
                        .attr("id", "1")
                        .attr("class", "shape LAGEPLAN")
                        .attr("x", "10")
                        .attr("y", "70")
                        .attr("width", "10")
                        .attr("height", "10"),
                ),
                NodeDescriptor::new("g").attr("id", "PROJECT1").attr("class", "layer"),
            ],
            defs: None,
            plans: vec![PlanConfig {
                id: PlanKind::Lageplan,
                region: "0 0 0 0".to_string(),
                layout: PlanLayout {
                    massstab: Massstab::M500,
                    ..Default::default()
                },
            }],
        }
    }

    fn session() -> (EditorSession, MemorySink) {
        let sink = MemorySink::new();
        let mut session = EditorSession::new(&document(), SessionConfig::default(), sink.clone()).unwrap();
        session.take_events();
        (session, sink)
    }

    fn find(session: &EditorSession, id: &str) -> NodeId {
        session.scene().find_by_id(id).unwrap()
    }

    fn click(session: &mut EditorSession, x: f64, y: f64, modifiers: Modifiers) {
        let point = Point::new(x, y);
        session.pointer_down(point, modifiers);
        session.pointer_up(point);
    }

    #[test]
    fn test_opens_on_static_layer() {
        let (session, _) = session();
        assert_eq!(session.id(), "doc-1");
        assert_eq!(session.tool_name(), ToolName::Object);
        assert_eq!(session.active_layer(), Some(ActiveLayer::Static));
        assert_eq!(session.plans().active(), PlanKind::Lageplan);
        assert!(session.scene().is_registered(find(&session, "K1")));
    }

    #[test]
    fn test_click_selects_and_background_deselects() {
        let (mut session, _) = session();
        let k1 = find(&session, "K1");
        click(&mut session, 12.0, 12.0, Modifiers::NONE);
        assert_eq!(session.selection(), Some(k1));
        assert!(session.handles().is_some());

        click(&mut session, 150.0, 150.0, Modifiers::NONE);
        assert_eq!(session.selection(), None);
        assert_eq!(session.take_events(), vec![
            EditorEvent::SelectionChanged(Some(k1)),
            EditorEvent::SelectionChanged(None),
        ]);
    }

    #[test]
    fn test_ctrl_click_builds_group() {
        let (mut session, _) = session();
        let (k1, k2) = (find(&session, "K1"), find(&session, "K2"));
        click(&mut session, 12.0, 12.0, Modifiers::NONE);
        click(&mut session, 32.0, 32.0, Modifiers::CTRL);
        assert!(session.is_multi());
        assert_eq!(session.multi_members(), &[k1, k2]);
        assert!(session.take_events().contains(&EditorEvent::MultiSelectChanged(true)));

        // Toggle K2 back out.
        click(&mut session, 32.0, 32.0, Modifiers::CTRL);
        assert_eq!(session.multi_members(), &[k1]);

        // A plain click elsewhere collapses back to one object.
        click(&mut session, 62.0, 12.0, Modifiers::NONE);
        assert!(!session.is_multi());
        assert_eq!(session.tool_name(), ToolName::Object);
        assert_eq!(session.selection(), Some(find(&session, "K3")));
    }

    #[test]
    fn test_ctrl_a_selects_all_objects() {
        let (mut session, _) = session();
        session.key_down(Key::Control);
        assert!(session.is_multi());
        assert!(session.key_down(Key::Char('a')));
        assert_eq!(session.multi_members().len(), 3);
        session.key_up(Key::Control);
        assert!(session.is_multi());
    }

    #[test]
    fn test_double_click_parks_object() {
        let (mut session, sink) = session();
        let k1 = find(&session, "K1");
        let now = Instant::now();
        let point = Point::new(12.0, 12.0);
        session.pointer_down_at(point, Modifiers::NONE, now);
        session.pointer_up(point);
        session.pointer_down_at(point, Modifiers::NONE, now + Duration::from_millis(100));
        session.pointer_up(point);

        assert!(session.scene().node(k1).unwrap().class.unpositioned);
        assert!(sink.mutations().iter().any(|m| matches!(
            m,
            Mutation::UpdateAttribute { name, value, .. } if name == "class" && value.contains("unpositioned")
        )));
    }

    #[test]
    fn test_arrow_nudge_persists() {
        let (mut session, sink) = session();
        let k1 = find(&session, "K1");
        session.attach(k1).unwrap();
        assert!(session.key_down(Key::ArrowRight));
        let translation = crate::transform::translation(session.scene().get_transform(k1));
        assert!((translation.x - 10.1).abs() < 1e-9);
        assert!(!sink.mutations().is_empty());
    }

    #[test]
    fn test_project_layer_uses_edit_tool() {
        let (mut session, _) = session();
        session.activate_project_layer().unwrap();
        assert_eq!(session.tool_name(), ToolName::Edit);
        assert!(!session.scene().is_registered(find(&session, "K1")));

        click(&mut session, 15.0, 75.0, Modifiers::NONE);
        assert_eq!(session.selection(), Some(find(&session, "1")));
        assert!(session.toggle_lock().unwrap());
        assert!(session.clear_plan().unwrap().is_empty());
    }

    #[test]
    fn test_rect_tool_creates_shape() {
        let (mut session, sink) = session();
        session.activate_project_layer().unwrap();
        session.set_tool(ToolName::Rect);
        session.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
        session.pointer_move(Point::new(120.0, 110.0));
        session.pointer_up(Point::new(120.0, 110.0));

        let events = session.take_events();
        assert!(events.iter().any(|e| matches!(e, EditorEvent::NodeCreated(_))));
        assert!(sink.mutations().iter().any(|m| matches!(
            m,
            Mutation::CreateNode { parent_id, .. } if parent_id == "PROJECT0"
        )));
    }

    #[test]
    fn test_set_plan_emits_event() {
        let (mut session, _) = session();
        session.set_plan(PlanKind::Ampelplan);
        assert_eq!(session.plans().active(), PlanKind::Ampelplan);
        assert_eq!(session.viewer().plan(), Some(PlanKind::Ampelplan));
        assert!(session.take_events().contains(&EditorEvent::PlanChanged(PlanKind::Ampelplan)));
    }

    #[test]
    fn test_projection_requires_crs() {
        let (session, _) = session();
        assert!(matches!(
            session.svg_to_lat_lng(Point::ZERO),
            Err(SessionError::Configuration(ConfigurationError::Unconfigured))
        ));
    }

    #[test]
    fn test_persistence_failure_is_reported() {
        let (mut session, sink) = session();
        sink.set_failing(true);
        session.move_plan(PlanKind::Lageplan, Vec2::new(5.0, -3.0)).unwrap();
        let k1 = find(&session, "K1");
        let translation = crate::transform::translation(session.scene().get_transform(k1));
        assert!((translation.x - 5.0).abs() < 1e-9);
        assert!(session
            .take_events()
            .iter()
            .any(|e| matches!(e, EditorEvent::PersistenceFailed(_))));
    }

    #[test]
    fn test_reorder_keeps_selection() {
        let (mut session, sink) = session();
        let k1 = find(&session, "K1");
        session.attach(k1).unwrap();
        assert!(session.reorder(ZOrder::Front).unwrap());
        assert_eq!(session.selection(), Some(k1));
        assert!(matches!(sink.mutations().last(), Some(Mutation::Reorder { next_id: None, .. })));
    }

    #[test]
    fn test_style_preview_round_trip() {
        let (mut session, sink) = session();
        session.activate_project_layer().unwrap();
        let shape = find(&session, "1");
        session.attach(shape).unwrap();
        let clone = session.clone_select().unwrap();
        assert_eq!(session.selection(), Some(clone));
        session
            .set_element_style(ElementStyle {
                fill: Some("#ff0000".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(sink.mutations().is_empty());

        assert_eq!(session.clone_apply().unwrap(), Some(shape));
        assert_eq!(session.selection(), Some(shape));
        assert_eq!(session.scene().attr_value(shape, "fill").as_deref(), Some("#ff0000"));
        assert!(!sink.mutations().is_empty());
    }

    #[test]
    fn test_document_snapshot_keeps_plans() {
        let (mut session, _) = session();
        session.move_plan(PlanKind::Lageplan, Vec2::new(5.0, -3.0)).unwrap();
        let document = session.to_document().unwrap();
        assert_eq!(document.id.as_deref(), Some("doc-1"));
        assert_eq!(document.layers.len(), 3);
        assert!(document.plans[0].region.starts_with("5 -3"));
    }
}
