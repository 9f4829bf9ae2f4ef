//! Manipulation widgets.
//!
//! A widget owns a few [`Handle`]s inside a [`HandleContainer`] and turns
//! drags on them into attribute changes of its target node:
//! - translate moves the node in its parent's space
//! - rotate turns the node around its origin
//! - scale resizes rect, circle and ellipse geometry
//! - path moves the control points of a spline
//!
//! Widgets never keep a copy of the node; they read and write the scene.

mod handles;
mod path;
mod rotate;
mod scale;
mod translate;

pub use handles::{Handle, HandleKind, HandleShape};
pub use path::{PathWidget, Segment, SplinePath};
pub use rotate::{RotatePlacement, RotateWidget};
pub use scale::ScaleWidget;
pub use translate::{TranslateArea, TranslateWidget};

use crate::persistence::Persister;
use crate::scene::{NodeId, SceneGraph};
use crate::transform::untransform_point;
use kurbo::{Affine, Point, Rect, Vec2};
use std::fmt;

/// Which widget a handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Translate,
    Rotate,
    Scale,
    Path,
}

/// Common interface of the manipulation widgets.
pub trait Widget: fmt::Debug {
    fn kind(&self) -> WidgetKind;

    /// Place the handles for `target`, whose local box is `bbox`.
    fn attach(&mut self, scene: &SceneGraph, target: NodeId, container: &mut HandleContainer, bbox: Rect);

    /// Remove this widget's handles.
    fn detach(&mut self, container: &mut HandleContainer) {
        container.remove_widget(self.kind());
    }

    /// Resize handles for a new view zoom.
    fn scale(&mut self, container: &mut HandleContainer, scale: f64);

    /// Start dragging `handle`. `pointer` is in document space.
    fn begin(&mut self, scene: &SceneGraph, handle: &Handle, pointer: Point) -> bool;

    fn drag(&mut self, scene: &mut SceneGraph, container: &mut HandleContainer, pointer: Point) -> bool;

    /// Finish the drag and persist what changed.
    fn end(&mut self, scene: &mut SceneGraph, persister: &mut Persister);

    fn is_dragging(&self) -> bool;
}

/// Transient handles drawn on top of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleContainer {
    owner: Option<NodeId>,
    handles: Vec<Handle>,
    stroke_width: f64,
}

impl Default for HandleContainer {
    fn default() -> Self {
        Self {
            owner: None,
            handles: Vec::new(),
            stroke_width: 1.0,
        }
    }
}

impl HandleContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node whose coordinate space the handle positions are in.
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: Option<NodeId>) {
        self.owner = owner;
    }

    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn push(&mut self, handle: Handle) {
        self.handles.push(handle);
    }

    pub fn remove_widget(&mut self, widget: WidgetKind) {
        self.handles.retain(|handle| handle.widget != widget);
    }

    pub fn clear(&mut self) {
        self.handles.clear();
        self.owner = None;
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.stroke_width = width;
    }

    /// Topmost handle under a document-space point.
    pub fn hit(&self, scene: &SceneGraph, point: Point) -> Option<&Handle> {
        let owner = self.owner?;
        let local = untransform_point(scene.world_transform(owner), point);
        self.handles.iter().rev().find(|handle| handle.hit_test(local))
    }
}

/// A node with its widgets attached.
///
/// Only one widget drags at a time; the others give up their handles until
/// the drag ends and everything is laid out again around the new box.
#[derive(Debug, Default)]
pub struct WidgetSet {
    target: Option<NodeId>,
    container: HandleContainer,
    widgets: Vec<Box<dyn Widget>>,
    active: Option<usize>,
    /// Transform as last written to persistence.
    persisted: Affine,
    scale: f64,
}

impl WidgetSet {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            persisted: Affine::IDENTITY,
            ..Default::default()
        }
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn container(&self) -> &HandleContainer {
        &self.container
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Attach `widgets` to `target`, replacing any previous attachment.
    pub fn attach(&mut self, scene: &SceneGraph, target: NodeId, widgets: Vec<Box<dyn Widget>>) {
        self.container.clear();
        self.container.set_owner(Some(target));
        self.container.set_stroke_width(self.scale);
        self.target = Some(target);
        self.widgets = widgets;
        self.active = None;
        self.persisted = scene.get_transform(target);
        self.layout(scene);
    }

    fn layout(&mut self, scene: &SceneGraph) {
        let Some(target) = self.target else {
            return;
        };
        let bbox = scene.local_bbox(target).unwrap_or_else(|| {
            log::warn!("No bounding box for {target}, using an empty one");
            Rect::ZERO
        });
        for widget in &mut self.widgets {
            widget.scale(&mut self.container, self.scale);
            widget.attach(scene, target, &mut self.container, bbox);
        }
    }

    /// Detach everything. The transform is persisted if it changed since
    /// it was last persisted.
    pub fn detach(&mut self, scene: &mut SceneGraph, persister: &mut Persister) -> Option<NodeId> {
        let target = self.target.take()?;
        if let Some(index) = self.active.take() {
            self.widgets[index].end(scene, persister);
        }
        for widget in &mut self.widgets {
            widget.detach(&mut self.container);
        }
        self.widgets.clear();
        self.container.clear();
        if scene.contains(target) && scene.get_transform(target) != self.persisted {
            persister.transform(scene, target);
        }
        Some(target)
    }

    /// Drop the attachment without persisting, e.g. after the node was deleted.
    pub fn forget(&mut self) -> Option<NodeId> {
        self.widgets.clear();
        self.container.clear();
        self.active = None;
        self.target.take()
    }

    /// Lay the handles out again around the current box.
    pub fn refresh(&mut self, scene: &SceneGraph) {
        for widget in &mut self.widgets {
            widget.detach(&mut self.container);
        }
        self.layout(scene);
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
        self.container.set_stroke_width(scale);
        for widget in &mut self.widgets {
            widget.scale(&mut self.container, scale);
        }
    }

    /// Start dragging the handle under `pointer`, if any.
    pub fn begin(&mut self, scene: &SceneGraph, pointer: Point) -> bool {
        let Some(handle) = self.container.hit(scene, pointer).cloned() else {
            return false;
        };
        let Some(index) = self.widgets.iter().position(|w| w.kind() == handle.widget) else {
            return false;
        };
        if !self.widgets[index].begin(scene, &handle, pointer) {
            return false;
        }
        for (i, widget) in self.widgets.iter_mut().enumerate() {
            if i != index {
                widget.detach(&mut self.container);
            }
        }
        self.active = Some(index);
        true
    }

    pub fn drag(&mut self, scene: &mut SceneGraph, pointer: Point) -> bool {
        match self.active {
            Some(index) => self.widgets[index].drag(scene, &mut self.container, pointer),
            None => false,
        }
    }

    pub fn end(&mut self, scene: &mut SceneGraph, persister: &mut Persister) -> bool {
        let Some(index) = self.active.take() else {
            return false;
        };
        self.widgets[index].end(scene, persister);
        if let Some(target) = self.target {
            self.persisted = scene.get_transform(target);
        }
        self.refresh(scene);
        true
    }

    /// Move the target by `delta` in its parent's space and persist.
    pub fn nudge(&mut self, scene: &mut SceneGraph, persister: &mut Persister, delta: Vec2) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        if self.active.is_some() {
            return false;
        }
        if TranslateWidget::nudge(scene, persister, target, delta).is_err() {
            return false;
        }
        self.persisted = scene.get_transform(target);
        true
    }
}
