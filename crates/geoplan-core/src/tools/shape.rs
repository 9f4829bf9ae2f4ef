//! Drag-to-create rectangles, circles, ellipses and text.

use super::{ToolContext, ToolName};
use crate::scene::{NodeDescriptor, NodeId};
use kurbo::{Affine, Point, Vec2};

/// Smallest extent of a drawn shape.
const MIN_EXTENT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Circle,
    Ellipse,
    Text,
}

impl ShapeKind {
    pub fn tool_name(self) -> ToolName {
        match self {
            ShapeKind::Rect => ToolName::Rect,
            ShapeKind::Circle => ToolName::Circle,
            ShapeKind::Ellipse => ToolName::Ellipse,
            ShapeKind::Text => ToolName::Text,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Circle => "circle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Drawing {
    node: NodeId,
    /// Press point in layer space.
    start: Point,
}

/// Creates one shape per press-drag-release.
#[derive(Debug)]
pub struct ShapeTool {
    kind: ShapeKind,
    drawing: Option<Drawing>,
}

impl ShapeTool {
    pub fn new(kind: ShapeKind) -> Self {
        Self { kind, drawing: None }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        if self.drawing.is_some() {
            return false;
        }
        let Some((layer, start)) = ctx.layer_point(point) else {
            log::warn!("No layer to draw a {} into", self.kind.tag());
            return false;
        };
        let mut descriptor = NodeDescriptor::new(self.kind.tag());
        if self.kind == ShapeKind::Text {
            descriptor = descriptor
                .attr("x", "0")
                .attr("y", "0")
                .attr("xml:space", "preserve")
                .text(ctx.options.text.clone());
        }
        let node = match ctx.add_transient(Some(layer), &descriptor) {
            Ok(node) => node,
            Err(err) => {
                log::warn!("Cannot start {}: {err}", self.kind.tag());
                return false;
            }
        };
        if let Err(err) = ctx.scene.set_transform(node, Affine::translate(start.to_vec2())) {
            log::warn!("Cannot place {}: {err}", self.kind.tag());
        }
        self.drawing = Some(Drawing { node, start });
        true
    }

    pub fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        let Some(drawing) = self.drawing else {
            return false;
        };
        if self.kind == ShapeKind::Text {
            return true;
        }
        let Some((_, current)) = ctx.layer_point(point) else {
            return false;
        };
        let d = current - drawing.start;
        let center = drawing.start + d / 2.0;
        let node = drawing.node;
        let scene = &mut *ctx.scene;
        if let Err(err) = scene.set_transform(node, Affine::translate(center.to_vec2())) {
            log::warn!("Cannot move {}: {err}", self.kind.tag());
            return false;
        }
        let result = match self.kind {
            ShapeKind::Rect => {
                let size = Vec2::new(d.x.abs().max(MIN_EXTENT), d.y.abs().max(MIN_EXTENT));
                scene
                    .set_attr_f64(node, "width", size.x)
                    .and_then(|_| scene.set_attr_f64(node, "height", size.y))
                    .and_then(|_| scene.set_attr_f64(node, "x", -size.x / 2.0))
                    .and_then(|_| scene.set_attr_f64(node, "y", -size.y / 2.0))
            }
            ShapeKind::Circle => {
                let r = (d.x.abs().min(d.y.abs()) / 2.0).max(MIN_EXTENT);
                scene.set_attr_f64(node, "r", r)
            }
            ShapeKind::Ellipse => scene
                .set_attr_f64(node, "rx", (d.x.abs() / 2.0).max(MIN_EXTENT))
                .and_then(|_| scene.set_attr_f64(node, "ry", (d.y.abs() / 2.0).max(MIN_EXTENT))),
            ShapeKind::Text => Ok(()),
        };
        result.is_ok()
    }

    pub fn pointer_up(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let Some(drawing) = self.drawing.take() else {
            return false;
        };
        if self.kind == ShapeKind::Text && ctx.options.text.trim().is_empty() {
            log::warn!("Not placing empty text");
            let _ = ctx.scene.remove(drawing.node);
            return true;
        }
        if let Err(err) = ctx.commit_shape(drawing.node, self.kind.tool_name()) {
            log::error!("Cannot commit {}: {err}", self.kind.tag());
        }
        true
    }

    /// Drop the shape being drawn.
    pub fn cancel(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(drawing) = self.drawing.take() {
            let _ = ctx.scene.remove(drawing.node);
        }
    }
}
