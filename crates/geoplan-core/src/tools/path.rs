//! Click-by-click splines and freehand strokes.

use super::{ToolContext, ToolName};
use crate::scene::{NodeDescriptor, NodeId};
use crate::transform::untransform_point;
use crate::widget::{Segment, SplinePath};
use kurbo::{Affine, Point};
use std::fmt::Write as _;

#[derive(Debug)]
struct Spline {
    node: NodeId,
    /// Marker at the start point; clicking inside it closes the path.
    marker: NodeId,
    path: SplinePath,
    closed: bool,
}

/// Builds a smooth spline one click at a time.
///
/// The last segment follows the pointer and is dropped when the path is
/// finished, so Escape keeps exactly the clicked points.
#[derive(Debug, Default)]
pub struct PathTool {
    spline: Option<Spline>,
}

impl PathTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.spline.is_some()
    }

    fn write(ctx: &mut ToolContext<'_>, spline: &Spline) -> bool {
        ctx.scene.set_attr(spline.node, "d", &spline.path.to_d()).is_ok()
    }

    fn start(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        let Some((layer, origin)) = ctx.layer_point(point) else {
            log::warn!("No layer to draw a path into");
            return false;
        };
        let mut path = SplinePath::new();
        path.push(Segment::new(Point::ZERO, Point::ZERO));
        let placed = Affine::translate(origin.to_vec2());

        let node = ctx.add_transient(Some(layer), &NodeDescriptor::new("path").attr("d", path.to_d()));
        let radius = ctx.config.close_tolerance * ctx.scale;
        let marker = ctx.add_transient(
            Some(layer),
            &NodeDescriptor::new("circle")
                .attr("class", "path-start")
                .attr("r", radius.to_string()),
        );
        match (node, marker) {
            (Ok(node), Ok(marker)) => {
                for id in [node, marker] {
                    if let Err(err) = ctx.scene.set_transform(id, placed) {
                        log::warn!("Cannot place path start: {err}");
                    }
                }
                self.spline = Some(Spline {
                    node,
                    marker,
                    path,
                    closed: false,
                });
                true
            }
            (node, marker) => {
                for id in [node, marker].into_iter().flatten() {
                    let _ = ctx.scene.remove(id);
                }
                log::warn!("Cannot start path");
                false
            }
        }
    }

    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        let Some(spline) = self.spline.as_mut() else {
            return self.start(ctx, point);
        };
        let local = untransform_point(ctx.scene.world_transform(spline.node), point);
        if local.to_vec2().hypot() < ctx.config.close_tolerance * ctx.scale {
            spline.closed = true;
            if let Some(last) = spline.path.last_mut() {
                *last = Segment::new(Point::ZERO, Point::ZERO);
            }
        }
        spline.path.push(Segment::new(local, local));
        Self::write(ctx, spline)
    }

    pub fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        let Some(spline) = self.spline.as_mut() else {
            return false;
        };
        let local = untransform_point(ctx.scene.world_transform(spline.node), point);
        if let Some(last) = spline.path.last_mut() {
            *last = Segment::new(local, local);
        }
        Self::write(ctx, spline)
    }

    /// Clicking the start marker closes and finishes the path.
    pub fn pointer_up(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        match &self.spline {
            Some(spline) if spline.closed => {
                self.finish(ctx);
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Drop the trailing segment and commit what is left.
    pub fn finish(&mut self, ctx: &mut ToolContext<'_>) {
        let Some(mut spline) = self.spline.take() else {
            return;
        };
        let _ = ctx.scene.remove(spline.marker);
        spline.path.pop();
        if spline.path.is_empty() {
            let _ = ctx.scene.remove(spline.node);
            return;
        }
        Self::write(ctx, &spline);
        if let Err(err) = ctx.commit_shape(spline.node, ToolName::Path) {
            log::error!("Cannot commit path: {err}");
        }
    }
}

#[derive(Debug)]
struct Stroke {
    node: NodeId,
    d: String,
    points: usize,
}

/// Freehand polyline, one press-drag-release per stroke.
#[derive(Debug, Default)]
pub struct DrawTool {
    stroke: Option<Stroke>,
}

impl DrawTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        if self.stroke.is_some() {
            return false;
        }
        let Some((layer, origin)) = ctx.layer_point(point) else {
            return false;
        };
        let d = String::from("M 0 0");
        match ctx.add_transient(Some(layer), &NodeDescriptor::new("path").attr("d", d.clone())) {
            Ok(node) => {
                if let Err(err) = ctx.scene.set_transform(node, Affine::translate(origin.to_vec2())) {
                    log::warn!("Cannot place stroke: {err}");
                }
                self.stroke = Some(Stroke { node, d, points: 1 });
                true
            }
            Err(err) => {
                log::warn!("Cannot start stroke: {err}");
                false
            }
        }
    }

    pub fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        let Some(stroke) = self.stroke.as_mut() else {
            return false;
        };
        let local = untransform_point(ctx.scene.world_transform(stroke.node), point);
        let _ = write!(stroke.d, " L {} {}", local.x, local.y);
        stroke.points += 1;
        ctx.scene.set_attr(stroke.node, "d", &stroke.d).is_ok()
    }

    pub fn pointer_up(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let drawing = self.stroke.is_some();
        self.finish(ctx);
        drawing
    }

    /// Commit the stroke; a bare press leaves nothing behind.
    pub fn finish(&mut self, ctx: &mut ToolContext<'_>) {
        let Some(stroke) = self.stroke.take() else {
            return;
        };
        if stroke.points < 2 {
            let _ = ctx.scene.remove(stroke.node);
            return;
        }
        if let Err(err) = ctx.commit_shape(stroke.node, ToolName::Draw) {
            log::error!("Cannot commit stroke: {err}");
        }
    }
}
