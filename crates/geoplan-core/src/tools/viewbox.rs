//! Picks the print frame stored on a project layer as `data-viewbox`.

use super::ToolContext;
use crate::persistence::Mutation;
use crate::scene::{NodeDescriptor, NodeId};
use kurbo::{Point, Rect};

const ATTRIBUTE: &str = "data-viewbox";
const MIN_EXTENT: f64 = 1.0;

/// Parse `"x y w h"`.
pub fn parse_viewbox(value: &str) -> Option<Rect> {
    let numbers: Vec<f64> = value
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        &[x, y, w, h] => Some(Rect::new(x, y, x + w, y + h)),
        _ => None,
    }
}

pub fn format_viewbox(rect: Rect) -> String {
    format!("{} {} {} {}", rect.x0, rect.y0, rect.width(), rect.height())
}

/// Rubber band drawn in layer space; the outline stays visible while the
/// tool is active.
#[derive(Debug, Default)]
pub struct ViewboxTool {
    outline: Option<NodeId>,
    start: Option<Point>,
}

impl ViewboxTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outline(&self) -> Option<NodeId> {
        self.outline
    }

    /// Outline the frame the layer already has.
    pub fn show(&mut self, ctx: &mut ToolContext<'_>) {
        let Some(layer) = ctx.layer else {
            return;
        };
        let current = ctx.scene.attr_value(layer, ATTRIBUTE).and_then(|value| parse_viewbox(&value));
        if let Some(rect) = current {
            self.draw(ctx, rect);
        }
    }

    fn draw(&mut self, ctx: &mut ToolContext<'_>, rect: Rect) {
        let Some(layer) = ctx.layer else {
            return;
        };
        let outline = match self.outline.filter(|&id| ctx.scene.contains(id)) {
            Some(outline) => outline,
            None => {
                let descriptor = NodeDescriptor::new("rect").attr("class", "select-outline");
                match ctx.add_transient(Some(layer), &descriptor) {
                    Ok(outline) => outline,
                    Err(err) => {
                        log::warn!("Cannot draw viewbox outline: {err}");
                        return;
                    }
                }
            }
        };
        self.outline = Some(outline);
        if let Some(node) = ctx.scene.node_mut(outline) {
            node.set_attr_f64("x", rect.x0);
            node.set_attr_f64("y", rect.y0);
            node.set_attr_f64("width", rect.width().max(MIN_EXTENT));
            node.set_attr_f64("height", rect.height().max(MIN_EXTENT));
            node.set_attr_f64("stroke-width", ctx.scale);
        }
    }

    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        let Some((_, start)) = ctx.layer_point(point) else {
            return false;
        };
        self.start = Some(start);
        self.draw(ctx, Rect::from_origin_size(start, (MIN_EXTENT, MIN_EXTENT)));
        true
    }

    pub fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        let (Some(start), Some((_, current))) = (self.start, ctx.layer_point(point)) else {
            return false;
        };
        self.draw(ctx, Rect::from_points(start, current));
        true
    }

    /// Store the outlined frame on the layer.
    pub fn pointer_up(&mut self, ctx: &mut ToolContext<'_>) -> bool {
        let (Some(_), Some(layer), Some(outline)) = (self.start.take(), ctx.layer, self.outline) else {
            return false;
        };
        let Some(rect) = ctx.scene.local_bbox(outline) else {
            return false;
        };
        let value = format_viewbox(rect);
        if let Err(err) = ctx.scene.set_attr(layer, ATTRIBUTE, &value) {
            log::warn!("Cannot store viewbox: {err}");
            return false;
        }
        log::info!("Viewbox of {} set to {value}", ctx.scene.external_id(layer));
        ctx.persister.persist(Mutation::UpdateAttribute {
            node_id: ctx.scene.external_id(layer),
            node_kind: "layer".to_string(),
            name: ATTRIBUTE.to_string(),
            value,
        });
        true
    }

    /// Remove the outline.
    pub fn cancel(&mut self, ctx: &mut ToolContext<'_>) {
        self.start = None;
        if let Some(outline) = self.outline.take() {
            if ctx.scene.contains(outline) {
                let _ = ctx.scene.remove(outline);
            }
        }
    }
}
