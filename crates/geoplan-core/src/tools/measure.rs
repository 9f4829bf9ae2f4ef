//! Distance measurement.
//!
//! The ruler is an editor-only group: a line from the press point and a
//! label with the length in metres. It stays on the plan until the next
//! measurement starts or the plan's rulers are cleared.

use super::ToolContext;
use crate::scene::{NodeDescriptor, NodeId, SceneError, SceneResult};
use crate::transform::untransform_point;
use kurbo::{Affine, Point};

const LABEL_SIZE: f64 = 12.0;

#[derive(Debug, Clone, Copy)]
struct Ruler {
    group: NodeId,
    line: NodeId,
    label: NodeId,
    length: f64,
}

#[derive(Debug, Default)]
pub struct MeasureTool {
    ruler: Option<Ruler>,
    dragging: bool,
}

impl MeasureTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the current ruler.
    pub fn distance(&self) -> Option<f64> {
        self.ruler.map(|ruler| ruler.length)
    }

    pub fn ruler(&self) -> Option<NodeId> {
        self.ruler.map(|ruler| ruler.group)
    }

    pub fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        self.discard(ctx);
        let Some((layer, origin)) = ctx.layer_point(point) else {
            return false;
        };
        match create(ctx, layer, origin) {
            Ok(ruler) => {
                self.ruler = Some(ruler);
                self.dragging = true;
                true
            }
            Err(err) => {
                log::warn!("Cannot start measuring: {err}");
                false
            }
        }
    }

    pub fn pointer_move(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        if !self.dragging {
            return false;
        }
        let Some(ruler) = self.ruler.as_mut() else {
            return false;
        };
        let end = untransform_point(ctx.scene.world_transform(ruler.group), point);
        ruler.length = end.to_vec2().hypot();
        let label = format!("{:.2} m", ruler.length);
        let updated = ctx
            .scene
            .set_attr_f64(ruler.line, "x2", end.x)
            .and_then(|_| ctx.scene.set_attr_f64(ruler.line, "y2", end.y))
            .and_then(|_| ctx.scene.set_transform(ruler.label, Affine::translate(end.to_vec2())))
            .and_then(|_| {
                ctx.scene.get_mut(ruler.label)?.text = Some(label);
                Ok(())
            });
        updated.is_ok()
    }

    pub fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, point: Point) -> bool {
        if !self.dragging {
            return false;
        }
        self.pointer_move(ctx, point);
        self.finish(ctx);
        true
    }

    /// Stop measuring; a ruler too short to read is removed.
    pub fn finish(&mut self, ctx: &mut ToolContext<'_>) {
        self.dragging = false;
        if self
            .ruler
            .is_some_and(|ruler| ruler.length < ctx.config.min_measure_length)
        {
            self.discard(ctx);
        }
    }

    fn discard(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(ruler) = self.ruler.take() {
            if ctx.scene.contains(ruler.group) {
                let _ = ctx.scene.remove(ruler.group);
            }
        }
        self.dragging = false;
    }
}

fn create(ctx: &mut ToolContext<'_>, layer: NodeId, origin: Point) -> SceneResult<Ruler> {
    let descriptor = NodeDescriptor::new("g")
        .attr("class", "ruler-line")
        .child(
            NodeDescriptor::new("line")
                .attr("x1", "0")
                .attr("y1", "0")
                .attr("x2", "0")
                .attr("y2", "0")
                .attr("stroke-width", ctx.scale.to_string()),
        )
        .child(
            NodeDescriptor::new("text")
                .attr("class", "ruler-text")
                .attr("font-size", (LABEL_SIZE * ctx.scale).to_string()),
        );
    let group = ctx.add_transient(Some(layer), &descriptor)?;
    ctx.scene.set_transform(group, Affine::translate(origin.to_vec2()))?;
    let (line, label) = match ctx.scene.children(group) {
        &[line, label] => (line, label),
        _ => return Err(SceneError::Structure("ruler without line and label".into())),
    };
    Ok(Ruler {
        group,
        line,
        label,
        length: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeRole;
    use crate::tools::test_support::Harness;

    #[test]
    fn test_measure_distance_label() {
        let mut harness = Harness::new();
        let mut tool = MeasureTool::new();
        assert!(tool.pointer_down(&mut harness.ctx(), Point::new(10.0, 10.0)));
        assert!(tool.pointer_up(&mut harness.ctx(), Point::new(13.0, 14.0)));

        assert!((tool.distance().unwrap() - 5.0).abs() < 1e-12);
        let group = tool.ruler().unwrap();
        assert_eq!(harness.scene.node(group).unwrap().class.role, NodeRole::Ruler);
        let label = harness.scene.children(group)[1];
        assert_eq!(harness.scene.node(label).unwrap().text.as_deref(), Some("5.00 m"));
        assert_eq!(harness.scene.attr_f64(harness.scene.children(group)[0], "x2"), Some(3.0));
        // Rulers are never persisted.
        assert!(harness.sink.mutations().is_empty());
    }

    #[test]
    fn test_short_ruler_is_removed() {
        let mut harness = Harness::new();
        let mut tool = MeasureTool::new();
        tool.pointer_down(&mut harness.ctx(), Point::new(10.0, 10.0));
        let group = tool.ruler().unwrap();
        tool.pointer_up(&mut harness.ctx(), Point::new(10.2, 10.2));
        assert!(!harness.scene.contains(group));
        assert_eq!(tool.ruler(), None);
    }

    #[test]
    fn test_new_measurement_replaces_ruler() {
        let mut harness = Harness::new();
        let mut tool = MeasureTool::new();
        tool.pointer_down(&mut harness.ctx(), Point::new(0.0, 0.0));
        tool.pointer_up(&mut harness.ctx(), Point::new(10.0, 0.0));
        let first = tool.ruler().unwrap();
        tool.pointer_down(&mut harness.ctx(), Point::new(0.0, 5.0));
        assert!(!harness.scene.contains(first));
        assert_eq!(harness.scene.children(harness.layer).len(), 1);
    }
}
