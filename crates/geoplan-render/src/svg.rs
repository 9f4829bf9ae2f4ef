//! SVG string output.
//!
//! The scene is written in document order exactly as it is modeled: stored
//! attributes first, then the class and the canonical `matrix(...)`
//! transform. Hidden subtrees are left out. Handles come last so they draw
//! on top.

use crate::renderer::{RenderContext, RenderResult, Renderer, css_color};
use geoplan_core::scene::{NodeContent, NodeId, SceneGraph};
use geoplan_core::transform::format_transform;
use geoplan_core::widget::{Handle, HandleContainer, HandleShape};
use kurbo::{Affine, Rect};
use std::fmt::Write;

/// Renders a scene to a standalone SVG document.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    elements: usize,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements written by the last frame, handles excluded.
    pub fn element_count(&self) -> usize {
        self.elements
    }

    fn write_node(&mut self, scene: &SceneGraph, id: NodeId, out: &mut String) -> RenderResult<()> {
        let node = scene.get(id)?;
        let tag = match &node.content {
            NodeContent::Element(tag) => tag,
            NodeContent::Text(text) => {
                out.push_str(&escape(text));
                return Ok(());
            }
            NodeContent::Comment(_) => return Ok(()),
        };
        if !node.visible {
            return Ok(());
        }
        self.elements += 1;

        let name = tag.as_str();
        write!(out, "<{name}")?;
        for (attribute, value) in &node.attributes {
            write!(out, " {attribute}=\"{}\"", escape(value))?;
        }
        if !node.class.is_empty() {
            write!(out, " class=\"{}\"", escape(&node.class.to_string()))?;
        }
        if let Some(transform) = node.transform {
            write!(out, " transform=\"{}\"", format_transform(transform))?;
        }

        if node.text.is_none() && node.children.is_empty() {
            out.push_str("/>");
            return Ok(());
        }
        out.push('>');
        if let Some(text) = &node.text {
            out.push_str(&escape(text));
        }
        for &child in &node.children {
            self.write_node(scene, child, out)?;
        }
        write!(out, "</{name}>")?;
        Ok(())
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<String> {
        self.elements = 0;
        let mut out = String::from("<svg xmlns=\"http://www.w3.org/2000/svg\"");
        let viewbox = ctx.viewbox.or_else(|| scene_bounds(ctx.scene));
        if let Some(viewbox) = viewbox {
            write!(
                out,
                " viewBox=\"{} {} {} {}\"",
                viewbox.x0,
                viewbox.y0,
                viewbox.width(),
                viewbox.height()
            )?;
        }
        if let Some(size) = ctx.viewport_size {
            write!(out, " width=\"{}\" height=\"{}\"", size.width, size.height)?;
        }
        out.push('>');

        if let (Some(color), Some(viewbox)) = (ctx.background_color, viewbox) {
            write!(
                out,
                "<rect class=\"background\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
                viewbox.x0,
                viewbox.y0,
                viewbox.width(),
                viewbox.height(),
                css_color(color)
            )?;
        }

        for &root in ctx.scene.roots() {
            self.write_node(ctx.scene, root, &mut out)?;
        }

        if let Some(handles) = ctx.handles.filter(|handles| !handles.is_empty()) {
            write_handles(&mut out, ctx.scene, handles, &css_color(ctx.selection_color))?;
        }
        out.push_str("</svg>");
        log::trace!("Rendered {} elements", self.elements);
        Ok(out)
    }
}

/// Union of the visible layers.
fn scene_bounds(scene: &SceneGraph) -> Option<Rect> {
    scene
        .roots()
        .iter()
        .filter(|&&root| scene.is_visible(root))
        .filter_map(|&root| scene.world_bbox(root))
        .reduce(|a, b| a.union(b))
}

fn write_handles(out: &mut String, scene: &SceneGraph, handles: &HandleContainer, color: &str) -> RenderResult<()> {
    let transform = handles
        .owner()
        .map(|owner| scene.world_transform(owner))
        .unwrap_or(Affine::IDENTITY);
    write!(
        out,
        "<g class=\"handles\" transform=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{}\">",
        format_transform(transform),
        handles.stroke_width()
    )?;
    for handle in handles.handles() {
        write_handle(out, handle)?;
    }
    out.push_str("</g>");
    Ok(())
}

fn write_handle(out: &mut String, handle: &Handle) -> RenderResult<()> {
    let (x, y, r) = (handle.position.x, handle.position.y, handle.radius);
    if let Some(anchor) = handle.anchor {
        write!(
            out,
            "<line class=\"handle-anchor\" x1=\"{}\" y1=\"{}\" x2=\"{x}\" y2=\"{y}\"/>",
            anchor.x, anchor.y
        )?;
    }
    match handle.shape {
        // Drag areas have no visual.
        HandleShape::Area => {}
        HandleShape::Circle => write!(out, "<circle class=\"handle\" cx=\"{x}\" cy=\"{y}\" r=\"{r}\"/>")?,
        HandleShape::Square => write!(
            out,
            "<rect class=\"handle\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/>",
            x - r,
            y - r,
            2.0 * r,
            2.0 * r
        )?,
        HandleShape::Diamond => write!(
            out,
            "<polygon class=\"handle\" points=\"{x},{} {},{y} {x},{} {},{y}\"/>",
            y - r,
            x + r,
            y + r,
            x - r
        )?,
    }
    Ok(())
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoplan_core::scene::NodeDescriptor;
    use geoplan_core::widget::{HandleKind, WidgetKind};
    use kurbo::Point;

    fn scene() -> SceneGraph {
        let mut scene = SceneGraph::new();
        scene
            .add_node(
                None,
                &NodeDescriptor::new("g")
                    .attr("id", "PROJECT0")
                    .attr("class", "layer")
                    .child(
                        NodeDescriptor::new("rect")
                            .attr("id", "1")
                            .attr("width", "10")
                            .attr("height", "5")
                            .attr("class", "shape LAGEPLAN")
                            .attr("transform", "matrix(1,0,0,1,10,10)"),
                    )
                    .child(NodeDescriptor::new("circle").attr("id", "2").attr("r", "3"))
                    .child(NodeDescriptor::new("text").attr("id", "3").text("A & B")),
            )
            .unwrap();
        scene
    }

    #[test]
    fn test_document_order_and_canonical_transform() {
        let scene = scene();
        let mut renderer = SvgRenderer::new();
        let svg = renderer.render(&RenderContext::new(&scene)).unwrap();

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.contains(
            "<rect id=\"1\" width=\"10\" height=\"5\" class=\"shape LAGEPLAN\" transform=\"matrix(1 0 0 1 10 10)\"/>"
        ));
        assert!(svg.contains("<text id=\"3\">A &amp; B</text>"));
        let rect = svg.find("<rect id=\"1\"").unwrap();
        let circle = svg.find("<circle id=\"2\"").unwrap();
        assert!(rect < circle);
        assert!(svg.ends_with("</g></svg>"));
        assert_eq!(renderer.element_count(), 4);
    }

    #[test]
    fn test_hidden_nodes_are_skipped() {
        let mut scene = scene();
        let circle = scene.find_by_id("2").unwrap();
        scene.set_visible(circle, false);
        let svg = SvgRenderer::new().render(&RenderContext::new(&scene)).unwrap();
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn test_handles_drawn_last() {
        let scene = scene();
        let rect = scene.find_by_id("1").unwrap();
        let mut handles = HandleContainer::new();
        handles.set_owner(Some(rect));
        handles.set_stroke_width(0.5);
        handles.push(Handle::new(WidgetKind::Scale, HandleKind::Resize(0), Point::new(0.0, 5.0)).with_radius(2.0));
        handles.push(
            Handle::new(WidgetKind::Rotate, HandleKind::Rotate, Point::new(5.0, -4.0))
                .with_shape(HandleShape::Circle)
                .with_anchor(Point::new(5.0, 0.0)),
        );

        let ctx = RenderContext::new(&scene)
            .with_viewbox(Some(Rect::new(0.0, 0.0, 100.0, 50.0)))
            .with_handles(Some(&handles));
        let svg = SvgRenderer::new().render(&ctx).unwrap();

        assert!(svg.contains("viewBox=\"0 0 100 50\""));
        let overlay = svg.find("<g class=\"handles\"").unwrap();
        assert!(overlay > svg.find("<text").unwrap());
        assert!(svg.contains("transform=\"matrix(1 0 0 1 10 10)\" fill=\"none\" stroke=\"#3b82f6\" stroke-width=\"0.5\""));
        assert!(svg.contains("<rect class=\"handle\" x=\"-2\" y=\"3\" width=\"4\" height=\"4\"/>"));
        assert!(svg.contains("<line class=\"handle-anchor\" x1=\"5\" y1=\"0\" x2=\"5\" y2=\"-4\"/>"));
        assert!(svg.contains("<circle class=\"handle\" cx=\"5\" cy=\"-4\" r=\"1\"/>"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>\"c\"&"), "a&lt;b&gt;&quot;c&quot;&amp;");
    }
}
