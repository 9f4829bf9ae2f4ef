//! Style changes on project shapes, with a non-destructive preview.
//!
//! `clone_select` hides the selected shape and puts an editor-only copy in
//! its place. Styles land on the copy until `clone_apply` moves them to the
//! original (and persists them) or `clone_delete` throws them away.

use crate::persistence::Persister;
use crate::plans::PlanKind;
use crate::scene::{NodeClass, NodeId, NodeRole, SceneError, SceneGraph, SceneResult, Tag};
use serde::{Deserialize, Serialize};

/// Defs element holding the fill patterns.
pub const PATTERN_DEFS: &str = "PROJECT";
const NO_PATTERN: &str = "nopattern";
const TRANSPARENT: &str = "transparent";

/// Attributes a custom-styled shape must carry.
const CUSTOM_DEFAULTS: [(&str, &str); 3] = [("fill", "#000000"), ("stroke", "#000000"), ("stroke-width", "0")];

/// A set of style edits, merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ElementStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<String>,
    pub stroke_dasharray: Option<String>,
    /// Base pattern id, "nopattern" or "transparent".
    pub pattern: Option<String>,
    /// Style class replacing the shape's presentation classes.
    pub class: Option<String>,
}

impl ElementStyle {
    /// Later edits win.
    pub fn merge(&mut self, other: ElementStyle) {
        let ElementStyle {
            fill,
            stroke,
            stroke_width,
            stroke_dasharray,
            pattern,
            class,
        } = other;
        self.fill = fill.or(self.fill.take());
        self.stroke = stroke.or(self.stroke.take());
        self.stroke_width = stroke_width.or(self.stroke_width.take());
        self.stroke_dasharray = stroke_dasharray.or(self.stroke_dasharray.take());
        self.pattern = pattern.or(self.pattern.take());
        self.class = class.or(self.class.take());
    }

    fn attributes(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("fill", &self.fill),
            ("stroke", &self.stroke),
            ("stroke-width", &self.stroke_width),
            ("stroke-dasharray", &self.stroke_dasharray),
        ]
        .into_iter()
        .filter_map(|(name, value)| Some((name, value.as_deref()?)))
    }
}

/// Id of the colored copy of a base pattern.
pub fn pattern_id(pattern: &str, color: &str) -> String {
    format!("{pattern}-{}", color.trim_start_matches('#'))
}

/// Make sure a colored copy of `pattern` exists in the pattern defs.
///
/// Returns the fill value referencing it.
fn ensure_pattern(scene: &mut SceneGraph, persister: &mut Persister, pattern: &str, color: &str) -> SceneResult<String> {
    let id = pattern_id(pattern, color);
    let defs = scene
        .find_by_id(PATTERN_DEFS)
        .ok_or_else(|| SceneError::ElementNotFound(PATTERN_DEFS.to_string()))?;
    if scene.find_in(defs, &id).is_none() {
        let base = scene
            .find_in(defs, pattern)
            .ok_or_else(|| SceneError::ElementNotFound(pattern.to_string()))?;
        let copy = scene.deep_clone(base, Some(defs), None)?;
        scene.set_attr(copy, "id", &id)?;
        let strokes: Vec<NodeId> = scene
            .children(copy)
            .iter()
            .copied()
            .filter(|&child| scene.node(child).and_then(|n| n.tag()) == Some(&Tag::Group))
            .collect();
        for child in strokes {
            scene.set_attr(child, "stroke", color)?;
        }
        persister.created(scene, copy);
        log::debug!("Created pattern {id}");
    }
    Ok(format!("url(#{id})"))
}

/// Write `style` onto `node`. With `persist`, every written attribute is
/// reported, plus `data-customshape` and the class of custom shapes.
fn apply_style(
    scene: &mut SceneGraph,
    persister: &mut Persister,
    node: NodeId,
    style: &ElementStyle,
    persist: bool,
) -> SceneResult<()> {
    let mut written: Vec<&'static str> = Vec::new();
    for (name, value) in style.attributes() {
        let value = match (name, style.pattern.as_deref()) {
            ("fill", Some(TRANSPARENT)) => TRANSPARENT.to_string(),
            ("fill", Some(pattern)) if pattern != NO_PATTERN => {
                match ensure_pattern(scene, persister, pattern, value) {
                    Ok(fill) => fill,
                    Err(err) => {
                        log::warn!("Pattern {pattern} unavailable, using plain fill: {err}");
                        value.to_string()
                    }
                }
            }
            _ => value.to_string(),
        };
        scene.set_attr(node, name, &value)?;
        written.push(name);
    }
    if let Some(class) = &style.class {
        scene.get_mut(node)?.class.set_style(class);
    }
    if !persist {
        return Ok(());
    }

    if let Some(fill) = scene.attr_value(node, "fill") {
        scene.set_attr(node, "data-customshape", &fill)?;
        persister.attribute(scene, node, "data-customshape");
    }
    if style.class.is_some() || scene.get(node)?.class.custom_style {
        persister.attribute(scene, node, "class");
    }
    for name in written {
        persister.attribute(scene, node, name);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct Preview {
    original: NodeId,
    clone: NodeId,
}

/// Clone-preview state of one session.
#[derive(Debug, Default)]
pub struct StylePreview {
    preview: Option<Preview>,
    pending: ElementStyle,
}

impl StylePreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.preview.is_some()
    }

    /// The stand-in currently shown instead of the original.
    pub fn clone_node(&self) -> Option<NodeId> {
        self.preview.map(|preview| preview.clone)
    }

    /// Edits collected on the stand-in so far.
    pub fn pending(&self) -> &ElementStyle {
        &self.pending
    }

    /// Hide `node` and show an editable copy right after it.
    pub fn clone_select(&mut self, scene: &mut SceneGraph, node: NodeId) -> SceneResult<NodeId> {
        if let Some(preview) = self.preview {
            log::warn!("Dropping unfinished style preview of {}", preview.original);
            self.clone_delete(scene);
        }
        let siblings = scene.siblings(node);
        let before = siblings
            .iter()
            .position(|&id| id == node)
            .and_then(|index| siblings.get(index + 1).copied());
        let parent = scene.parent(node);
        let clone = scene.deep_clone(node, parent, before)?;
        scene.get_mut(clone)?.transient = true;
        scene.register(clone);
        scene.set_visible(node, false);
        self.preview = Some(Preview { original: node, clone });
        self.pending = ElementStyle::default();
        Ok(clone)
    }

    /// Apply a style. On the preview copy it is only collected; anywhere
    /// else it is written and persisted at once.
    pub fn set_element_style(
        &mut self,
        scene: &mut SceneGraph,
        persister: &mut Persister,
        node: NodeId,
        style: ElementStyle,
    ) -> SceneResult<()> {
        match self.preview {
            Some(preview) if preview.clone == node => {
                apply_style(scene, persister, node, &style, false)?;
                self.pending.merge(style);
                Ok(())
            }
            _ => apply_style(scene, persister, node, &style, true),
        }
    }

    /// Move the collected style onto the original and persist it.
    ///
    /// Returns the original, which becomes the selection again.
    pub fn clone_apply(&mut self, scene: &mut SceneGraph, persister: &mut Persister) -> SceneResult<Option<NodeId>> {
        let Some(preview) = self.preview.take() else {
            return Ok(None);
        };
        let style = std::mem::take(&mut self.pending);
        if scene.contains(preview.clone) {
            scene.remove(preview.clone)?;
        }
        let original = scene.get_mut(preview.original)?;
        original.class.custom_style = true;
        for (name, value) in CUSTOM_DEFAULTS {
            if original.attr(name).is_none() {
                original.set_attr(name, value);
            }
        }
        scene.set_visible(preview.original, true);
        apply_style(scene, persister, preview.original, &style, true)?;
        Ok(Some(preview.original))
    }

    /// Throw the preview away and show the original unchanged.
    pub fn clone_delete(&mut self, scene: &mut SceneGraph) -> Option<NodeId> {
        let preview = self.preview.take()?;
        self.pending = ElementStyle::default();
        if scene.contains(preview.clone) {
            let _ = scene.remove(preview.clone);
        }
        scene.set_visible(preview.original, true);
        Some(preview.original)
    }
}

/// Give a shape one of the predefined styles: `shape <PLAN> <class>`.
///
/// Symbols keep their own look. Returns whether the class changed.
pub fn set_style_class(
    scene: &mut SceneGraph,
    persister: &mut Persister,
    node: NodeId,
    plan: PlanKind,
    class: &str,
) -> SceneResult<bool> {
    let shape = scene.get_mut(node)?;
    if shape.attr("data-tool") == Some("symbol") {
        return Ok(false);
    }
    let mut styled = NodeClass::new(NodeRole::Shape);
    styled.plan = Some(plan);
    styled.set_style(class);
    if shape.class == styled {
        return Ok(false);
    }
    shape.class = styled;
    persister.attribute(scene, node, "class");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemorySink, Mutation};
    use crate::scene::NodeDescriptor;

    struct Fixture {
        scene: SceneGraph,
        persister: Persister,
        sink: MemorySink,
        shape: NodeId,
    }

    fn fixture() -> Fixture {
        let mut scene = SceneGraph::new();
        scene
            .add_node(
                None,
                &NodeDescriptor::new("defs").attr("id", "PROJECT").child(
                    NodeDescriptor::new("pattern")
                        .attr("id", "schraffiert1")
                        .child(NodeDescriptor::new("g").attr("stroke", "#2E79D6"))
                        .child(NodeDescriptor::new("rect")),
                ),
            )
            .unwrap();
        let layer = scene
            .add_node(None, &NodeDescriptor::new("g").attr("id", "PROJECT1").attr("class", "layer"))
            .unwrap();
        let shape = scene
            .add_node(
                Some(layer),
                &NodeDescriptor::new("rect")
                    .attr("id", "7")
                    .attr("class", "shape AMPELPLAN flaeche")
                    .attr("data-tool", "rect")
                    .attr("width", "10")
                    .attr("height", "10"),
            )
            .unwrap();
        scene.register(shape);
        let sink = MemorySink::new();
        Fixture {
            scene,
            persister: Persister::new(sink.clone()),
            sink,
            shape,
        }
    }

    fn names(sink: &MemorySink) -> Vec<String> {
        sink.mutations()
            .into_iter()
            .map(|mutation| match mutation {
                Mutation::UpdateAttribute { name, .. } => name,
                Mutation::CreateNode { descriptor, .. } => format!("create {}", descriptor.get("id").unwrap_or("")),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_clone_select_hides_original() {
        let mut f = fixture();
        let mut preview = StylePreview::new();
        let clone = preview.clone_select(&mut f.scene, f.shape).unwrap();
        assert!(!f.scene.is_visible(f.shape));
        assert!(f.scene.is_visible(clone));
        assert!(f.scene.node(clone).unwrap().transient);
        let siblings = f.scene.siblings(f.shape);
        assert_eq!(siblings, [f.shape, clone]);
        assert_eq!(f.scene.pick(kurbo::Point::new(5.0, 5.0)), Some(clone));
    }

    #[test]
    fn test_preview_styles_are_not_persisted_until_applied() {
        let mut f = fixture();
        let mut preview = StylePreview::new();
        let clone = preview.clone_select(&mut f.scene, f.shape).unwrap();
        let style = ElementStyle {
            stroke: Some("#FF0000".to_string()),
            stroke_width: Some("2".to_string()),
            ..Default::default()
        };
        preview.set_element_style(&mut f.scene, &mut f.persister, clone, style).unwrap();
        assert_eq!(f.scene.attr_value(clone, "stroke").as_deref(), Some("#FF0000"));
        assert_eq!(f.scene.attr_value(f.shape, "stroke"), None);
        assert!(f.sink.mutations().is_empty());

        let original = preview.clone_apply(&mut f.scene, &mut f.persister).unwrap();
        assert_eq!(original, Some(f.shape));
        assert!(!f.scene.contains(clone));
        assert!(f.scene.is_visible(f.shape));
        let node = f.scene.node(f.shape).unwrap();
        assert!(node.class.custom_style);
        assert_eq!(node.attr("stroke"), Some("#FF0000"));
        assert_eq!(node.attr("fill"), Some("#000000"));
        assert_eq!(names(&f.sink), ["data-customshape", "class", "stroke", "stroke-width"]);
    }

    #[test]
    fn test_clone_delete_leaves_original_untouched() {
        let mut f = fixture();
        let mut preview = StylePreview::new();
        let clone = preview.clone_select(&mut f.scene, f.shape).unwrap();
        let style = ElementStyle {
            fill: Some("#00FF00".to_string()),
            ..Default::default()
        };
        preview.set_element_style(&mut f.scene, &mut f.persister, clone, style).unwrap();
        assert_eq!(preview.clone_delete(&mut f.scene), Some(f.shape));
        assert!(!preview.is_active());
        assert!(!f.scene.contains(clone));
        assert!(f.scene.is_visible(f.shape));
        assert_eq!(f.scene.attr_value(f.shape, "fill"), None);
        assert!(f.sink.mutations().is_empty());
    }

    #[test]
    fn test_pattern_fill_creates_colored_copy_once() {
        let mut f = fixture();
        let mut preview = StylePreview::new();
        let style = ElementStyle {
            fill: Some("#E52420".to_string()),
            pattern: Some("schraffiert1".to_string()),
            ..Default::default()
        };
        preview.set_element_style(&mut f.scene, &mut f.persister, f.shape, style.clone()).unwrap();
        assert_eq!(f.scene.attr_value(f.shape, "fill").as_deref(), Some("url(#schraffiert1-E52420)"));
        assert_eq!(
            f.scene.attr_value(f.shape, "data-customshape").as_deref(),
            Some("url(#schraffiert1-E52420)")
        );
        let copy = f.scene.find_by_id("schraffiert1-E52420").unwrap();
        let stroke_group = f.scene.children(copy)[0];
        assert_eq!(f.scene.attr_value(stroke_group, "stroke").as_deref(), Some("#E52420"));
        assert_eq!(names(&f.sink), ["create schraffiert1-E52420", "data-customshape", "fill"]);

        f.sink.clear();
        preview.set_element_style(&mut f.scene, &mut f.persister, f.shape, style).unwrap();
        assert_eq!(names(&f.sink), ["data-customshape", "fill"]);
    }

    #[test]
    fn test_transparent_pattern() {
        let mut f = fixture();
        let mut preview = StylePreview::new();
        let style = ElementStyle {
            fill: Some("#E52420".to_string()),
            pattern: Some("transparent".to_string()),
            ..Default::default()
        };
        preview.set_element_style(&mut f.scene, &mut f.persister, f.shape, style).unwrap();
        assert_eq!(f.scene.attr_value(f.shape, "fill").as_deref(), Some("transparent"));
    }

    #[test]
    fn test_set_style_class() {
        let mut f = fixture();
        assert!(set_style_class(&mut f.scene, &mut f.persister, f.shape, PlanKind::Ampelplan, "linie-rot").unwrap());
        assert_eq!(f.scene.attr_value(f.shape, "class").as_deref(), Some("shape AMPELPLAN linie-rot"));
        assert!(!set_style_class(&mut f.scene, &mut f.persister, f.shape, PlanKind::Ampelplan, "linie-rot").unwrap());
        assert_eq!(names(&f.sink), ["class"]);
    }

    #[test]
    fn test_merge_keeps_earlier_fields() {
        let mut style = ElementStyle {
            fill: Some("#111111".to_string()),
            stroke: Some("#222222".to_string()),
            ..Default::default()
        };
        style.merge(ElementStyle {
            stroke: Some("#333333".to_string()),
            ..Default::default()
        });
        assert_eq!(style.fill.as_deref(), Some("#111111"));
        assert_eq!(style.stroke.as_deref(), Some("#333333"));
    }
}
