//! Static object layer and project shape layers.
//!
//! Both controllers are thin handles over layer groups in the scene; they
//! decide what is visible and what can be picked for a given plan.

use super::{LAGEPLAN_SHAPES_LAYER, PLANKOPF_LAYER, PlanKind, STATIC_LAYER, SUBPLAN_SHAPES_LAYER};
use crate::persistence::Persister;
use crate::scene::{Category, NodeId, NodeRole, SceneGraph, SceneResult, Tag};
use crate::transform;
use kurbo::{Affine, Rect};

/// Distance objects are parked away from the viewbox when unpositioned.
const PARKING_OFFSET: f64 = 1000.0;

/// Style class toggled while the plan's shapes are highlighted.
const HIGHLIGHT_CLASS: &str = "highlight";

/// One row of the object pick list.
#[derive(Debug, Clone, PartialEq)]
pub struct PickEntry {
    pub id: NodeId,
    pub element_id: String,
    pub name: String,
    pub category: Category,
    pub unpositioned: bool,
}

/// Show the active plan's title block and the shape overlays it owns.
///
/// Lageplan shapes are always shown; sub-plan shapes only for their plan.
pub fn show_plan(scene: &mut SceneGraph, active: PlanKind) {
    if let Some(layer) = scene.find_by_id(PLANKOPF_LAYER) {
        for plankopf in scene.with_role(layer, NodeRole::Plankopf) {
            let owner = scene.node(plankopf).and_then(|node| node.element_id());
            let visible = owner == Some(active.as_str());
            scene.set_visible(plankopf, visible);
        }
    }

    for kind in PlanKind::ALL {
        let Some(layer) = scene.find_by_id(kind.shapes_layer()) else {
            continue;
        };
        let visible = kind.is_root() || kind == active;
        for shape in plan_shapes(scene, layer, kind) {
            scene.set_visible(shape, visible);
        }
    }
}

fn plan_shapes(scene: &SceneGraph, layer: NodeId, plan: PlanKind) -> Vec<NodeId> {
    scene
        .with_role(layer, NodeRole::Shape)
        .into_iter()
        .filter(|&id| scene.node(id).is_some_and(|node| node.class.plan == Some(plan)))
        .collect()
}

/// Controller of the `STATIC` layer holding the plan objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticLayer {
    layer: NodeId,
}

impl StaticLayer {
    pub fn find(scene: &SceneGraph) -> Option<Self> {
        scene.find_by_id(STATIC_LAYER).map(|layer| Self { layer })
    }

    pub fn id(&self) -> NodeId {
        self.layer
    }

    pub fn objects(&self, scene: &SceneGraph) -> Vec<NodeId> {
        scene.with_role(self.layer, NodeRole::Object)
    }

    fn category(&self, scene: &SceneGraph, category: Category) -> Option<NodeId> {
        scene.find_in(self.layer, category.as_str())
    }

    /// Register every object for picking and show the layer.
    ///
    /// Returns the pick list for the object selector.
    pub fn activate(&self, scene: &mut SceneGraph, plan: PlanKind) -> Vec<PickEntry> {
        for object in self.objects(scene) {
            scene.register(object);
        }
        scene.set_visible(self.layer, true);
        let entries = self.pick_list(scene);
        self.set_plan(scene, plan);
        entries
    }

    pub fn deactivate(&self, scene: &mut SceneGraph) {
        self.unregister(scene);
        scene.set_visible(self.layer, false);
    }

    /// Objects stay visible but can no longer be picked.
    pub fn unregister(&self, scene: &mut SceneGraph) {
        for object in self.objects(scene) {
            scene.unregister(object);
        }
    }

    /// Category visibility for the active plan.
    pub fn set_plan(&self, scene: &mut SceneGraph, plan: PlanKind) {
        for category in Category::ALL {
            if let Some(group) = self.category(scene, category) {
                scene.set_visible(group, plan.shows(category));
            }
        }
    }

    /// Objects in category order, named after their definition entry.
    pub fn pick_list(&self, scene: &SceneGraph) -> Vec<PickEntry> {
        let defs = scene
            .roots()
            .iter()
            .copied()
            .find(|&root| scene.node(root).and_then(|node| node.tag()) == Some(&Tag::Defs));

        let mut entries = Vec::new();
        for category in Category::ALL {
            let Some(group) = self.category(scene, category) else {
                continue;
            };
            for object in scene.with_role(group, NodeRole::Object) {
                let Some(node) = scene.node(object) else {
                    continue;
                };
                let element_id = node.element_id().unwrap_or_default().to_string();
                let name = defs
                    .and_then(|defs| scene.find_in(defs, &element_id))
                    .and_then(|def| scene.node(def))
                    .and_then(|def| def.attr("name"))
                    .map(str::to_string)
                    .unwrap_or_else(|| element_id.clone());
                entries.push(PickEntry {
                    id: object,
                    element_id,
                    name,
                    category,
                    unpositioned: node.class.unpositioned,
                });
            }
        }
        entries
    }

    /// Positioned objects in visible categories.
    pub fn select_all(&self, scene: &SceneGraph) -> Vec<NodeId> {
        self.objects(scene)
            .into_iter()
            .filter(|&id| scene.is_visible(id))
            .filter(|&id| scene.node(id).is_some_and(|node| !node.class.unpositioned))
            .collect()
    }

    /// Place an unpositioned object in the middle of `viewbox`, or park a
    /// positioned one outside it. Rotation and scale are reset either way.
    ///
    /// Returns whether the object is positioned afterwards.
    pub fn toggle_positioned(
        &self,
        scene: &mut SceneGraph,
        id: NodeId,
        viewbox: Rect,
        persister: &mut Persister,
    ) -> SceneResult<bool> {
        let node = scene.get_mut(id)?;
        let positioned = node.class.unpositioned;
        let (e, f) = if positioned {
            let center = viewbox.center();
            (center.x, center.y)
        } else {
            (viewbox.x0 - PARKING_OFFSET, viewbox.y0 - PARKING_OFFSET)
        };
        node.class.unpositioned = !positioned;
        node.transform = Some(transform::with_translation(Affine::IDENTITY, e, f));

        persister.transform(scene, id);
        persister.attribute(scene, id, "class");
        Ok(positioned)
    }
}

/// Controller of the shape layers `PROJECT0` (Lageplan) and `PROJECT1`
/// (sub-plans).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectLayer {
    lageplan: NodeId,
    subplan: NodeId,
}

impl ProjectLayer {
    pub fn find(scene: &SceneGraph) -> Option<Self> {
        Some(Self {
            lageplan: scene.find_by_id(LAGEPLAN_SHAPES_LAYER)?,
            subplan: scene.find_by_id(SUBPLAN_SHAPES_LAYER)?,
        })
    }

    /// Layer new shapes of `plan` are created in.
    pub fn layer_for(&self, plan: PlanKind) -> NodeId {
        if plan.is_root() { self.lageplan } else { self.subplan }
    }

    pub fn shapes(&self, scene: &SceneGraph, plan: PlanKind) -> Vec<NodeId> {
        plan_shapes(scene, self.layer_for(plan), plan)
    }

    /// Show and register the shapes of `plan`.
    pub fn set_plan(&self, scene: &mut SceneGraph, plan: PlanKind) {
        scene.set_visible(self.lageplan, true);
        scene.set_visible(self.subplan, true);
        for shape in self.shapes(scene, plan) {
            scene.set_visible(shape, true);
            scene.register(shape);
        }
    }

    /// Unregister the plan's shapes; sub-plan shapes are hidden as well.
    pub fn clear_plan_selection(&self, scene: &mut SceneGraph, plan: PlanKind) {
        for shape in self.shapes(scene, plan) {
            scene.unregister(shape);
            if !plan.is_root() {
                scene.set_visible(shape, false);
            }
        }
    }

    /// Delete every unlocked shape of `plan` plus all ruler lines.
    ///
    /// Returns the external ids of the deleted shapes.
    pub fn clear_plan(
        &self,
        scene: &mut SceneGraph,
        plan: PlanKind,
        persister: &mut Persister,
    ) -> SceneResult<Vec<String>> {
        let layer = self.layer_for(plan);
        let mut deleted = Vec::new();
        for shape in self.shapes(scene, plan) {
            if scene.get(shape)?.class.locked {
                continue;
            }
            let external = scene.external_id(shape);
            scene.remove(shape)?;
            persister.deleted(external.clone());
            deleted.push(external);
        }
        for ruler in scene.with_role(layer, NodeRole::Ruler) {
            scene.remove(ruler)?;
        }
        log::debug!("Cleared {} shapes of {plan}", deleted.len());
        Ok(deleted)
    }

    /// Flip a shape's lock and persist its class. Returns the new state.
    pub fn toggle_lock(&self, scene: &mut SceneGraph, id: NodeId, persister: &mut Persister) -> SceneResult<bool> {
        let node = scene.get_mut(id)?;
        node.class.locked = !node.class.locked;
        let locked = node.class.locked;
        persister.attribute(scene, id, "class");
        Ok(locked)
    }

    /// Add or remove the highlight class on the plan's shapes. Not persisted.
    pub fn highlight(&self, scene: &mut SceneGraph, plan: PlanKind, on: bool) {
        for shape in self.shapes(scene, plan) {
            if let Some(node) = scene.node_mut(shape) {
                node.class.styles.retain(|style| style != HIGHLIGHT_CLASS);
                if on {
                    node.class.styles.push(HIGHLIGHT_CLASS.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemorySink, Mutation};
    use crate::scene::NodeDescriptor;

    fn object(id: &str, class: &str) -> NodeDescriptor {
        NodeDescriptor::new("g")
            .attr("id", id)
            .attr("class", class)
            .attr("transform", "matrix(0 1 -1 0 5 5)")
            .child(NodeDescriptor::new("rect").attr("width", "2").attr("height", "2"))
    }

    fn scene() -> SceneGraph {
        let mut scene = SceneGraph::new();
        scene
            .add_node(
                None,
                &NodeDescriptor::new("defs").child(
                    NodeDescriptor::new("geopos:object")
                        .attr("id", "A1")
                        .attr("name", "Signal Nord"),
                ),
            )
            .unwrap();
        scene
            .add_node(
                None,
                &NodeDescriptor::new("g")
                    .attr("id", "STATIC")
                    .attr("class", "layer")
                    .child(
                        NodeDescriptor::new("g")
                            .attr("id", "AMPEL")
                            .attr("class", "category")
                            .child(object("A1", "object"))
                            .child(object("A2", "object unpositioned")),
                    )
                    .child(
                        NodeDescriptor::new("g")
                            .attr("id", "KNOTEN")
                            .attr("class", "category")
                            .child(object("K1", "object")),
                    )
                    .child(
                        NodeDescriptor::new("g")
                            .attr("id", "SPUR")
                            .attr("class", "category")
                            .child(object("S1", "object")),
                    ),
            )
            .unwrap();
        scene
            .add_node(
                None,
                &NodeDescriptor::new("g")
                    .attr("id", "PROJECT0")
                    .attr("class", "layer")
                    .child(NodeDescriptor::new("rect").attr("id", "1").attr("class", "shape LAGEPLAN")),
            )
            .unwrap();
        scene
            .add_node(
                None,
                &NodeDescriptor::new("g")
                    .attr("id", "PROJECT1")
                    .attr("class", "layer")
                    .child(NodeDescriptor::new("rect").attr("id", "2").attr("class", "shape AMPELPLAN"))
                    .child(NodeDescriptor::new("rect").attr("id", "3").attr("class", "shape AMPELPLAN locked"))
                    .child(NodeDescriptor::new("rect").attr("id", "4").attr("class", "shape SPURENPLAN"))
                    .child(NodeDescriptor::new("line").attr("class", "ruler-line")),
            )
            .unwrap();
        scene
            .add_node(
                None,
                &NodeDescriptor::new("g")
                    .attr("id", "PLANKOPF")
                    .attr("class", "layer")
                    .child(NodeDescriptor::new("g").attr("id", "LAGEPLAN").attr("class", "plankopf"))
                    .child(NodeDescriptor::new("g").attr("id", "AMPELPLAN").attr("class", "plankopf")),
            )
            .unwrap();
        scene
    }

    #[test]
    fn test_activate_registers_and_lists() {
        let mut scene = scene();
        let layer = StaticLayer::find(&scene).unwrap();
        let entries = layer.activate(&mut scene, PlanKind::Lageplan);

        let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["Signal Nord", "A2", "S1", "K1"]);
        assert!(entries[1].unpositioned);
        assert!(layer.objects(&scene).iter().all(|&id| scene.is_registered(id)));

        // Ampel objects are hidden on the Lageplan, Knoten always shown.
        let a1 = scene.find_by_id("A1").unwrap();
        let k1 = scene.find_by_id("K1").unwrap();
        assert!(!scene.is_visible(a1));
        assert!(scene.is_visible(k1));

        layer.set_plan(&mut scene, PlanKind::Ampelplan);
        assert!(scene.is_visible(a1));
        assert!(!scene.is_visible(scene.find_by_id("S1").unwrap()));
    }

    #[test]
    fn test_select_all_skips_unpositioned_and_hidden() {
        let mut scene = scene();
        let layer = StaticLayer::find(&scene).unwrap();
        layer.activate(&mut scene, PlanKind::Ampelplan);
        let selected = layer.select_all(&scene);
        let ids: Vec<String> = selected.iter().map(|&id| scene.external_id(id)).collect();
        assert_eq!(ids, vec!["A1".to_string(), "K1".to_string()]);
    }

    #[test]
    fn test_toggle_positioned() {
        let mut scene = scene();
        let sink = MemorySink::new();
        let mut persister = Persister::new(sink.clone());
        let layer = StaticLayer::find(&scene).unwrap();
        let viewbox = Rect::new(100.0, 200.0, 300.0, 400.0);

        let a2 = scene.find_by_id("A2").unwrap();
        assert!(layer.toggle_positioned(&mut scene, a2, viewbox, &mut persister).unwrap());
        assert_eq!(scene.get_transform(a2), Affine::new([1.0, 0.0, 0.0, 1.0, 200.0, 300.0]));
        assert!(!scene.get(a2).unwrap().class.unpositioned);

        assert!(!layer.toggle_positioned(&mut scene, a2, viewbox, &mut persister).unwrap());
        assert_eq!(scene.get_transform(a2), Affine::new([1.0, 0.0, 0.0, 1.0, -900.0, -800.0]));
        assert_eq!(scene.attr_value(a2, "class").as_deref(), Some("object unpositioned"));

        let mutations = sink.mutations();
        assert_eq!(mutations.len(), 4);
        assert!(matches!(
            &mutations[3],
            Mutation::UpdateAttribute { node_id, name, value, .. }
                if node_id == "A2" && name == "class" && value == "object unpositioned"
        ));
    }

    #[test]
    fn test_show_plan_overlays_and_plankopf() {
        let mut scene = scene();
        show_plan(&mut scene, PlanKind::Ampelplan);
        let visible = |scene: &SceneGraph, id: &str| scene.is_visible(scene.find_by_id(id).unwrap());
        assert!(visible(&scene, "1"));
        assert!(visible(&scene, "2"));
        assert!(!visible(&scene, "4"));

        let plankopf = scene.find_by_id("PLANKOPF").unwrap();
        let ampel = scene.find_in(plankopf, "AMPELPLAN").unwrap();
        let lage = scene.find_in(plankopf, "LAGEPLAN").unwrap();
        assert!(scene.is_visible(ampel));
        assert!(!scene.is_visible(lage));
    }

    #[test]
    fn test_project_set_plan_registers_only_that_plan() {
        let mut scene = scene();
        let project = ProjectLayer::find(&scene).unwrap();
        project.set_plan(&mut scene, PlanKind::Ampelplan);
        assert!(scene.is_registered(scene.find_by_id("2").unwrap()));
        assert!(!scene.is_registered(scene.find_by_id("4").unwrap()));
        assert!(!scene.is_registered(scene.find_by_id("1").unwrap()));

        project.clear_plan_selection(&mut scene, PlanKind::Ampelplan);
        let two = scene.find_by_id("2").unwrap();
        assert!(!scene.is_registered(two));
        assert!(!scene.is_visible(two));
    }

    #[test]
    fn test_clear_plan_keeps_locked() {
        let mut scene = scene();
        let sink = MemorySink::new();
        let mut persister = Persister::new(sink.clone());
        let project = ProjectLayer::find(&scene).unwrap();

        let deleted = project.clear_plan(&mut scene, PlanKind::Ampelplan, &mut persister).unwrap();
        assert_eq!(deleted, vec!["2".to_string()]);
        assert!(scene.find_by_id("3").is_some());
        assert!(scene.find_by_id("4").is_some());
        let layer = project.layer_for(PlanKind::Ampelplan);
        assert!(scene.with_role(layer, NodeRole::Ruler).is_empty());
        assert_eq!(sink.mutations(), vec![Mutation::DeleteNode { node_id: "2".to_string() }]);
    }

    #[test]
    fn test_toggle_lock_persists_class() {
        let mut scene = scene();
        let sink = MemorySink::new();
        let mut persister = Persister::new(sink.clone());
        let project = ProjectLayer::find(&scene).unwrap();
        let three = scene.find_by_id("3").unwrap();

        assert!(!project.toggle_lock(&mut scene, three, &mut persister).unwrap());
        assert_eq!(scene.attr_value(three, "class").as_deref(), Some("shape AMPELPLAN"));
        assert!(project.toggle_lock(&mut scene, three, &mut persister).unwrap());
        assert_eq!(sink.mutations().len(), 2);
    }

    #[test]
    fn test_highlight_is_reversible() {
        let mut scene = scene();
        let project = ProjectLayer::find(&scene).unwrap();
        let two = scene.find_by_id("2").unwrap();
        project.highlight(&mut scene, PlanKind::Ampelplan, true);
        assert_eq!(scene.attr_value(two, "class").as_deref(), Some("shape AMPELPLAN highlight"));
        project.highlight(&mut scene, PlanKind::Ampelplan, false);
        assert_eq!(scene.attr_value(two, "class").as_deref(), Some("shape AMPELPLAN"));
    }
}
