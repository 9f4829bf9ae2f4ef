//! Moving plans and changing their layout.

use super::{
    KNOTENMITTE, LAGEPLAN_SHAPES_LAYER, LayoutChange, PLANKOPF_LAYER, PlanError, PlanKind,
    PlanResult, PlanSet, STATIC_LAYER, SUBPLAN_SHAPES_LAYER,
};
use crate::persistence::{Mutation, Persister};
use crate::projection::{Crs, GeoBounds};
use crate::scene::{NodeId, NodeRole, SceneGraph};
use crate::transform;
use kurbo::{Point, Vec2};

/// Outcome of a plan move.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanMove {
    pub plan: PlanKind,
    /// Delta actually applied to the plan's origin.
    pub delta: Vec2,
    /// Every plan whose region changed.
    pub changed: Vec<PlanKind>,
}

impl PlanSet {
    /// Move a plan by `delta` in drawing space.
    ///
    /// Moving the Lageplan shifts the shared frame: sub-plans move along and
    /// every object and shape is moved back by the same amount so it stays
    /// put on the map. A sub-plan is clamped inside the Lageplan and only
    /// its title block follows.
    pub fn move_plan(
        &mut self,
        kind: PlanKind,
        delta: Vec2,
        scene: &mut SceneGraph,
        persister: &mut Persister,
    ) -> PlanResult<PlanMove> {
        let moved = if kind.is_root() {
            self.move_lageplan(delta, scene, persister)
        } else {
            self.move_sub_plan(kind, delta, scene, persister)
        };
        for &plan in &moved.changed {
            persister.persist(self.plan_mutation(plan));
        }
        Ok(moved)
    }

    /// Move a plan so its top-left corner lands on `origin`.
    pub fn move_plan_to(
        &mut self,
        kind: PlanKind,
        origin: Point,
        scene: &mut SceneGraph,
        persister: &mut Persister,
    ) -> PlanResult<PlanMove> {
        let delta = origin - self.get(kind).origin;
        self.move_plan(kind, delta, scene, persister)
    }

    /// Move a plan to the geographic rectangle dragged on the base map.
    ///
    /// Rectangles reaching outside the tile set bounds are rejected and
    /// nothing changes.
    pub fn move_plan_to_geo(
        &mut self,
        kind: PlanKind,
        bounds: &GeoBounds,
        crs: &Crs,
        scene: &mut SceneGraph,
        persister: &mut Persister,
    ) -> PlanResult<PlanMove> {
        let national = crs.geo_to_national(bounds);
        let corners = [
            Point::new(national.x0, national.y0),
            Point::new(national.x1, national.y1),
        ];
        if !corners.iter().all(|&corner| crs.contains(corner)) {
            log::warn!("Rejecting move of {kind} outside the map bounds: {national:?}");
            return Err(PlanError::OutOfBounds { plan: kind });
        }
        let origin = crs.geo_to_svg_origin(bounds);
        self.move_plan_to(kind, origin, scene, persister)
    }

    fn move_lageplan(&mut self, delta: Vec2, scene: &mut SceneGraph, persister: &mut Persister) -> PlanMove {
        for plan in &mut self.plans {
            plan.translate(delta);
        }

        for (layer, role) in [
            (STATIC_LAYER, NodeRole::Object),
            (LAGEPLAN_SHAPES_LAYER, NodeRole::Shape),
            (SUBPLAN_SHAPES_LAYER, NodeRole::Shape),
        ] {
            let Some(layer) = scene.find_by_id(layer) else {
                continue;
            };
            for id in scene.with_role(layer, role) {
                shift(scene, persister, id, -delta);
            }
        }

        self.center_knotenmitte(scene, persister);

        PlanMove {
            plan: PlanKind::Lageplan,
            delta,
            changed: PlanKind::ALL.to_vec(),
        }
    }

    /// Pull the junction center back inside the Lageplan.
    fn center_knotenmitte(&self, scene: &mut SceneGraph, persister: &mut Persister) {
        let Some(id) = scene
            .find_by_id(STATIC_LAYER)
            .and_then(|layer| scene.find_in(layer, KNOTENMITTE))
        else {
            return;
        };
        let size = self.lageplan().size();
        let [a, b, c, d, mut e, mut f] = scene.get_transform(id).as_coeffs();
        if e <= 0.0 || e >= size.width {
            e = size.width / 2.0;
        }
        if f <= 0.0 || f >= size.height {
            f = size.height / 2.0;
        }
        if let Err(err) = scene.set_transform(id, kurbo::Affine::new([a, b, c, d, e, f])) {
            log::warn!("Cannot center {KNOTENMITTE}: {err}");
            return;
        }
        if let Some(node) = scene.node_mut(id) {
            node.class.unpositioned = false;
        }
        persister.transform(scene, id);
        persister.attribute(scene, id, "class");
    }

    fn move_sub_plan(
        &mut self,
        kind: PlanKind,
        delta: Vec2,
        scene: &mut SceneGraph,
        persister: &mut Persister,
    ) -> PlanMove {
        let lageplan = self.lageplan().clone();
        let plan = self.get_mut(kind);
        let before = plan.origin;
        plan.translate(delta);
        plan.fit(&lageplan);
        let applied = plan.origin - before;

        if let Some(plankopf) = scene
            .find_by_id(PLANKOPF_LAYER)
            .and_then(|layer| scene.find_in(layer, kind.as_str()))
        {
            shift(scene, persister, plankopf, applied);
        }

        PlanMove {
            plan: kind,
            delta: applied,
            changed: vec![kind],
        }
    }

    /// Apply a layout setting to a plan.
    ///
    /// A Lageplan change is copied to every sub-plan; a sub-plan is refitted
    /// inside the Lageplan.
    pub fn change_layout(
        &mut self,
        kind: PlanKind,
        change: LayoutChange,
        persister: &mut Persister,
    ) -> PlanResult<Vec<PlanKind>> {
        if !self.allows(kind, change) {
            return Err(PlanError::DoesNotFit(kind));
        }
        let plan = self.get_mut(kind);
        plan.layout = plan.layout.with(change);

        let changed = if kind.is_root() {
            let lageplan = self.lageplan().clone();
            for sub in PlanKind::SUB_PLANS {
                let plan = self.get_mut(sub);
                plan.layout = lageplan.layout;
                plan.origin = lageplan.origin;
            }
            PlanKind::ALL.to_vec()
        } else {
            let lageplan = self.lageplan().clone();
            self.get_mut(kind).fit(&lageplan);
            vec![kind]
        };

        for &plan in &changed {
            persister.persist(self.plan_mutation(plan));
        }
        Ok(changed)
    }

    pub(crate) fn plan_mutation(&self, kind: PlanKind) -> Mutation {
        let plan = self.get(kind);
        Mutation::PlanChanged {
            plan: kind,
            region: plan.region_string(),
            massstab: plan.layout.massstab,
            format: plan.layout.format,
            auslegung: plan.layout.auslegung,
        }
    }
}

/// Add `delta` to a node's translation and persist it.
fn shift(scene: &mut SceneGraph, persister: &mut Persister, id: NodeId, delta: Vec2) {
    let matrix = scene.get_transform(id);
    let moved = transform::with_translation(
        matrix,
        matrix.translation().x + delta.x,
        matrix.translation().y + delta.y,
    );
    if scene.set_transform(id, moved).is_ok() {
        persister.transform(scene, id);
    }
}
