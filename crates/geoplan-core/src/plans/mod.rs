//! Plans: named printable regions sharing the Lageplan coordinate frame.

mod layer;
mod layout;

pub use layer::{PickEntry, ProjectLayer, StaticLayer, show_plan};
pub use layout::PlanMove;

use crate::projection::ConfigurationError;
use crate::scene::{Category, SceneError};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Element id of the static object layer.
pub const STATIC_LAYER: &str = "STATIC";
/// Element id of the layer holding Lageplan shapes.
pub const LAGEPLAN_SHAPES_LAYER: &str = "PROJECT0";
/// Element id of the layer holding sub-plan shapes.
pub const SUBPLAN_SHAPES_LAYER: &str = "PROJECT1";
/// Element id of the title block layer.
pub const PLANKOPF_LAYER: &str = "PLANKOPF";
/// Element id of the junction center object.
pub const KNOTENMITTE: &str = "KNOTENMITTE";

/// Unprintable border per paper side, in millimeters.
pub const PRINT_MARGIN_MM: f64 = 30.0;

/// Plan errors.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),
    #[error("Document has no {0}")]
    MissingPlan(PlanKind),
    #[error("Invalid region {value:?} for {plan}")]
    InvalidRegion { plan: PlanKind, value: String },
    #[error("{plan} would leave the map bounds")]
    OutOfBounds { plan: PlanKind },
    #[error("{0} does not fit into the Lageplan with that layout")]
    DoesNotFit(PlanKind),
    #[error("Unknown layout value {value:?} for {attribute}")]
    InvalidLayout { attribute: String, value: String },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Result type for plan operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// The plan types of a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanKind {
    Lageplan,
    Ampelplan,
    Spurenplan,
    Detektorplan,
    Vvaplan,
}

impl PlanKind {
    pub const ALL: [PlanKind; 5] = [
        PlanKind::Lageplan,
        PlanKind::Ampelplan,
        PlanKind::Spurenplan,
        PlanKind::Detektorplan,
        PlanKind::Vvaplan,
    ];

    /// Plans positioned inside the Lageplan.
    pub const SUB_PLANS: [PlanKind; 4] = [
        PlanKind::Ampelplan,
        PlanKind::Spurenplan,
        PlanKind::Detektorplan,
        PlanKind::Vvaplan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlanKind::Lageplan => "LAGEPLAN",
            PlanKind::Ampelplan => "AMPELPLAN",
            PlanKind::Spurenplan => "SPURENPLAN",
            PlanKind::Detektorplan => "DETEKTORPLAN",
            PlanKind::Vvaplan => "VVAPLAN",
        }
    }

    /// The Lageplan owns the shared coordinate frame.
    pub fn is_root(self) -> bool {
        self == PlanKind::Lageplan
    }

    /// Object categories drawn on this plan.
    pub fn categories(self) -> &'static [Category] {
        match self {
            PlanKind::Lageplan => &[Category::Knoten, Category::Meta, Category::Steuergeraet],
            PlanKind::Ampelplan => &[Category::Ampelmast, Category::Ampel],
            PlanKind::Spurenplan => &[Category::Spur],
            PlanKind::Detektorplan => &[Category::Detektor],
            PlanKind::Vvaplan => &[Category::Vva],
        }
    }

    /// Whether a category is shown while this plan is active.
    ///
    /// Lageplan categories are always shown.
    pub fn shows(self, category: Category) -> bool {
        PlanKind::Lageplan.categories().contains(&category) || self.categories().contains(&category)
    }

    /// Element id of the layer holding this plan's shapes.
    pub fn shapes_layer(self) -> &'static str {
        if self.is_root() {
            LAGEPLAN_SHAPES_LAYER
        } else {
            SUBPLAN_SHAPES_LAYER
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PlanError::UnknownPlan(s.to_string()))
    }
}

/// Drawing scale 1:n.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Massstab {
    #[serde(rename = "200")]
    M200,
    #[default]
    #[serde(rename = "500")]
    M500,
    #[serde(rename = "1000")]
    M1000,
}

impl Massstab {
    pub const ALL: [Massstab; 3] = [Massstab::M200, Massstab::M500, Massstab::M1000];

    pub fn denominator(self) -> u32 {
        match self {
            Massstab::M200 => 200,
            Massstab::M500 => 500,
            Massstab::M1000 => 1000,
        }
    }

    /// Drawing meters per paper millimeter.
    pub fn factor(self) -> f64 {
        self.denominator() as f64 / 1000.0
    }
}

/// Paper format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    A4,
    #[default]
    A3,
}

impl Format {
    /// Portrait paper size in millimeters.
    pub fn paper_mm(self) -> (f64, f64) {
        match self {
            Format::A4 => (210.0, 297.0),
            Format::A3 => (297.0, 420.0),
        }
    }
}

/// Paper orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Auslegung {
    #[default]
    Hoch,
    Quer,
}

/// Scale, paper and orientation of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanLayout {
    #[serde(default)]
    pub massstab: Massstab,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub auslegung: Auslegung,
}

impl PlanLayout {
    /// Region size in drawing units.
    pub fn size(&self) -> Size {
        let (width, height) = self.format.paper_mm();
        let (width, height) = match self.auslegung {
            Auslegung::Hoch => (width, height),
            Auslegung::Quer => (height, width),
        };
        let factor = self.massstab.factor();
        Size::new(
            (width - PRINT_MARGIN_MM) * factor,
            (height - PRINT_MARGIN_MM) * factor,
        )
    }

    pub fn with(mut self, change: LayoutChange) -> Self {
        match change {
            LayoutChange::Massstab(massstab) => self.massstab = massstab,
            LayoutChange::Format(format) => self.format = format,
            LayoutChange::Auslegung(auslegung) => self.auslegung = auslegung,
        }
        self
    }
}

/// One layout setting as chosen in the layout toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutChange {
    Massstab(Massstab),
    Format(Format),
    Auslegung(Auslegung),
}

impl LayoutChange {
    /// Parse the toolbar's `(attribute, value)` pair, e.g. `("massstab", "200")`.
    pub fn parse(attribute: &str, value: &str) -> PlanResult<Self> {
        let quoted = format!("\"{value}\"");
        let invalid = || PlanError::InvalidLayout {
            attribute: attribute.to_string(),
            value: value.to_string(),
        };
        match attribute {
            "massstab" => serde_json::from_str(&quoted).map(LayoutChange::Massstab).map_err(|_| invalid()),
            "format" => serde_json::from_str(&quoted).map(LayoutChange::Format).map_err(|_| invalid()),
            "auslegung" => serde_json::from_str(&quoted).map(LayoutChange::Auslegung).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// Serialized plan entry of a scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub id: PlanKind,
    /// `"left top width height"`; width and height follow from the layout.
    pub region: String,
    #[serde(flatten)]
    pub layout: PlanLayout,
}

/// A placed plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub kind: PlanKind,
    /// Top-left corner in drawing space.
    pub origin: Point,
    pub layout: PlanLayout,
}

impl Plan {
    pub fn new(kind: PlanKind, origin: Point, layout: PlanLayout) -> Self {
        Self {
            kind,
            origin,
            layout,
        }
    }

    pub fn from_config(config: &PlanConfig) -> PlanResult<Self> {
        let numbers: Vec<f64> = config
            .region
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| PlanError::InvalidRegion {
                plan: config.id,
                value: config.region.clone(),
            })?;
        match numbers.as_slice() {
            [left, top, ..] => Ok(Self::new(config.id, Point::new(*left, *top), config.layout)),
            _ => Err(PlanError::InvalidRegion {
                plan: config.id,
                value: config.region.clone(),
            }),
        }
    }

    pub fn to_config(&self) -> PlanConfig {
        PlanConfig {
            id: self.kind,
            region: self.region_string(),
            layout: self.layout,
        }
    }

    pub fn size(&self) -> Size {
        self.layout.size()
    }

    /// Region in drawing space.
    pub fn region(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size())
    }

    /// Region as `"left top width height"`.
    pub fn region_string(&self) -> String {
        let size = self.size();
        format!("{} {} {} {}", self.origin.x, self.origin.y, size.width, size.height)
    }

    /// Region relative to the Lageplan origin, the frame objects live in.
    pub fn viewbox(&self, lageplan_origin: Point) -> Rect {
        Rect::from_origin_size((self.origin - lageplan_origin).to_point(), self.size())
    }

    /// Whether a plan with `layout` is small enough to sit inside this one.
    pub fn can_fit(&self, layout: &PlanLayout) -> bool {
        let outer = self.size();
        let inner = layout.size();
        inner.width <= outer.width && inner.height <= outer.height
    }

    /// Clamp this plan's origin so the region lies inside `outer`.
    pub fn fit(&mut self, outer: &Plan) {
        let size = self.size();
        let bounds = outer.region();
        self.origin.x = self.origin.x.max(bounds.x0).min(bounds.x1 - size.width);
        self.origin.y = self.origin.y.max(bounds.y0).min(bounds.y1 - size.height);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.origin += delta;
    }
}

/// All plans of a document plus the active one.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSet {
    plans: Vec<Plan>,
    active: PlanKind,
}

impl PlanSet {
    /// Build from document entries. Missing sub-plans start as copies of
    /// the Lageplan.
    pub fn from_configs(configs: &[PlanConfig]) -> PlanResult<Self> {
        let mut parsed: Vec<Option<Plan>> = vec![None; PlanKind::ALL.len()];
        for config in configs {
            parsed[config.id.index()] = Some(Plan::from_config(config)?);
        }
        let lageplan = parsed[PlanKind::Lageplan.index()]
            .clone()
            .ok_or(PlanError::MissingPlan(PlanKind::Lageplan))?;

        let plans = PlanKind::ALL
            .into_iter()
            .zip(parsed)
            .map(|(kind, plan)| {
                plan.unwrap_or_else(|| {
                    log::warn!("{kind} missing from document; using the Lageplan region");
                    Plan::new(kind, lageplan.origin, lageplan.layout)
                })
            })
            .collect();
        Ok(Self {
            plans,
            active: PlanKind::Lageplan,
        })
    }

    pub fn to_configs(&self) -> Vec<PlanConfig> {
        self.plans.iter().map(Plan::to_config).collect()
    }

    pub fn get(&self, kind: PlanKind) -> &Plan {
        &self.plans[kind.index()]
    }

    fn get_mut(&mut self, kind: PlanKind) -> &mut Plan {
        &mut self.plans[kind.index()]
    }

    pub fn lageplan(&self) -> &Plan {
        self.get(PlanKind::Lageplan)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plan> {
        self.plans.iter()
    }

    pub fn active(&self) -> PlanKind {
        self.active
    }

    pub fn set_active(&mut self, kind: PlanKind) {
        self.active = kind;
    }

    /// A plan's region in the shared object frame.
    pub fn viewbox(&self, kind: PlanKind) -> Rect {
        self.get(kind).viewbox(self.lageplan().origin)
    }

    /// Whether `change` is allowed for `kind`. Sub-plans must still fit
    /// inside the Lageplan afterwards.
    pub fn allows(&self, kind: PlanKind, change: LayoutChange) -> bool {
        kind.is_root() || self.lageplan().can_fit(&self.get(kind).layout.with(change))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(id: PlanKind, region: &str) -> PlanConfig {
        PlanConfig {
            id,
            region: region.to_string(),
            layout: PlanLayout::default(),
        }
    }

    #[test]
    fn test_default_layout_size() {
        let size = PlanLayout::default().size();
        assert!((size.width - 133.5).abs() < 1e-9);
        assert!((size.height - 195.0).abs() < 1e-9);
    }

    #[test]
    fn test_quer_swaps_sides() {
        let layout = PlanLayout {
            massstab: Massstab::M1000,
            format: Format::A4,
            auslegung: Auslegung::Quer,
        };
        let size = layout.size();
        assert!((size.width - 267.0).abs() < 1e-9);
        assert!((size.height - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_plan_kind_strings() {
        assert_eq!("VVAPLAN".parse::<PlanKind>().unwrap(), PlanKind::Vvaplan);
        assert!(matches!("FOO".parse::<PlanKind>(), Err(PlanError::UnknownPlan(_))));
        assert_eq!(serde_json::to_string(&PlanKind::Detektorplan).unwrap(), "\"DETEKTORPLAN\"");
    }

    #[test]
    fn test_category_visibility() {
        assert!(PlanKind::Ampelplan.shows(Category::Ampel));
        assert!(PlanKind::Ampelplan.shows(Category::Knoten));
        assert!(!PlanKind::Ampelplan.shows(Category::Spur));
        assert!(!PlanKind::Lageplan.shows(Category::Detektor));
    }

    #[test]
    fn test_plan_config_json() {
        let json = r#"{"id":"AMPELPLAN","region":"10 20 133.5 195","massstab":"200","format":"A4","auslegung":"quer"}"#;
        let config: PlanConfig = serde_json::from_str(json).unwrap();
        let plan = Plan::from_config(&config).unwrap();
        assert_eq!(plan.origin, Point::new(10.0, 20.0));
        assert_eq!(plan.layout.massstab, Massstab::M200);
        assert_eq!(plan.layout.auslegung, Auslegung::Quer);

        let bad = config_with_region("nope");
        assert!(matches!(Plan::from_config(&bad), Err(PlanError::InvalidRegion { .. })));
    }

    fn config_with_region(region: &str) -> PlanConfig {
        config(PlanKind::Lageplan, region)
    }

    #[test]
    fn test_fit_clamps_inside() {
        let outer = Plan::new(PlanKind::Lageplan, Point::new(0.0, 0.0), PlanLayout::default());
        let mut inner = Plan::new(
            PlanKind::Ampelplan,
            Point::new(-50.0, 500.0),
            PlanLayout {
                massstab: Massstab::M200,
                ..Default::default()
            },
        );
        inner.fit(&outer);
        assert_eq!(inner.origin.x, 0.0);
        assert!((inner.origin.y - (195.0 - 78.0)).abs() < 1e-9);
        assert!(outer.can_fit(&inner.layout));
        assert!(!inner.can_fit(&outer.layout));
    }

    #[test]
    fn test_missing_sub_plans_copy_lageplan() {
        let set = PlanSet::from_configs(&[config(PlanKind::Lageplan, "5 6 0 0")]).unwrap();
        assert_eq!(set.get(PlanKind::Spurenplan).origin, Point::new(5.0, 6.0));
        assert_eq!(set.viewbox(PlanKind::Spurenplan).origin(), Point::ZERO);
        assert!(matches!(PlanSet::from_configs(&[]), Err(PlanError::MissingPlan(PlanKind::Lageplan))));
    }

    #[test]
    fn test_layout_change_parse_and_allows() {
        let set = PlanSet::from_configs(&[config(PlanKind::Lageplan, "0 0 0 0")]).unwrap();
        let change = LayoutChange::parse("massstab", "1000").unwrap();
        assert_eq!(change, LayoutChange::Massstab(Massstab::M1000));
        assert!(set.allows(PlanKind::Lageplan, change));
        assert!(!set.allows(PlanKind::Ampelplan, change));
        assert!(set.allows(PlanKind::Ampelplan, LayoutChange::Massstab(Massstab::M200)));
        assert!(LayoutChange::parse("massstab", "300").is_err());
        assert!(LayoutChange::parse("colour", "red").is_err());
    }
}
