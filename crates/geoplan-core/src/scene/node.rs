//! Typed scene nodes.

use crate::plans::PlanKind;
use kurbo::Affine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index of a node in the scene arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Svg,
    Group,
    Rect,
    Circle,
    Ellipse,
    Line,
    Path,
    Text,
    Image,
    Use,
    Style,
    Defs,
    Pattern,
    Symbol,
    Other(String),
}

impl Tag {
    pub fn as_str(&self) -> &str {
        match self {
            Tag::Svg => "svg",
            Tag::Group => "g",
            Tag::Rect => "rect",
            Tag::Circle => "circle",
            Tag::Ellipse => "ellipse",
            Tag::Line => "line",
            Tag::Path => "path",
            Tag::Text => "text",
            Tag::Image => "image",
            Tag::Use => "use",
            Tag::Style => "style",
            Tag::Defs => "defs",
            Tag::Pattern => "pattern",
            Tag::Symbol => "symbol",
            Tag::Other(name) => name,
        }
    }

    /// Whether the tag draws something and so carries a transform.
    pub fn has_geometry(&self) -> bool {
        !matches!(self, Tag::Style | Tag::Defs | Tag::Pattern | Tag::Symbol)
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        match name {
            "svg" => Tag::Svg,
            "g" => Tag::Group,
            "rect" => Tag::Rect,
            "circle" => Tag::Circle,
            "ellipse" => Tag::Ellipse,
            "line" => Tag::Line,
            "path" => Tag::Path,
            "text" => Tag::Text,
            "image" => Tag::Image,
            "use" => Tag::Use,
            "style" => Tag::Style,
            "defs" => Tag::Defs,
            "pattern" => Tag::Pattern,
            "symbol" => Tag::Symbol,
            other => Tag::Other(other.to_string()),
        }
    }
}

/// What an arena slot holds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Element(Tag),
    Text(String),
    Comment(String),
}

/// Role of an element in the plan document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeRole {
    #[default]
    None,
    /// Top-level layer group (STATIC, PROJECT0, ...).
    Layer,
    /// Category group inside the static layer.
    Category,
    /// Positioned plan object (signal, detector, ...).
    Object,
    /// User-drawn shape.
    Shape,
    /// Title block of a plan.
    Plankopf,
    /// Symbol instance group.
    Symbol,
    /// Measurement line.
    Ruler,
}

impl NodeRole {
    fn token(self) -> Option<&'static str> {
        match self {
            NodeRole::None => None,
            NodeRole::Layer => Some("layer"),
            NodeRole::Category => Some("category"),
            NodeRole::Object => Some("object"),
            NodeRole::Shape => Some("shape"),
            NodeRole::Plankopf => Some("plankopf"),
            NodeRole::Symbol => Some("symbol"),
            NodeRole::Ruler => Some("ruler-line"),
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "layer" => NodeRole::Layer,
            "category" => NodeRole::Category,
            "object" => NodeRole::Object,
            "shape" => NodeRole::Shape,
            "plankopf" => NodeRole::Plankopf,
            "symbol" => NodeRole::Symbol,
            "ruler-line" => NodeRole::Ruler,
            _ => return None,
        })
    }

    /// Kind reported to persistence.
    pub fn persistence_kind(self) -> &'static str {
        match self {
            NodeRole::Object => "object",
            _ => "shape",
        }
    }
}

/// Static-layer object categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Ampelmast,
    Ampel,
    Detektor,
    Steuergeraet,
    Spur,
    Vva,
    Meta,
    Knoten,
}

impl Category {
    /// Listing order of the object pick list.
    pub const ALL: [Category; 8] = [
        Category::Ampelmast,
        Category::Ampel,
        Category::Detektor,
        Category::Steuergeraet,
        Category::Spur,
        Category::Vva,
        Category::Meta,
        Category::Knoten,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Ampelmast => "AMPELMAST",
            Category::Ampel => "AMPEL",
            Category::Detektor => "DETEKTOR",
            Category::Steuergeraet => "STEUERGERAET",
            Category::Spur => "SPUR",
            Category::Vva => "VVA",
            Category::Meta => "META",
            Category::Knoten => "KNOTEN",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown category {s:?}"))
    }
}

/// Typed view of an element's `class` attribute.
///
/// Parsed once when a node enters the scene; flags are plain fields from
/// then on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeClass {
    pub role: NodeRole,
    pub plan: Option<PlanKind>,
    /// Remaining presentation classes, in document order.
    pub styles: Vec<String>,
    pub locked: bool,
    pub unpositioned: bool,
    pub custom_style: bool,
}

impl NodeClass {
    pub fn new(role: NodeRole) -> Self {
        Self {
            role,
            ..Default::default()
        }
    }

    pub fn parse(class: &str) -> Self {
        let mut parsed = Self::default();
        for token in class.split_whitespace() {
            match token {
                "locked" => parsed.locked = true,
                "unpositioned" => parsed.unpositioned = true,
                "custom-shape" => parsed.custom_style = true,
                _ => {
                    if let Some(role) = NodeRole::from_token(token).filter(|_| parsed.role == NodeRole::None) {
                        parsed.role = role;
                    } else if let Some(plan) = token.parse::<PlanKind>().ok().filter(|_| parsed.plan.is_none()) {
                        parsed.plan = Some(plan);
                    } else {
                        parsed.styles.push(token.to_string());
                    }
                }
            }
        }
        parsed
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Replace the presentation classes with a single style class.
    pub fn set_style(&mut self, style: &str) {
        self.styles = style.split_whitespace().map(str::to_string).collect();
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<&str> = Vec::new();
        if let Some(role) = self.role.token() {
            tokens.push(role);
        }
        if let Some(plan) = self.plan {
            tokens.push(plan.as_str());
        }
        tokens.extend(self.styles.iter().map(String::as_str));
        if self.unpositioned {
            tokens.push("unpositioned");
        }
        if self.locked {
            tokens.push("locked");
        }
        if self.custom_style {
            tokens.push("custom-shape");
        }
        write!(f, "{}", tokens.join(" "))
    }
}

/// A node in the scene arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub content: NodeContent,
    /// Ordered attributes, without `class` and `transform`.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Text content of leaf elements such as `<text>` or `<style>`.
    pub text: Option<String>,
    /// Own transform; `None` when the element has no transform attribute.
    pub transform: Option<Affine>,
    pub class: NodeClass,
    /// Click-to-select hook attached.
    pub registered: bool,
    pub visible: bool,
    /// Editor-only helper (group container, clone preview); never persisted.
    pub transient: bool,
}

impl Node {
    pub fn element(tag: Tag) -> Self {
        Self::with_content(NodeContent::Element(tag))
    }

    pub fn with_content(content: NodeContent) -> Self {
        Self {
            content,
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
            text: None,
            transform: None,
            class: NodeClass::default(),
            registered: false,
            visible: true,
            transient: false,
        }
    }

    pub fn tag(&self) -> Option<&Tag> {
        match &self.content {
            NodeContent::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.content, NodeContent::Element(_))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(|value| value.trim().parse().ok())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn set_attr_f64(&mut self, name: &str, value: f64) {
        self.set_attr(name, value.to_string());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// The `id` attribute.
    pub fn element_id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn transform_or_identity(&self) -> Affine {
        self.transform.unwrap_or(Affine::IDENTITY)
    }
}
