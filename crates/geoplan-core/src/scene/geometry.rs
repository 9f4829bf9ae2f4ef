//! Bounding boxes and hit-testing.

use super::{NodeId, SceneGraph, Tag};
use kurbo::{Affine, BezPath, Point, Rect, Shape};

/// Character width relative to font size, for text extents.
const TEXT_ADVANCE: f64 = 0.6;
const DEFAULT_FONT_SIZE: f64 = 12.0;

impl SceneGraph {
    fn num(&self, id: NodeId, name: &str) -> f64 {
        self.attr_f64(id, name).unwrap_or(0.0)
    }

    /// Bounding box in the node's own coordinate space.
    pub fn local_bbox(&self, id: NodeId) -> Option<Rect> {
        let node = self.node(id)?;
        match node.tag()? {
            Tag::Rect | Tag::Image | Tag::Use => {
                let (x, y) = (self.num(id, "x"), self.num(id, "y"));
                Some(Rect::new(x, y, x + self.num(id, "width"), y + self.num(id, "height")).abs())
            }
            Tag::Circle => {
                let center = Point::new(self.num(id, "cx"), self.num(id, "cy"));
                let r = self.num(id, "r").abs();
                Some(Rect::from_center_size(center, (2.0 * r, 2.0 * r)))
            }
            Tag::Ellipse => {
                let center = Point::new(self.num(id, "cx"), self.num(id, "cy"));
                let (rx, ry) = (self.num(id, "rx").abs(), self.num(id, "ry").abs());
                Some(Rect::from_center_size(center, (2.0 * rx, 2.0 * ry)))
            }
            Tag::Line => Some(Rect::from_points(
                (self.num(id, "x1"), self.num(id, "y1")),
                (self.num(id, "x2"), self.num(id, "y2")),
            )),
            Tag::Path => {
                let d = node.attr("d")?;
                match BezPath::from_svg(d) {
                    Ok(path) if !path.elements().is_empty() => Some(path.bounding_box()),
                    Ok(_) => None,
                    Err(err) => {
                        log::warn!("Unreadable path data on {id}: {err}");
                        None
                    }
                }
            }
            Tag::Text => {
                let size = node.attr_f64("font-size").unwrap_or(DEFAULT_FONT_SIZE);
                let chars = node.text.as_deref().map_or(0, |text| text.chars().count());
                let width = TEXT_ADVANCE * size * chars as f64;
                let x = self.num(id, "x");
                let x = match node.attr("text-anchor") {
                    Some("middle") => x - width / 2.0,
                    Some("end") => x - width,
                    _ => x,
                };
                let y = self.num(id, "y");
                Some(Rect::new(x, y - size, x + width, y))
            }
            Tag::Group | Tag::Svg => self.children_bbox(id),
            _ => None,
        }
    }

    /// Union of the element children's boxes in `id`'s space.
    fn children_bbox(&self, id: NodeId) -> Option<Rect> {
        self.children(id)
            .iter()
            .filter(|&&child| self.node(child).is_some_and(|node| node.visible))
            .filter_map(|&child| {
                let local = self.local_bbox(child)?;
                Some(self.get_transform(child).transform_rect_bbox(local))
            })
            .reduce(|acc, rect| acc.union(rect))
    }

    /// Bounding box in the parent's space (own transform applied).
    pub fn parent_bbox(&self, id: NodeId) -> Option<Rect> {
        let local = self.local_bbox(id)?;
        Some(self.get_transform(id).transform_rect_bbox(local))
    }

    /// Bounding box in document space.
    pub fn world_bbox(&self, id: NodeId) -> Option<Rect> {
        let local = self.local_bbox(id)?;
        Some(self.world_transform(id).transform_rect_bbox(local))
    }

    /// Bounding box expressed in an arbitrary space given as world -> space.
    pub fn bbox_in(&self, id: NodeId, world_to_space: Affine) -> Option<Rect> {
        let local = self.local_bbox(id)?;
        Some((world_to_space * self.world_transform(id)).transform_rect_bbox(local))
    }

    /// Topmost registered, visible element under a document-space point.
    pub fn pick(&self, point: Point) -> Option<NodeId> {
        self.document_order().into_iter().rev().find(|&id| {
            if !self.is_registered(id) || !self.is_visible(id) {
                return false;
            }
            let Some(local) = self.local_bbox(id) else {
                return false;
            };
            let world = self.world_transform(id);
            if world.determinant().abs() < f64::EPSILON {
                return false;
            }
            local.contains(world.inverse() * point)
        })
    }
}
