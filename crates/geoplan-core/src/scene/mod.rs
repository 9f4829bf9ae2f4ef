//! Arena-backed scene graph for plan documents.
//!
//! Nodes live in a flat arena and reference each other by [`NodeId`].
//! Descriptors ([`NodeDescriptor`]) are the plain-data boundary used for
//! loading documents and for persistence.

mod descriptor;
mod document;
mod geometry;
mod node;

pub use descriptor::{AttributeDescriptor, NodeDescriptor};
pub use document::SceneDocument;
pub use node::{Category, Node, NodeClass, NodeContent, NodeId, NodeRole, Tag};

use crate::transform::{format_transform, parse_transform};
use kurbo::Affine;
use thiserror::Error;

/// Scene graph errors.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Node not found: {0}")]
    NotFound(NodeId),
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Invalid structure: {0}")]
    Structure(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// The editable document tree.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    free: Vec<u32>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top-level nodes in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn get(&self, id: NodeId) -> SceneResult<&Node> {
        self.node(id).ok_or(SceneError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        self.node_mut(id).ok_or(SceneError::NotFound(id))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index as usize] = Some(node);
                NodeId(index)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId((self.nodes.len() - 1) as u32)
            }
        }
    }

    fn check_parent(&self, parent: Option<NodeId>) -> SceneResult<()> {
        if let Some(parent) = parent {
            if !self.get(parent)?.is_element() {
                return Err(SceneError::Structure(format!("{parent} cannot have children")));
            }
        }
        Ok(())
    }

    fn materialize(&mut self, descriptor: &NodeDescriptor, parent: Option<NodeId>) -> NodeId {
        let mut node = Node::element(Tag::from(descriptor.tag_name.as_str()));
        for attribute in &descriptor.attributes {
            match attribute.name.as_str() {
                "class" => node.class = NodeClass::parse(&attribute.value),
                "transform" => node.transform = Some(parse_transform(Some(&attribute.value))),
                _ => node
                    .attributes
                    .push((attribute.name.clone(), attribute.value.clone())),
            }
        }
        node.text = descriptor.text_content.clone();
        node.parent = parent;

        let id = self.alloc(node);
        for child in &descriptor.children {
            let child_id = self.materialize(child, Some(id));
            if let Some(node) = self.node_mut(id) {
                node.children.push(child_id);
            }
        }
        id
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> SceneResult<&mut Vec<NodeId>> {
        match parent {
            Some(parent) => Ok(&mut self.get_mut(parent)?.children),
            None => Ok(&mut self.roots),
        }
    }

    fn link(&mut self, parent: Option<NodeId>, child: NodeId, before: Option<NodeId>) -> SceneResult<()> {
        let siblings = self.siblings_mut(parent)?;
        let index = before
            .and_then(|reference| siblings.iter().position(|&id| id == reference))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.get_mut(child)?.parent = parent;
        Ok(())
    }

    fn unlink(&mut self, child: NodeId) -> SceneResult<()> {
        let parent = self.get(child)?.parent;
        self.siblings_mut(parent)?.retain(|&id| id != child);
        self.get_mut(child)?.parent = None;
        Ok(())
    }

    /// Materialize a descriptor as the last child of `parent` (or as a new root).
    pub fn add_node(&mut self, parent: Option<NodeId>, descriptor: &NodeDescriptor) -> SceneResult<NodeId> {
        self.insert_node(parent, None, descriptor)
    }

    /// Materialize a descriptor in front of `before` (appends when `None`).
    pub fn insert_node(
        &mut self,
        parent: Option<NodeId>,
        before: Option<NodeId>,
        descriptor: &NodeDescriptor,
    ) -> SceneResult<NodeId> {
        self.check_parent(parent)?;
        let id = self.materialize(descriptor, parent);
        self.link(parent, id, before)?;
        Ok(id)
    }

    /// Serialize an element subtree. Text and comment children are skipped.
    pub fn get_node(&self, id: NodeId) -> SceneResult<NodeDescriptor> {
        let node = self.get(id)?;
        let Some(tag) = node.tag() else {
            return Err(SceneError::Structure(format!("{id} is not an element")));
        };

        let mut descriptor = NodeDescriptor::new(tag.as_str());
        for (name, value) in &node.attributes {
            descriptor = descriptor.attr(name.clone(), value.clone());
        }
        if !node.class.is_empty() {
            descriptor = descriptor.attr("class", node.class.to_string());
        }
        if let Some(transform) = node.transform {
            descriptor = descriptor.attr("transform", format_transform(transform));
        }
        descriptor.text_content = node.text.clone();

        for &child in &node.children {
            if self.node(child).is_some_and(Node::is_element) {
                descriptor.children.push(self.get_node(child)?);
            }
        }
        Ok(descriptor)
    }

    /// Add a text node under `parent`.
    pub fn add_text(&mut self, parent: NodeId, text: impl Into<String>) -> SceneResult<NodeId> {
        self.check_parent(Some(parent))?;
        let mut node = Node::with_content(NodeContent::Text(text.into()));
        node.parent = Some(parent);
        let id = self.alloc(node);
        self.link(Some(parent), id, None)?;
        Ok(id)
    }

    /// Add a comment node under `parent`.
    pub fn add_comment(&mut self, parent: NodeId, text: impl Into<String>) -> SceneResult<NodeId> {
        self.check_parent(Some(parent))?;
        let mut node = Node::with_content(NodeContent::Comment(text.into()));
        node.parent = Some(parent);
        let id = self.alloc(node);
        self.link(Some(parent), id, None)?;
        Ok(id)
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.insert_before(Some(parent), child, None)
    }

    /// Move `child` in front of `reference` under `parent`.
    pub fn insert_before(
        &mut self,
        parent: Option<NodeId>,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> SceneResult<()> {
        self.check_parent(parent)?;
        if parent.is_some_and(|p| p == child || self.is_ancestor(child, p)) {
            return Err(SceneError::Structure(format!("{child} cannot be moved into itself")));
        }
        self.unlink(child)?;
        self.link(parent, child, reference)
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Delete a node and its subtree.
    pub fn remove(&mut self, id: NodeId) -> SceneResult<()> {
        self.unlink(id)?;
        let mut doomed = vec![id];
        doomed.extend(self.descendants(id));
        for node in doomed {
            if let Some(slot) = self.nodes.get_mut(node.index()) {
                if slot.take().is_some() {
                    self.free.push(node.0);
                }
            }
        }
        Ok(())
    }

    /// Copy an element subtree and insert it under `parent` before `before`.
    pub fn deep_clone(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        before: Option<NodeId>,
    ) -> SceneResult<NodeId> {
        let descriptor = self.get_node(id)?;
        self.insert_node(parent, before, &descriptor)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Children or roots, depending on where `id` lives.
    pub fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &self.roots,
        }
    }

    /// Pre-order descendants, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Every node in document order.
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for &root in &self.roots {
            out.push(root);
            out.extend(self.descendants(root));
        }
        out
    }

    /// First element with the given `id` attribute, in document order.
    pub fn find_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|&id| self.node(id).and_then(Node::element_id) == Some(element_id))
    }

    /// First element below `root` with the given `id` attribute.
    pub fn find_in(&self, root: NodeId, element_id: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| self.node(id).and_then(Node::element_id) == Some(element_id))
    }

    /// Elements below `root` with the given role.
    pub fn with_role(&self, root: NodeId, role: NodeRole) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.node(id).is_some_and(|node| node.class.role == role))
            .collect()
    }

    /// Identifier used when talking to persistence.
    pub fn external_id(&self, id: NodeId) -> String {
        self.node(id)
            .and_then(Node::element_id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }

    /// Next free numeric element id.
    pub fn next_id(&self) -> u64 {
        self.nodes
            .iter()
            .flatten()
            .filter_map(|node| node.element_id().and_then(|id| id.parse::<u64>().ok()))
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Attribute value including the typed `class` and `transform`.
    pub fn attr_value(&self, id: NodeId, name: &str) -> Option<String> {
        let node = self.node(id)?;
        match name {
            "class" => Some(node.class.to_string()),
            "transform" => node.transform.map(format_transform),
            _ => node.attr(name).map(str::to_string),
        }
    }

    pub fn attr_f64(&self, id: NodeId, name: &str) -> Option<f64> {
        self.node(id).and_then(|node| node.attr_f64(name))
    }

    /// Set an attribute; `class` and `transform` update the typed fields.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> SceneResult<()> {
        let node = self.get_mut(id)?;
        match name {
            "class" => node.class = NodeClass::parse(value),
            "transform" => node.transform = Some(parse_transform(Some(value))),
            _ => node.set_attr(name, value),
        }
        Ok(())
    }

    pub fn set_attr_f64(&mut self, id: NodeId, name: &str, value: f64) -> SceneResult<()> {
        self.get_mut(id)?.set_attr_f64(name, value);
        Ok(())
    }

    /// Own transform, identity when absent or unknown.
    pub fn get_transform(&self, id: NodeId) -> Affine {
        self.node(id).map_or(Affine::IDENTITY, Node::transform_or_identity)
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Affine) -> SceneResult<()> {
        self.get_mut(id)?.transform = Some(transform);
        Ok(())
    }

    /// Product of the ancestors' transforms.
    pub fn parent_world_transform(&self, id: NodeId) -> Affine {
        match self.parent(id) {
            Some(parent) => self.world_transform(parent),
            None => Affine::IDENTITY,
        }
    }

    /// Node space -> document space.
    pub fn world_transform(&self, id: NodeId) -> Affine {
        self.parent_world_transform(id) * self.get_transform(id)
    }

    /// Attach the click-to-select hook.
    pub fn register(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.registered = true;
        }
    }

    /// Remove the click-to-select hook.
    pub fn unregister(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.registered = false;
        }
    }

    pub fn is_registered(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.registered)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.node_mut(id) {
            node.visible = visible;
        }
    }

    /// Visible when the node and all its ancestors are.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.node(node_id) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Nearest ancestor-or-self with the given role.
    pub fn ancestor_with_role(&self, id: NodeId, role: NodeRole) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            if node.class.role == role {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    /// Enclosing layer.
    pub fn layer_of(&self, id: NodeId) -> Option<NodeId> {
        self.ancestor_with_role(id, NodeRole::Layer)
    }

    /// Category of a static-layer object, from its category group.
    pub fn category_of(&self, id: NodeId) -> Option<Category> {
        let group = self.ancestor_with_role(id, NodeRole::Category)?;
        self.node(group)?.element_id()?.parse().ok()
    }
}
