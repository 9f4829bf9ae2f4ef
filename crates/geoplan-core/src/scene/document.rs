//! The serialized document a session is loaded from.

use super::{NodeDescriptor, NodeRole, SceneError, SceneGraph, SceneResult, Tag};
use crate::plans::PlanConfig;
use serde::{Deserialize, Serialize};

/// Initial scene: layers, shared definitions and per-plan configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub layers: Vec<NodeDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defs: Option<NodeDescriptor>,
    #[serde(default)]
    pub plans: Vec<PlanConfig>,
}

impl SceneDocument {
    pub fn from_json(json: &str) -> SceneResult<Self> {
        serde_json::from_str(json).map_err(|e| SceneError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> SceneResult<String> {
        serde_json::to_string(self).map_err(|e| SceneError::Serialization(e.to_string()))
    }

    /// The document id, or a fresh one when the document carries none.
    pub fn document_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }

    /// Materialize defs and layers into a new scene graph.
    ///
    /// Defs come first so the layers draw on top of nothing hidden. Layer
    /// groups without a role in their class are marked as layers.
    pub fn build_scene(&self) -> SceneResult<SceneGraph> {
        let mut scene = SceneGraph::new();
        if let Some(defs) = &self.defs {
            scene.add_node(None, defs)?;
        }
        for layer in &self.layers {
            let id = scene.add_node(None, layer)?;
            let node = scene.get_mut(id)?;
            if node.class.role == NodeRole::None {
                node.class.role = NodeRole::Layer;
            }
        }
        log::debug!(
            "Loaded scene with {} layers and {} nodes",
            self.layers.len(),
            scene.len()
        );
        Ok(scene)
    }

    /// Snapshot a scene back into document form.
    pub fn capture(id: Option<String>, scene: &SceneGraph, plans: Vec<PlanConfig>) -> SceneResult<Self> {
        let mut document = SceneDocument {
            id,
            plans,
            ..Default::default()
        };
        for &root in scene.roots() {
            let node = scene.get(root)?;
            if node.transient || !node.is_element() {
                continue;
            }
            let descriptor = scene.get_node(root)?;
            if node.tag() == Some(&Tag::Defs) {
                document.defs = Some(descriptor);
            } else {
                document.layers.push(descriptor);
            }
        }
        Ok(document)
    }
}
