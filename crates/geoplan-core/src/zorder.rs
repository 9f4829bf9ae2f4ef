//! Stacking order of nodes inside their layer.
//!
//! Only element siblings count. A leading `<style>` element always stays
//! first in the layer.

use crate::persistence::{Mutation, Persister};
use crate::scene::{NodeId, SceneGraph, SceneResult, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZOrder {
    /// Draw last.
    Front,
    /// Swap with the next element.
    Forward,
    /// Swap with the previous element.
    Backward,
    /// Draw first, after the layer's style element.
    Back,
}

fn is_element(scene: &SceneGraph, id: NodeId) -> bool {
    scene.node(id).is_some_and(|node| node.is_element())
}

fn is_style(scene: &SceneGraph, id: NodeId) -> bool {
    scene.node(id).and_then(|node| node.tag()) == Some(&Tag::Style)
}

/// Element siblings of `node`, itself included.
fn element_siblings(scene: &SceneGraph, node: NodeId) -> Vec<NodeId> {
    scene
        .siblings(node)
        .iter()
        .copied()
        .filter(|&id| is_element(scene, id))
        .collect()
}

/// Next element sibling, if any.
pub fn next_element(scene: &SceneGraph, node: NodeId) -> Option<NodeId> {
    let siblings = element_siblings(scene, node);
    let index = siblings.iter().position(|&id| id == node)?;
    siblings.get(index + 1).copied()
}

/// Where `node` goes: `Some(before)` with `before == None` meaning the end.
/// `None` when the move changes nothing.
fn destination(scene: &SceneGraph, node: NodeId, order: ZOrder) -> Option<Option<NodeId>> {
    let siblings = element_siblings(scene, node);
    let index = siblings.iter().position(|&id| id == node)?;
    match order {
        ZOrder::Front => (index + 1 < siblings.len()).then_some(None),
        ZOrder::Forward => {
            siblings.get(index + 1)?;
            Some(siblings.get(index + 2).copied())
        }
        ZOrder::Backward => {
            let previous = *siblings.get(index.checked_sub(1)?)?;
            (!is_style(scene, previous)).then_some(Some(previous))
        }
        ZOrder::Back => {
            let first = siblings.iter().copied().find(|&id| !is_style(scene, id))?;
            (first != node).then_some(Some(first))
        }
    }
}

/// Move `node` within its layer and persist the new position.
///
/// Returns whether anything moved.
pub fn reorder(scene: &mut SceneGraph, persister: &mut Persister, node: NodeId, order: ZOrder) -> SceneResult<bool> {
    scene.get(node)?;
    let Some(before) = destination(scene, node, order) else {
        log::debug!("{node} already at {order:?} limit");
        return Ok(false);
    };
    let parent = scene.parent(node);
    scene.insert_before(parent, node, before)?;

    let layer_id = parent.map(|layer| scene.external_id(layer)).unwrap_or_default();
    let next_id = next_element(scene, node).map(|next| scene.external_id(next));
    persister.persist(Mutation::Reorder {
        layer_id,
        node_id: scene.external_id(node),
        next_id,
    });
    Ok(true)
}
