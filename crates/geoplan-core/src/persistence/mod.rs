//! Persistence callback invoked after every structural mutation.
//!
//! The editor never stores anything itself. Each mutation is described as a
//! [`Mutation`] and handed to a [`PersistenceSink`]. Failures are logged and
//! reported back as events; the in-memory change is kept.

mod journal;
mod memory;

pub use journal::JournalSink;
pub use memory::MemorySink;

use crate::plans::{Auslegung, Format, Massstab, PlanKind};
use crate::scene::{NodeDescriptor, NodeId, SceneGraph};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Mutation rejected: {0}")]
    Rejected(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// One change to replicate into the external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    UpdateAttribute {
        node_id: String,
        /// "object" for static-layer objects, "shape" otherwise.
        node_kind: String,
        name: String,
        value: String,
    },
    CreateNode {
        parent_id: String,
        descriptor: NodeDescriptor,
    },
    DeleteNode {
        node_id: String,
    },
    Reorder {
        layer_id: String,
        node_id: String,
        /// Next element sibling after the move, `None` at the end.
        next_id: Option<String>,
    },
    PlanChanged {
        plan: PlanKind,
        region: String,
        massstab: Massstab,
        format: Format,
        auslegung: Auslegung,
    },
}

impl Mutation {
    /// Attribute update read back from the scene.
    ///
    /// Returns `None` when the node is gone or has no such attribute.
    pub fn attribute(scene: &SceneGraph, id: NodeId, name: &str) -> Option<Self> {
        let node = scene.node(id)?;
        Some(Mutation::UpdateAttribute {
            node_id: scene.external_id(id),
            node_kind: node.class.role.persistence_kind().to_string(),
            name: name.to_string(),
            value: scene.attr_value(id, name)?,
        })
    }

    /// Full subtree of a freshly created node.
    pub fn create(scene: &SceneGraph, id: NodeId) -> Option<Self> {
        let parent = scene.parent(id)?;
        Some(Mutation::CreateNode {
            parent_id: scene.external_id(parent),
            descriptor: scene.get_node(id).ok()?,
        })
    }
}

/// External store the editor reports to.
pub trait PersistenceSink: Send {
    /// Replicate one mutation. Must not block on a reply from the store.
    fn persist(&mut self, mutation: &Mutation) -> PersistenceResult<()>;
}

/// A mutation the sink refused.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistenceFailure {
    pub mutation: Mutation,
    pub message: String,
}

/// Forwards mutations to a sink and remembers what failed.
pub struct Persister {
    sink: Box<dyn PersistenceSink>,
    failures: Vec<PersistenceFailure>,
}

impl std::fmt::Debug for Persister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister")
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

impl Persister {
    pub fn new(sink: impl PersistenceSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            failures: Vec::new(),
        }
    }

    /// Send a mutation. A failure is logged and recorded, never rolled back.
    pub fn persist(&mut self, mutation: Mutation) {
        if let Err(err) = self.sink.persist(&mutation) {
            log::error!("Failed to persist {mutation:?}: {err}");
            self.failures.push(PersistenceFailure {
                mutation,
                message: err.to_string(),
            });
        }
    }

    /// Persist the current value of one attribute.
    ///
    /// Editor-only helper nodes are never persisted.
    pub fn attribute(&mut self, scene: &SceneGraph, id: NodeId, name: &str) {
        if is_transient(scene, id) {
            log::debug!("Skipping persistence of transient {id}");
            return;
        }
        match Mutation::attribute(scene, id, name) {
            Some(mutation) => self.persist(mutation),
            None => log::warn!("Nothing to persist for {name} on {id}"),
        }
    }

    /// Persist the node's transform.
    pub fn transform(&mut self, scene: &SceneGraph, id: NodeId) {
        self.attribute(scene, id, "transform");
    }

    /// Persist a created subtree.
    pub fn created(&mut self, scene: &SceneGraph, id: NodeId) {
        if is_transient(scene, id) {
            return;
        }
        match Mutation::create(scene, id) {
            Some(mutation) => self.persist(mutation),
            None => log::warn!("Cannot describe created node {id}"),
        }
    }

    /// Persist a deletion. Takes the external id since the node is gone.
    pub fn deleted(&mut self, node_id: String) {
        self.persist(Mutation::DeleteNode { node_id });
    }

    /// Failures recorded since the last call.
    pub fn take_failures(&mut self) -> Vec<PersistenceFailure> {
        std::mem::take(&mut self.failures)
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

fn is_transient(scene: &SceneGraph, id: NodeId) -> bool {
    let mut current = Some(id);
    while let Some(node_id) = current {
        match scene.node(node_id) {
            Some(node) if node.transient => return true,
            Some(node) => current = node.parent,
            None => return false,
        }
    }
    false
}
