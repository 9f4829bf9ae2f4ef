//! Notifications drained by the embedding UI.

use crate::persistence::PersistenceFailure;
use crate::plans::PlanKind;
use crate::scene::NodeId;
use crate::tools::ToolName;

/// Something the UI may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The attached node changed; `None` when nothing is selected.
    SelectionChanged(Option<NodeId>),
    ToolChanged(ToolName),
    /// Multi-select mode switched on or off.
    MultiSelectChanged(bool),
    NodeCreated(NodeId),
    /// External id of a removed node.
    NodeDeleted(String),
    PlanChanged(PlanKind),
    /// The persistence sink refused a mutation. The edit stays applied.
    PersistenceFailed(PersistenceFailure),
}
