//! GeoPlan Core Library
//!
//! Scene graph, Swiss projection and editing logic for geo-referenced
//! junction plans. Rendering lives in `geoplan-render`; the embedding UI
//! feeds input into an [`EditorSession`] and drains its events.

pub mod editor;
pub mod input;
pub mod persistence;
pub mod plans;
pub mod projection;
pub mod scene;
pub mod style;
pub mod tools;
pub mod transform;
pub mod viewer;
pub mod widget;
pub mod zorder;

pub use editor::{ActiveLayer, EditorEvent, EditorSession, SessionConfig, SessionError, SessionResult};
pub use input::{InputState, Key, Modifiers, MouseButton, PointerEvent};
pub use persistence::{JournalSink, MemorySink, Mutation, PersistenceFailure, PersistenceSink, Persister};
pub use plans::{LayoutChange, Plan, PlanError, PlanKind, PlanSet};
pub use projection::{ConfigurationError, Crs, GeoBounds, LatLng, Srs};
pub use scene::{NodeDescriptor, NodeId, SceneDocument, SceneError, SceneGraph};
pub use style::{ElementStyle, StylePreview};
pub use tools::{Alignment, Tool, ToolName};
pub use viewer::Viewer;
pub use widget::{Handle, HandleContainer, HandleKind, HandleShape};
pub use zorder::ZOrder;
