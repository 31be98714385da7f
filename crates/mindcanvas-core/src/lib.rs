//! Mind Canvas Core Library
//!
//! Platform-agnostic scene model, geometry and interaction engine for the
//! Mind Canvas infinite whiteboard.

pub mod config;
pub mod content;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod input;
pub mod nodes;
pub mod pen;
pub mod placement;
pub mod scene;
pub mod selection;
pub mod snap;
pub mod tools;
pub mod viewport;

pub use config::EngineConfig;
pub use content::{CannedSuggestions, ContentError, PendingBatch, Suggestion, SuggestionSource};
pub use controller::{Controller, Interaction};
pub use error::{CanvasError, CanvasResult};
pub use input::{HitTarget, InputEvent, Key, Modifiers, MouseButton, PointerInput};
pub use nodes::{Node, NodeData, NodeId, NodeKind, Paint, PathPoint, initial_nodes};
pub use pen::{PenEditor, PenPointMode, PenState};
pub use scene::{Alignment, Scene};
pub use selection::ResizeHandle;
pub use snap::{SnapGuide, SnapResult, compute_snap};
pub use tools::Tool;
pub use viewport::Viewport;
