//! Error types for the canvas engine.

use crate::content::ContentError;
use crate::nodes::NodeId;
use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),
    #[error("Invalid color '{value}': {reason}")]
    InvalidColor { value: String, reason: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Result type for engine operations.
pub type CanvasResult<T> = Result<T, CanvasError>;
