//! Application-level errors.

use mindcanvas_core::CanvasError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid session script: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error("{0}")]
    Usage(String),
}

pub type AppResult<T> = Result<T, AppError>;
