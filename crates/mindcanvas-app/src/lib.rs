//! Mind Canvas headless host.
//!
//! Loads an engine configuration and a session script, replays the script
//! through the interaction controller and reports the resulting scene.

pub mod error;
pub mod session;
pub mod shortcuts;

pub use error::{AppError, AppResult};
pub use session::{Command, Session, Step};
pub use shortcuts::{Shortcut, ShortcutRegistry};
